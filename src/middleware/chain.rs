use hyper::Response;
use tracing::debug;

use super::{Middleware, MiddlewareError};
use crate::body::GatewayBody;
use crate::context::{RequestContext, RequestMeta};

#[derive(Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new()
        }
    }

    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    pub async fn handle_request(
        &self,
        mut ctx: RequestContext,
    ) -> Result<RequestContext, MiddlewareError> {
        for middleware in &self.middlewares {
            debug!(request_id = %ctx.request_id, middleware = middleware.name(), "요청 미들웨어 실행");
            ctx = middleware.handle_request(ctx).await?;
        }
        Ok(ctx)
    }

    pub async fn handle_response(
        &self,
        meta: &RequestMeta,
        mut response: Response<GatewayBody>,
    ) -> Result<Response<GatewayBody>, MiddlewareError> {
        // 응답은 역순으로 처리
        for middleware in self.middlewares.iter().rev() {
            response = middleware.handle_response(meta, response).await?;
        }
        Ok(response)
    }
}
