use async_trait::async_trait;
use hyper::Response;

use super::MiddlewareError;
use crate::body::GatewayBody;
use crate::context::{RequestContext, RequestMeta};

/// 미들웨어 트레이트
///
/// 요청 단계는 컨텍스트를 받아 (필요하면 수정해서) 돌려주고, 응답 단계는
/// 요청 정보와 함께 응답을 받아 돌려줍니다.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// 미들웨어의 고유 이름을 반환합니다.
    fn name(&self) -> &str;

    /// 요청을 처리합니다. 오류를 돌려주면 뒤쪽 단계는 실행되지 않습니다.
    async fn handle_request(&self, ctx: RequestContext) -> Result<RequestContext, MiddlewareError>;

    /// 응답을 처리합니다.
    async fn handle_response(
        &self,
        _meta: &RequestMeta,
        res: Response<GatewayBody>,
    ) -> Result<Response<GatewayBody>, MiddlewareError> {
        Ok(res)
    }
}
