use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::header::HeaderValue;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use tracing::{debug, error};

use crate::{
    body::{self, text_response, GatewayBody},
    context::{RequestContext, X_REQUEST_ID},
    logging::{log_request, EventSink, RequestLog},
    middleware::{handle_middleware_error, CaptureMiddleware, CorsConfig, CorsMiddleware, MiddlewareChain, MiddlewareError},
    proxy::ForwardingEngine,
    routing::RouteTable,
    settings::Settings,
    static_files::StaticFiles,
};

pub struct RequestHandler {
    chain: MiddlewareChain,
    routes: RouteTable,
    engine: ForwardingEngine,
    static_files: StaticFiles,
}

impl RequestHandler {
    pub fn new(settings: &Settings, sink: Arc<EventSink>) -> Result<Self, MiddlewareError> {
        let mut chain = MiddlewareChain::new();
        if settings.server.cors_enabled {
            chain.add(CorsMiddleware::new(CorsConfig::default())?);
        }
        chain.add(CaptureMiddleware::new(settings.server.max_capture_bytes, sink.clone()));
        debug!(middlewares = ?chain.names(), "미들웨어 체인 구성");

        Ok(Self {
            chain,
            routes: RouteTable::with_defaults(&settings.upstream.origin),
            engine: ForwardingEngine::new(settings, sink),
            static_files: StaticFiles::new(&settings.server.static_root, settings.server.index_file.clone()),
        })
    }

    pub async fn handle_request(
        &self,
        req: Request<Incoming>,
        remote_addr: Option<SocketAddr>,
    ) -> Result<Response<GatewayBody>, Infallible> {
        Ok(self.dispatch(req.map(body::boxed), remote_addr).await)
    }

    /// 요청 하나를 처리합니다. 어떤 경우에도 응답을 정확히 하나 돌려줍니다.
    pub async fn dispatch(&self, req: Request<GatewayBody>, remote_addr: Option<SocketAddr>) -> Response<GatewayBody> {
        let ctx = RequestContext::new(req, remote_addr);
        let meta = ctx.meta();
        let mut log = RequestLog::new(&meta.request_id);
        log.with_request(ctx.method(), ctx.uri());

        // 1. 요청 미들웨어
        let response = match self.chain.handle_request(ctx).await {
            Ok(ctx) => self.route(ctx, &mut log).await,
            Err(e) => {
                if !matches!(e, MiddlewareError::PreflightResponse(_)) {
                    log.with_error(&e);
                }
                handle_middleware_error(e)
            }
        };

        // 2. 응답 미들웨어 (역순)
        let mut response = match self.chain.handle_response(&meta, response).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "응답 미들웨어 처리 실패");
                log.with_error(&e);
                handle_middleware_error(e)
            }
        };

        if let Ok(value) = HeaderValue::from_str(&meta.request_id) {
            response.headers_mut().insert(X_REQUEST_ID, value);
        }

        log.with_response(response.status());
        log.duration_ms = meta.elapsed_ms();
        log_request(&log);
        response
    }

    async fn route(&self, ctx: RequestContext, log: &mut RequestLog) -> Response<GatewayBody> {
        match self.routes.decide(ctx.uri()) {
            Ok(Some(matched)) => {
                log.with_route(&matched.route);
                let decision = self.engine.decide(matched, ctx.headers());
                self.engine.forward(ctx, decision).await
            }
            Ok(None) => self.static_files.serve(ctx.method(), ctx.uri()).await,
            Err(e) => {
                error!(error = %e, "업스트림 URI 생성 실패");
                log.with_error(&e);
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    pub async fn handle_connection<I>(
        &self,
        io: I,
        remote_addr: Option<SocketAddr>,
    ) -> std::result::Result<(), hyper::Error>
    where
        I: hyper::rt::Read + hyper::rt::Write + Unpin + 'static,
    {
        http1::Builder::new()
            .serve_connection(
                io,
                service_fn(|req| self.handle_request(req, remote_addr)),
            )
            .await
    }
}
