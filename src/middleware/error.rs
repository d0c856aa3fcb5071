use hyper::Response;

use crate::body::GatewayBody;

#[derive(Debug, thiserror::Error)]
pub enum MiddlewareError {
    /// 요청을 더 진행하지 않고 바로 돌려줄 응답 (CORS preflight 등)
    #[error("즉시 응답")]
    PreflightResponse(Response<GatewayBody>),

    #[error("요청 본문이 제한({limit} bytes)을 초과함")]
    PayloadTooLarge {
        limit: usize,
        received: Option<u64>,
    },

    #[error("설정 오류: {0}")]
    Config(String),
}
