use std::time::Duration;

use hyper::{Response, StatusCode};
use hyper_util::client::legacy;

use crate::body::{text_response, GatewayBody};

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("업스트림에 연결할 수 없음")]
    Unreachable(#[source] legacy::Error),

    #[error("업스트림 요청 실패")]
    Upstream(#[source] legacy::Error),

    #[error("업스트림 응답 제한 시간 초과 ({0:?})")]
    Timeout(Duration),
}

impl ProxyError {
    pub fn from_client_error(err: legacy::Error) -> Self {
        if err.is_connect() {
            ProxyError::Unreachable(err)
        } else {
            ProxyError::Upstream(err)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unreachable(_) | ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// 클라이언트에는 상태 문구만 보냅니다. 원인은 로그에만 남습니다.
    pub fn into_response(self) -> Response<GatewayBody> {
        let status = self.status();
        text_response(status, status.canonical_reason().unwrap_or("Bad Gateway"))
    }
}
