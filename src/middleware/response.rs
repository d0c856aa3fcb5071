use hyper::{Response, StatusCode};
use tracing::error;

use super::MiddlewareError;
use crate::body::{text_response, GatewayBody};

/// 미들웨어 에러를 HTTP 응답으로 변환합니다.
///
/// 내부 오류 내용은 로그에만 남고 클라이언트에는 상태 문구만 전달됩니다.
pub fn handle_middleware_error(err: MiddlewareError) -> Response<GatewayBody> {
    let status = match err {
        MiddlewareError::PreflightResponse(response) => return response,
        MiddlewareError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        MiddlewareError::Config(_) => {
            error!(error = %err, "미들웨어 처리 실패");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    text_response(status, status.canonical_reason().unwrap_or("Error"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_too_large_maps_to_413() {
        let response = handle_middleware_error(MiddlewareError::PayloadTooLarge {
            limit: 10,
            received: Some(11),
        });
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_preflight_response_passes_through() {
        let mut preflight = Response::new(crate::body::empty());
        *preflight.status_mut() = StatusCode::NO_CONTENT;
        let response = handle_middleware_error(MiddlewareError::PreflightResponse(preflight));
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let response = handle_middleware_error(MiddlewareError::Config("secret detail".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
