use async_trait::async_trait;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Method, Response, StatusCode};
use tracing::{debug, instrument};

use super::config::CorsConfig;
use crate::body::{self, GatewayBody};
use crate::context::{RequestContext, RequestMeta};
use crate::middleware::{Middleware, MiddlewareError};

/// CORS 미들웨어
///
/// 모든 응답에 허용 헤더를 붙이고, `OPTIONS` 요청은 업스트림이나 정적 파일로
/// 넘기지 않고 204로 바로 응답합니다.
#[derive(Debug)]
pub struct CorsMiddleware {
    methods: HeaderValue,
    headers: HeaderValue,
    max_age: Option<HeaderValue>,
}

impl CorsMiddleware {
    pub fn new(config: CorsConfig) -> Result<Self, MiddlewareError> {
        let invalid = |e: header::InvalidHeaderValue| MiddlewareError::Config(format!("CORS 헤더 값이 잘못됨: {}", e));

        Ok(Self {
            methods: HeaderValue::from_str(&config.methods_value()).map_err(invalid)?,
            headers: HeaderValue::from_str(&config.headers_value()).map_err(invalid)?,
            max_age: config.max_age.map(HeaderValue::from),
        })
    }

    /// CORS 헤더 설정
    fn set_cors_headers(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
        match origin {
            Some(origin) => {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
                let has_vary = headers
                    .get_all(header::VARY)
                    .iter()
                    .any(|v| v.as_bytes().eq_ignore_ascii_case(b"origin"));
                if !has_vary {
                    headers.append(header::VARY, HeaderValue::from_static("Origin"));
                }
            }
            None => {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            }
        }
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.headers.clone());
    }

    /// Preflight 요청 처리
    fn preflight(&self, ctx: &RequestContext) -> Response<GatewayBody> {
        let mut response = Response::new(body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;

        let headers = response.headers_mut();
        self.set_cors_headers(headers, ctx.headers().get(header::ORIGIN));
        if let Some(max_age) = &self.max_age {
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, max_age.clone());
        }

        response
    }
}

#[async_trait]
impl Middleware for CorsMiddleware {
    fn name(&self) -> &str {
        "cors"
    }

    #[instrument(skip_all, fields(request_id = %ctx.request_id))]
    async fn handle_request(&self, ctx: RequestContext) -> Result<RequestContext, MiddlewareError> {
        if ctx.method() == Method::OPTIONS {
            debug!(path = %ctx.uri().path(), "Handling CORS preflight request");
            return Err(MiddlewareError::PreflightResponse(self.preflight(&ctx)));
        }
        Ok(ctx)
    }

    async fn handle_response(
        &self,
        meta: &RequestMeta,
        mut res: Response<GatewayBody>,
    ) -> Result<Response<GatewayBody>, MiddlewareError> {
        self.set_cors_headers(res.headers_mut(), meta.origin.as_ref());
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Request;

    fn context(method: Method, origin: Option<&str>) -> RequestContext {
        let mut builder = Request::builder().method(method).uri("/api/products");
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        RequestContext::new(builder.body(body::empty()).unwrap(), None)
    }

    #[tokio::test]
    async fn test_options_short_circuits_with_204() {
        let cors = CorsMiddleware::new(CorsConfig::default()).unwrap();
        let err = cors
            .handle_request(context(Method::OPTIONS, Some("http://localhost:5173")))
            .await
            .unwrap_err();

        let MiddlewareError::PreflightResponse(response) = err else {
            panic!("preflight 응답이 아님");
        };
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET,POST,PUT,DELETE,OPTIONS"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization, X-Requested-With"
        );
    }

    #[tokio::test]
    async fn test_response_without_origin_gets_wildcard() {
        let cors = CorsMiddleware::new(CorsConfig::default()).unwrap();
        let ctx = cors.handle_request(context(Method::GET, None)).await.unwrap();
        let meta = ctx.meta();

        let response = cors
            .handle_response(&meta, Response::new(body::empty()))
            .await
            .unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(response.headers().get(header::VARY).is_none());
    }
}
