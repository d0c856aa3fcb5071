use std::net::SocketAddr;
use std::time::Instant;

use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue, ORIGIN};
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method, Request, Uri};
use uuid::Uuid;

use crate::body::{self, GatewayBody, ReplayBody};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

/// 파이프라인을 따라 흘러가는 요청 본문
#[derive(Debug)]
pub enum RequestBody {
    /// 아직 읽지 않은 원본 스트림
    Streaming(GatewayBody),
    /// 캡처 인터셉터가 끝까지 읽어 둔 본문
    Captured(Bytes),
    /// 캡처가 중간에 멈춰 원본 스트림으로 되돌아간 본문
    Resumed(ReplayBody),
}

impl RequestBody {
    pub fn kind(&self) -> &'static str {
        match self {
            RequestBody::Streaming(_) => "streaming",
            RequestBody::Captured(_) => "captured",
            RequestBody::Resumed(_) => "resumed",
        }
    }

    pub fn captured(&self) -> Option<&Bytes> {
        match self {
            RequestBody::Captured(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_outbound(self) -> GatewayBody {
        match self {
            RequestBody::Streaming(body) => body,
            RequestBody::Captured(bytes) => body::full(bytes),
            RequestBody::Resumed(replay) => body::boxed(replay),
        }
    }
}

/// 요청 하나의 처리 상태
///
/// 미들웨어는 이 값을 받아서 돌려주며, 본문을 소비한 단계는 `body`를
/// 다른 변형으로 바꿔 둡니다.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: String,
    pub parts: Parts,
    pub body: RequestBody,
    pub remote_addr: Option<SocketAddr>,
    pub started_at: Instant,
}

impl RequestContext {
    pub fn new(request: Request<GatewayBody>, remote_addr: Option<SocketAddr>) -> Self {
        let (parts, body) = request.into_parts();
        let request_id = inbound_request_id(&parts.headers)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            request_id,
            parts,
            body: RequestBody::Streaming(body),
            remote_addr,
            started_at: Instant::now(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn meta(&self) -> RequestMeta {
        RequestMeta {
            request_id: self.request_id.clone(),
            method: self.parts.method.clone(),
            path: self.parts.uri.path().to_string(),
            origin: self.parts.headers.get(ORIGIN).cloned(),
            started_at: self.started_at,
        }
    }
}

/// 응답 단계에서 참고하는 요청 정보. 본문이 이미 넘어간 뒤에도 남아 있습니다.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub request_id: String,
    pub method: Method,
    pub path: String,
    pub origin: Option<HeaderValue>,
    pub started_at: Instant,
}

impl RequestMeta {
    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

fn inbound_request_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(X_REQUEST_ID)?.to_str().ok()?.trim();
    let valid = !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    valid.then(|| value.to_string())
}
