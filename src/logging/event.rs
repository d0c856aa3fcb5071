use hyper::header::{self, HeaderMap};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// 캡처 기록에 남기는 본문 미리보기 최대 길이
pub const BODY_PREFIX_LIMIT: usize = 2000;

const REDACTED: &str = "[redacted]";

/// 관측 싱크로 보내는 게이트웨이 이벤트
///
/// 어떤 이벤트도 서비스 토큰 값을 담지 않습니다. 인증 관련 정보는 불리언 플래그뿐입니다.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GatewayEvent {
    ProxyRequest {
        request_id: String,
        method: String,
        path: String,
        route: String,
        target: String,
        auth_present: bool,
        auth_injected: bool,
        body: &'static str,
        content_length: Option<u64>,
    },
    ProxyResponse {
        request_id: String,
        status: u16,
        duration_ms: u64,
    },
    Capture(CaptureRecord),
    ProxyError {
        request_id: String,
        method: String,
        path: String,
        status: u16,
        error: String,
        duration_ms: u64,
    },
}

/// 멀티파트 캡처 진단 기록. 게이트웨이가 다시 읽지 않습니다.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureRecord {
    pub timestamp: String,
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body_len: usize,
    pub body_prefix: String,
    /// 읽기 오류로 캡처가 중단되었는지 여부
    pub aborted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaptureRecord {
    pub fn new(
        request_id: &str,
        method: &hyper::Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Self {
        Self {
            timestamp: now_rfc3339(),
            request_id: request_id.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            headers: snapshot_headers(headers),
            body_len: body.len(),
            body_prefix: body_prefix(body),
            aborted: false,
            error: None,
        }
    }

    pub fn aborted(mut self, error: impl std::fmt::Display) -> Self {
        self.aborted = true;
        self.error = Some(error.to_string());
        self
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

fn body_prefix(body: &[u8]) -> String {
    let end = body.len().min(BODY_PREFIX_LIMIT);
    String::from_utf8_lossy(&body[..end]).into_owned()
}

fn is_sensitive(name: &header::HeaderName) -> bool {
    *name == header::AUTHORIZATION
        || *name == header::PROXY_AUTHORIZATION
        || *name == header::COOKIE
        || *name == header::SET_COOKIE
}

/// 헤더 스냅샷. 자격 증명이 담길 수 있는 값은 가립니다.
pub fn snapshot_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if is_sensitive(name) || value.is_sensitive() {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}
