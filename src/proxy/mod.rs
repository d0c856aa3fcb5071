//! 업스트림 전달 엔진
//!
//! 라우트가 결정된 요청을 업스트림으로 한 번만 보내고, 응답 상태와 헤더를 그대로
//! 복사한 뒤 본문을 버퍼링 없이 스트리밍합니다. 재시도는 하지 않습니다.

pub mod auth;
pub mod error;

use std::net::SocketAddr;
use std::sync::{Arc, Once};
use std::time::Duration;

use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::{Request, Response, Uri};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, instrument};

pub use error::ProxyError;

use crate::body::{self, GatewayBody};
use crate::context::{RequestBody, RequestContext};
use crate::logging::{EventSink, GatewayEvent};
use crate::routing::RouteMatch;
use crate::settings::{ServiceToken, Settings};

type HttpsClient = Client<HttpsConnector<HttpConnector>, GatewayBody>;

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
    header::PROXY_AUTHENTICATE,
];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// 요청 하나에 대한 전달 결정
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyDecision {
    pub route: String,
    pub target: Uri,
    pub inject_auth: bool,
}

static CRYPTO_PROVIDER: Once = Once::new();

fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        // 다른 곳에서 이미 설치했다면 그 provider를 그대로 씁니다
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

#[derive(Clone)]
pub struct ForwardingEngine {
    client: HttpsClient,
    timeout: Duration,
    token: Option<ServiceToken>,
    sink: Arc<EventSink>,
}

impl ForwardingEngine {
    pub fn new(settings: &Settings, sink: Arc<EventSink>) -> Self {
        install_crypto_provider();

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(settings.upstream.connect_timeout()));

        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build(https);

        Self {
            client,
            timeout: settings.upstream.timeout(),
            token: settings.service_token.clone(),
            sink,
        }
    }

    /// 라우트 매칭 결과와 인바운드 헤더로 전달 결정을 만듭니다.
    pub fn decide(&self, matched: RouteMatch, inbound: &HeaderMap) -> ProxyDecision {
        ProxyDecision {
            route: matched.route,
            target: matched.upstream_uri,
            inject_auth: auth::should_inject(inbound, self.token.as_ref()),
        }
    }

    #[instrument(skip_all, fields(request_id = %ctx.request_id, route = %decision.route))]
    pub async fn forward(&self, ctx: RequestContext, decision: ProxyDecision) -> Response<GatewayBody> {
        let request_id = ctx.request_id.clone();
        let method = ctx.method().to_string();
        let path = ctx.uri().path().to_string();
        let started_at = ctx.started_at;

        let outbound = self.build_outbound(ctx, &decision);
        let _ = self.sink.record(&GatewayEvent::ProxyRequest {
            request_id: request_id.clone(),
            method: method.clone(),
            path: path.clone(),
            route: decision.route.clone(),
            target: decision.target.to_string(),
            auth_present: outbound.auth_present,
            auth_injected: decision.inject_auth,
            body: outbound.body_kind,
            content_length: declared_length(outbound.request.headers()),
        }).await;

        let result = match tokio::time::timeout(self.timeout, self.client.request(outbound.request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(ProxyError::from_client_error(err)),
            Err(_) => Err(ProxyError::Timeout(self.timeout)),
        };

        let duration_ms = started_at.elapsed().as_millis() as u64;
        match result {
            Ok(response) => {
                let _ = self.sink.record(&GatewayEvent::ProxyResponse {
                    request_id,
                    status: response.status().as_u16(),
                    duration_ms,
                }).await;
                response.map(body::boxed)
            }
            Err(err) => {
                let _ = self.sink.record(&GatewayEvent::ProxyError {
                    request_id,
                    method,
                    path,
                    status: err.status().as_u16(),
                    error: error_chain(&err),
                    duration_ms,
                }).await;
                err.into_response()
            }
        }
    }

    fn build_outbound(&self, ctx: RequestContext, decision: &ProxyDecision) -> Outbound {
        let RequestContext { parts, body, remote_addr, .. } = ctx;

        let mut headers = copy_end_to_end(&parts.headers);
        if let Some(authority) = decision.target.authority() {
            if let Ok(host) = HeaderValue::from_str(authority.as_str()) {
                headers.insert(header::HOST, host);
            }
        }
        add_forwarded_headers(&mut headers, &parts.headers, remote_addr);

        let auth_present = auth::has_authorization(&parts.headers);
        let token = if decision.inject_auth { self.token.as_ref() } else { None };
        let mut headers = auth::decorate(headers, &parts.headers, token);

        let body_kind = body.kind();
        let body = match body {
            RequestBody::Captured(bytes) => {
                headers.remove(header::TRANSFER_ENCODING);
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
                body::full(bytes)
            }
            other => other.into_outbound(),
        };
        debug!(body = body_kind, upstream = %decision.target, "업스트림 요청 생성");

        let mut request = Request::new(body);
        *request.method_mut() = parts.method;
        *request.uri_mut() = decision.target.clone();
        *request.headers_mut() = headers;

        Outbound { request, auth_present, body_kind }
    }
}

struct Outbound {
    request: Request<GatewayBody>,
    auth_present: bool,
    body_kind: &'static str,
}

/// hop-by-hop 헤더와 `Connection`에 나열된 헤더, `Host`를 뺀 나머지를 복사합니다.
fn copy_end_to_end(inbound: &HeaderMap) -> HeaderMap {
    let listed: Vec<String> = inbound
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    let mut outbound = HeaderMap::with_capacity(inbound.len() + 4);
    for (name, value) in inbound {
        if *name == header::HOST
            || HOP_BY_HOP.contains(name)
            || listed.iter().any(|token| token == name.as_str())
        {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }
    outbound
}

fn add_forwarded_headers(outbound: &mut HeaderMap, inbound: &HeaderMap, remote_addr: Option<SocketAddr>) {
    if let Some(addr) = remote_addr {
        let client_ip = addr.ip().to_string();
        let forwarded_for = match inbound.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{}, {}", existing, client_ip),
            None => client_ip,
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            outbound.insert(X_FORWARDED_FOR, value);
        }
    }

    if let Some(host) = inbound.get(header::HOST) {
        outbound.insert(X_FORWARDED_HOST, host.clone());
    }
    outbound.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// 오류와 `source()` 체인을 `: `로 이어 한 줄로 만듭니다.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
