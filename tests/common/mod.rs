#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use spa_gateway::logging::EventSink;
use spa_gateway::server::GatewayServer;
use spa_gateway::settings::{ServerSettings, Settings, UpstreamSettings};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use url::Url;

// Mock 업스트림: 받은 요청 정보를 x-echo-* 헤더로, 본문은 그대로 돌려줍니다
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        Self::start_with_delay(Duration::ZERO).await
    }

    pub async fn start_with_delay(delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    continue;
                };
                let counter = counter.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let counter = counter.clone();
                        async move { echo(req, counter, delay).await }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { addr, hits }
    }

    pub fn origin(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn echo(
    req: Request<Incoming>,
    hits: Arc<AtomicUsize>,
    delay: Duration,
) -> Result<Response<Full<Bytes>>, Infallible> {
    hits.fetch_add(1, Ordering::SeqCst);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let (parts, body) = req.into_parts();
    let body = body.collect().await.map(|c| c.to_bytes()).unwrap_or_default();

    let auth: Vec<String> = parts
        .headers
        .get_all(header::AUTHORIZATION)
        .iter()
        .map(|v| v.to_str().unwrap_or_default().to_string())
        .collect();
    let header_or_none = |name: header::HeaderName| {
        parts
            .headers
            .get(name)
            .map(|v| v.to_str().unwrap_or_default().to_string())
            .unwrap_or_else(|| "none".to_string())
    };

    let status = parts
        .headers
        .get("x-mock-status")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u16>().ok())
        .and_then(|v| StatusCode::from_u16(v).ok())
        .unwrap_or(StatusCode::OK);

    let response = Response::builder()
        .status(status)
        .header("x-echo-method", parts.method.as_str())
        .header("x-echo-path", parts.uri.path_and_query().map(|p| p.as_str()).unwrap_or("/"))
        .header("x-echo-auth", if auth.is_empty() { "none".to_string() } else { auth.join(" | ") })
        .header("x-echo-auth-count", auth.len())
        .header("x-echo-host", header_or_none(header::HOST))
        .header("x-echo-content-length", header_or_none(header::CONTENT_LENGTH))
        .header("x-echo-transfer-encoding", header_or_none(header::TRANSFER_ENCODING))
        .header("x-echo-forwarded-for", header_or_none(header::HeaderName::from_static("x-forwarded-for")))
        .body(Full::new(body))
        .unwrap();
    Ok(response)
}

/// 요청을 받기만 하고 응답하지 않는 업스트림. 상대가 연결을 끊으면 알려줍니다.
pub struct HangingUpstream {
    pub addr: SocketAddr,
    closed: oneshot::Receiver<usize>,
}

impl HangingUpstream {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, closed) = oneshot::channel();

        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 4096];
            let mut received = 0;
            loop {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => received += n,
                }
            }
            let _ = tx.send(received);
        });

        Self { addr, closed }
    }

    pub fn origin(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    /// 게이트웨이 쪽 연결이 닫힐 때까지 기다리고, 그때까지 받은 바이트 수를 돌려줍니다.
    pub async fn wait_closed(self, limit: Duration) -> Option<usize> {
        tokio::time::timeout(limit, self.closed).await.ok()?.ok()
    }
}

/// 원시 HTTP/1.1 요청을 보내고 연결이 닫힐 때까지 응답을 읽습니다.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

/// `Transfer-Encoding: chunked`로 본문을 여러 조각에 나눠 씁니다.
pub fn chunked(body: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut encoded = Vec::new();
    for chunk in body.chunks(chunk_size) {
        encoded.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        encoded.extend_from_slice(chunk);
        encoded.extend_from_slice(b"\r\n");
    }
    encoded.extend_from_slice(b"0\r\n\r\n");
    encoded
}

/// 응답 헤드(상태 줄과 헤더, 각 줄의 CRLF 포함)를 소문자 문자열로 돌려줍니다.
pub fn response_head(response: &[u8]) -> String {
    let end = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map_or(response.len(), |pos| pos + 2);
    String::from_utf8_lossy(&response[..end]).to_ascii_lowercase()
}

/// 닫힌 포트를 가리키는 origin
pub async fn closed_origin() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}", addr)).unwrap()
}

pub fn settings_for(origin: Url, static_root: &Path) -> Settings {
    Settings {
        server: ServerSettings {
            static_root: static_root.to_path_buf(),
            ..ServerSettings::default()
        },
        upstream: UpstreamSettings {
            origin,
            ..UpstreamSettings::default()
        },
        ..Settings::default()
    }
}

pub async fn spawn_gateway(settings: Settings) -> SocketAddr {
    spawn_gateway_with_sink(settings, EventSink::stdout_only()).await
}

pub async fn spawn_gateway_with_sink(settings: Settings, sink: EventSink) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server = GatewayServer::from_listener(&settings, Arc::new(sink), listener).unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

pub fn write_spa(root: &Path) {
    std::fs::write(root.join("index.html"), "<!doctype html><div id=\"app\"></div>").unwrap();
    std::fs::create_dir_all(root.join("assets")).unwrap();
    std::fs::write(root.join("assets").join("app.js"), "console.log('app');").unwrap();
}

pub fn multipart_body(boundary: &str, payload_len: usize) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"avatar\"; filename=\"a.bin\"\r\n");
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend((0..payload_len).map(|i| (i % 251) as u8));
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}
