use std::net::SocketAddr;
use std::sync::Arc;

use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use super::error::Error;
use super::handler::RequestHandler;
use super::Result;

pub struct ServerListener {
    http_listener: TcpListener,
}

impl ServerListener {
    pub async fn bind(port: u16) -> Result<Self> {
        let addr = format!("0.0.0.0:{}", port);
        let bound = TcpListener::bind(addr.as_str()).await;
        let http_listener = bound.map_err(|e| {
            error!(error = %e, port, "HTTP 포트 바인딩 실패");
            Error::Bind { addr, error: e }
        })?;

        info!(port, "HTTP 리스너 시작");
        Ok(Self { http_listener })
    }

    pub fn from_listener(http_listener: TcpListener) -> Self {
        Self { http_listener }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.http_listener.local_addr()?)
    }

    /// 연결마다 태스크를 하나씩 띄워 처리합니다. Ctrl-C를 받으면 수락을 멈춥니다.
    pub async fn run(self, handler: Arc<RequestHandler>) -> Result<()> {
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.http_listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let handler = handler.clone();
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                if let Err(err) = handler.handle_connection(io, Some(remote_addr)).await {
                                    debug!(error = %err, %remote_addr, "HTTP 연결 처리 실패");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "HTTP 연결 수락 실패");
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("종료 신호 수신 - 새 연결 수락 중단");
                    return Ok(());
                }
            }
        }
    }
}
