//! 리스너와 요청 처리기를 묶는 서버 진입점

pub mod error;
pub mod handler;
pub mod listener;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

pub use error::Error;
pub use handler::RequestHandler;
pub use listener::ServerListener;

use crate::logging::EventSink;
use crate::settings::Settings;

pub type Result<T> = std::result::Result<T, Error>;

pub struct GatewayServer {
    listener: ServerListener,
    handler: Arc<RequestHandler>,
}

impl GatewayServer {
    /// 설정된 포트(`0.0.0.0`)에 바인딩합니다.
    pub async fn bind(settings: Arc<Settings>, sink: Arc<EventSink>) -> Result<Self> {
        let listener = ServerListener::bind(settings.server.http_port).await?;
        Self::with_listener(&settings, sink, listener)
    }

    /// 이미 바인딩된 리스너를 사용합니다 (테스트에서 임의 포트를 쓸 때).
    pub fn from_listener(settings: &Settings, sink: Arc<EventSink>, listener: TcpListener) -> Result<Self> {
        Self::with_listener(settings, sink, ServerListener::from_listener(listener))
    }

    fn with_listener(settings: &Settings, sink: Arc<EventSink>, listener: ServerListener) -> Result<Self> {
        let handler = RequestHandler::new(settings, sink)?;
        Ok(Self {
            listener,
            handler: Arc::new(handler),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> Result<()> {
        info!(addr = %self.local_addr()?, "게이트웨이 시작");
        self.listener.run(self.handler).await
    }
}
