use std::sync::Arc;

use spa_gateway::{
    logging::{init_logging, EventSink},
    server::{self, GatewayServer},
    settings::Settings,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let settings = match Settings::load().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            std::process::exit(1);
        }
    };

    let guard = init_logging(&settings.logging);
    let result = run(settings).await;
    if let Err(e) = &result {
        error!(error = %e, "게이트웨이 종료");
    }

    // 종료 전에 버퍼된 로그를 모두 내보냅니다
    drop(guard);
    if result.is_err() {
        std::process::exit(1);
    }
}

async fn run(settings: Settings) -> server::Result<()> {
    info!(settings = %settings.summary(), "설정 로드 완료");

    let sink = Arc::new(EventSink::open(settings.logging.event_log.as_deref()).await);
    let settings = Arc::new(settings);
    let server = GatewayServer::bind(settings.clone(), sink).await?;

    info!("Server running on port {}", settings.server.http_port);
    info!("Proxying /api/* to {}", settings.upstream.origin);

    server.run().await
}
