use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::event::GatewayEvent;

#[derive(Debug, thiserror::Error)]
pub enum LogSinkError {
    #[error("이벤트 직렬화 실패: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("이벤트 로그 파일 기록 실패: {0}")]
    Io(#[from] std::io::Error),
}

/// 호출자는 이 결과를 무시해도 됩니다. 로그 실패가 요청 경로에 영향을 주면 안 됩니다.
pub type SinkResult = Result<(), LogSinkError>;

/// 게이트웨이 이벤트 기록기
///
/// 모든 이벤트를 `tracing`으로 한 줄씩 내보내고, 파일이 설정된 경우
/// JSON 한 줄로 덧붙입니다. 파일 쓰기는 뮤텍스로 직렬화되어 줄이 섞이지 않습니다.
#[derive(Debug)]
pub struct EventSink {
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
}

impl EventSink {
    pub fn stdout_only() -> Self {
        Self { file: None, path: None }
    }

    /// 파일을 열 수 없으면 경고만 남기고 표준 출력 전용으로 동작합니다.
    pub async fn open(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::stdout_only();
        };

        match OpenOptions::new().create(true).append(true).open(path).await {
            Ok(file) => {
                info!(path = %path.display(), "이벤트 로그 파일 열림");
                Self {
                    file: Some(Mutex::new(file)),
                    path: Some(path.to_path_buf()),
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "이벤트 로그 파일을 열 수 없음 - 표준 출력만 사용");
                Self::stdout_only()
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn record(&self, event: &GatewayEvent) -> SinkResult {
        emit(event);

        let Some(file) = &self.file else {
            return Ok(());
        };

        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

fn emit(event: &GatewayEvent) {
    match event {
        GatewayEvent::ProxyRequest {
            request_id, method, path, route, target,
            auth_present, auth_injected, body, content_length,
        } => info!(
            event = "proxy_request",
            request_id = %request_id,
            method = %method,
            path = %path,
            route = %route,
            upstream = %target,
            auth_present,
            auth_injected,
            body = %body,
            content_length = ?content_length,
            "Proxying: {} {} -> {}", method, path, target
        ),
        GatewayEvent::ProxyResponse { request_id, status, duration_ms } => info!(
            event = "proxy_response",
            request_id = %request_id,
            status,
            duration_ms,
            "Upstream responded"
        ),
        GatewayEvent::Capture(record) if record.aborted => warn!(
            event = "capture",
            request_id = %record.request_id,
            method = %record.method,
            path = %record.path,
            body_len = record.body_len,
            error = ?record.error,
            "Body capture aborted, falling back to passthrough"
        ),
        GatewayEvent::Capture(record) => info!(
            event = "capture",
            request_id = %record.request_id,
            method = %record.method,
            path = %record.path,
            body_len = record.body_len,
            "Captured request body"
        ),
        GatewayEvent::ProxyError { request_id, method, path, status, error, duration_ms } => error!(
            event = "proxy_error",
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            duration_ms,
            error = %error,
            "Proxy request failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::event::CaptureRecord;
    use hyper::{HeaderMap, Method};

    #[tokio::test]
    async fn test_record_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let sink = EventSink::open(Some(path.as_path())).await;
        assert_eq!(sink.path(), Some(path.as_path()));

        let capture = CaptureRecord::new("req-1", &Method::POST, "/users", &HeaderMap::new(), b"--x\r\n");
        sink.record(&GatewayEvent::Capture(capture)).await.unwrap();
        sink.record(&GatewayEvent::ProxyResponse {
            request_id: "req-1".to_string(),
            status: 200,
            duration_ms: 3,
        }).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["request_id"], "req-1");
        }
    }

    #[tokio::test]
    async fn test_unwritable_path_falls_back_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        // 디렉토리 자체는 파일로 열 수 없습니다
        let sink = EventSink::open(Some(dir.path())).await;
        assert!(sink.path().is_none());

        let result = sink.record(&GatewayEvent::ProxyResponse {
            request_id: "req-2".to_string(),
            status: 200,
            duration_ms: 1,
        }).await;
        assert!(result.is_ok());
    }
}
