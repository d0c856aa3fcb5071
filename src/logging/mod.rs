use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info, warn, error, Level, span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use crate::settings::{LogFormat, LogOutput, LogSettings};

pub mod event;
pub mod sink;

pub use event::{CaptureRecord, GatewayEvent};
pub use sink::{EventSink, LogSinkError, SinkResult};

/// 전역 tracing 구독자를 설치합니다.
///
/// 반환된 가드는 `main`이 끝날 때까지 살아 있어야 버퍼된 로그가 모두 기록됩니다.
/// 이미 구독자가 설치되어 있으면(테스트 등) 조용히 넘어갑니다.
pub fn init_logging(settings: &LogSettings) -> Option<WorkerGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(settings.level.into())
        .from_env_lossy();

    let (writer, guard) = match &settings.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::File(path) => {
            let dir = path.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().unwrap_or_else(|| OsStr::new("gateway.log"));
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_line_number(true);

    let result = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder
            .with_ansi(settings.output == LogOutput::Stdout)
            .try_init(),
    };

    match result {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

/// 요청 하나에 대한 요약 로그
#[derive(Debug)]
pub struct RequestLog {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub route: Option<String>,
    pub status_code: u16,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl RequestLog {
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            method: String::new(),
            path: String::new(),
            route: None,
            status_code: 0,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn with_request(&mut self, method: &hyper::Method, uri: &hyper::Uri) {
        self.method = method.to_string();
        self.path = uri.path().to_string();

        debug!(
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
            "Received request"
        );
    }

    pub fn with_route(&mut self, route: &str) {
        self.route = Some(route.to_string());
        debug!(request_id = %self.request_id, route = %route, "Route matched");
    }

    pub fn with_response(&mut self, status: hyper::StatusCode) {
        self.status_code = status.as_u16();
    }

    pub fn with_error(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }
}

pub fn log_request(log: &RequestLog) {
    let level = if log.error.is_some() {
        Level::ERROR
    } else if log.status_code >= 400 {
        Level::WARN
    } else {
        Level::INFO
    };

    let route = log.route.as_deref().unwrap_or("static");
    let span = span!(
        Level::INFO,
        "request",
        request_id = %log.request_id,
        method = %log.method,
        path = %log.path,
        route = %route,
        status = log.status_code,
        duration_ms = log.duration_ms
    );
    let _enter = span.enter();

    match level {
        Level::ERROR => error!(error = ?log.error, "Request failed"),
        Level::WARN => warn!("Request completed with warning"),
        _ => info!("Request completed successfully"),
    }
}
