use std::{env, path::Path};
use serde::Deserialize;
use tracing::{debug, warn};

mod server;
mod upstream;
pub mod logging;
pub mod credential;
mod error;

pub use server::{ServerSettings, DEFAULT_MAX_CAPTURE_BYTES};
pub use upstream::{UpstreamSettings, parse_origin, DEFAULT_BACKEND_URL};
pub use logging::{LogSettings, LogFormat, LogOutput};
pub use credential::{CredentialSource, ServiceToken};
pub use error::SettingsError;

pub type Result<T> = std::result::Result<T, SettingsError>;
pub use server::{parse_env_var, parse_env_flag};

/// 게이트웨이 전역 설정
///
/// 시작 시 한 번 만들어진 뒤 `Arc`로 공유되며 변경되지 않습니다.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // 서버 설정
    #[serde(default)]
    pub server: ServerSettings,

    // 업스트림 설정
    #[serde(default)]
    pub upstream: UpstreamSettings,

    // 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,

    /// 자격 증명 소스에서 해석된 서비스 토큰 (설정 파일로는 지정할 수 없음)
    #[serde(skip)]
    pub service_token: Option<ServiceToken>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            upstream: UpstreamSettings::default(),
            logging: LogSettings::default(),
            service_token: None,
        }
    }
}

impl Settings {
    pub async fn load() -> Result<Self> {
        if let Ok(config_path) = env::var("GATEWAY_CONFIG_FILE") {
            Self::from_toml_file(&config_path).await
        } else {
            Self::from_env().await
        }
    }

    pub async fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "TOML 설정 파일 로드");

        let content = tokio::fs::read_to_string(path).await.map_err(|e| SettingsError::FileError {
            path: path.to_string_lossy().to_string(),
            error: e,
        })?;

        let mut settings: Self = toml::from_str(&content)
            .map_err(|e| SettingsError::ParseError { source: e })?;
        settings.service_token = CredentialSource::from_env().resolve_token();

        settings.validate().await?;
        Ok(settings)
    }

    pub async fn from_env() -> Result<Self> {
        let settings = Self {
            server: ServerSettings::from_env()?,
            upstream: UpstreamSettings::from_env()?,
            logging: LogSettings::from_env()?,
            service_token: CredentialSource::from_env().resolve_token(),
        };

        // 설정 생성 시점에 바로 검증
        settings.validate().await?;
        Ok(settings)
    }

    /// 설정 유효성 검증
    pub async fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.upstream.validate()?;

        if !tokio::fs::metadata(&self.server.static_root).await.map(|m| m.is_dir()).unwrap_or(false) {
            // 빌드 전 개발 환경에서도 API 프록시는 동작해야 하므로 경고만 남깁니다
            warn!(
                static_root = %self.server.static_root.display(),
                "정적 파일 루트가 없음 - 정적 요청은 404로 응답"
            );
        }

        Ok(())
    }

    /// 시작 로그에 남길 수 있는 요약 (토큰 값 제외)
    pub fn summary(&self) -> String {
        format!(
            "port={} upstream={} static_root={} cors={} max_capture_bytes={} token_configured={}",
            self.server.http_port,
            self.upstream.origin,
            self.server.static_root.display(),
            self.server.cors_enabled,
            self.server.max_capture_bytes,
            self.service_token.is_some(),
        )
    }
}
