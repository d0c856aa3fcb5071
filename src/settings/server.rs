use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use super::SettingsError;

/// 멀티파트 본문 캡처 상한 기본값 (25 MiB)
pub const DEFAULT_MAX_CAPTURE_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone, Debug, Deserialize)]
pub struct ServerSettings {
    /// HTTP 포트 (기본값: 3000)
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// 정적 파일 루트 디렉토리
    #[serde(default = "default_static_root")]
    pub static_root: PathBuf,

    /// SPA 폴백 문서 이름
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// CORS 헤더 추가 여부 (디버깅 용도)
    #[serde(default)]
    pub cors_enabled: bool,

    /// 캡처 가능한 최대 요청 본문 크기 (바이트)
    #[serde(default = "default_max_capture_bytes")]
    pub max_capture_bytes: usize,
}

fn default_http_port() -> u16 { 3000 }
fn default_static_root() -> PathBuf { PathBuf::from("dist") }
fn default_index_file() -> String { "index.html".to_string() }
fn default_max_capture_bytes() -> usize { DEFAULT_MAX_CAPTURE_BYTES }

pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T, SettingsError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: "".to_string(),
            reason: e.to_string(),
        }),
    }
}

/// `"true"`(대소문자 무시)만 참으로 취급하고 나머지는 모두 거짓입니다.
pub fn parse_env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

impl ServerSettings {
    const MIN_PORT: u16 = 1;
    const MAX_PORT: u16 = 65535;

    fn parse_port(name: &str, value: &str) -> Result<u16, SettingsError> {
        let port = value.trim().parse::<u16>().map_err(|_| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: value.to_string(),
            reason: format!("포트는 {}-{} 범위여야 합니다", Self::MIN_PORT, Self::MAX_PORT),
        })?;

        if port < Self::MIN_PORT {
            return Err(SettingsError::EnvVarInvalid {
                var_name: name.to_string(),
                value: value.to_string(),
                reason: "포트는 0이 될 수 없습니다".to_string(),
            });
        }

        Ok(port)
    }

    pub fn from_env() -> Result<Self, SettingsError> {
        let http_port = Self::parse_port(
            "PORT",
            &env::var("PORT").unwrap_or_else(|_| default_http_port().to_string())
        )?;

        let settings = Self {
            http_port,
            static_root: env::var("GATEWAY_STATIC_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_static_root()),
            index_file: env::var("GATEWAY_INDEX_FILE")
                .unwrap_or_else(|_| default_index_file()),
            cors_enabled: parse_env_flag("ALLOW_CORS"),
            max_capture_bytes: parse_env_var("GATEWAY_MAX_CAPTURE_BYTES", default_max_capture_bytes)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        // TOML 경로는 serde가 u16 범위만 보장하므로 0을 여기서 걸러냅니다
        if self.http_port < Self::MIN_PORT {
            return Err(SettingsError::InvalidConfig("포트는 0이 될 수 없습니다".to_string()));
        }

        if self.max_capture_bytes == 0 {
            return Err(SettingsError::EnvVarInvalid {
                var_name: "GATEWAY_MAX_CAPTURE_BYTES".to_string(),
                value: "0".to_string(),
                reason: "캡처 상한은 0보다 커야 합니다".to_string(),
            });
        }

        if self.index_file.trim().is_empty() || self.index_file.contains('/') {
            return Err(SettingsError::InvalidConfig(
                format!("잘못된 인덱스 문서 이름: {:?}", self.index_file)
            ));
        }

        Ok(())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            static_root: default_static_root(),
            index_file: default_index_file(),
            cors_enabled: false,
            max_capture_bytes: default_max_capture_bytes(),
        }
    }
}
