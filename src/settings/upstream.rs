use serde::{Deserialize, Deserializer};
use std::env;
use std::time::Duration;
use url::Url;
use super::{server::parse_env_var, SettingsError};

pub const DEFAULT_BACKEND_URL: &str = "https://wdd330-backend.onrender.com";

/// 업스트림 백엔드 설정
#[derive(Clone, Debug, Deserialize)]
pub struct UpstreamSettings {
    /// 백엔드 오리진 (http/https)
    #[serde(default = "default_origin", deserialize_with = "deserialize_origin")]
    pub origin: Url,

    /// 응답 헤더 수신까지의 제한 시간 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TCP 연결 제한 시간 (초)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_origin() -> Url {
    Url::parse(DEFAULT_BACKEND_URL).expect("기본 백엔드 URL은 항상 유효합니다")
}
fn default_timeout_secs() -> u64 { 30 }
fn default_connect_timeout_secs() -> u64 { 10 }

fn deserialize_origin<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_origin(&raw).map_err(serde::de::Error::custom)
}

/// 오리진 문자열을 파싱하고 게이트웨이가 다룰 수 있는 형태인지 검사합니다.
pub fn parse_origin(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("지원하지 않는 스킴: {}", url.scheme()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("호스트가 없습니다".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("오리진에는 쿼리나 프래그먼트를 둘 수 없습니다".to_string());
    }

    Ok(url)
}

impl UpstreamSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let origin = match env::var("BACKEND_URL") {
            Ok(raw) => parse_origin(&raw).map_err(|reason| SettingsError::EnvVarInvalid {
                var_name: "BACKEND_URL".to_string(),
                value: raw,
                reason,
            })?,
            Err(_) => default_origin(),
        };

        let settings = Self {
            origin,
            timeout_secs: parse_env_var("GATEWAY_UPSTREAM_TIMEOUT_SECS", default_timeout_secs)?,
            connect_timeout_secs: parse_env_var("GATEWAY_CONNECT_TIMEOUT_SECS", default_connect_timeout_secs)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.timeout_secs == 0 {
            return Err(SettingsError::InvalidConfig("업스트림 제한 시간은 0보다 커야 합니다".to_string()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(SettingsError::InvalidConfig("연결 제한 시간은 0보다 커야 합니다".to_string()));
        }
        parse_origin(self.origin.as_str()).map_err(SettingsError::InvalidConfig)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}
