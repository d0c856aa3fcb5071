//! 서비스 자격 증명(백엔드 API 토큰) 해석
//!
//! 프로세스 시작 시 한 번만 실행되며 결과는 [`Settings`](super::Settings)에
//! 저장되어 프로세스가 끝날 때까지 바뀌지 않습니다.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const TOKEN_VAR: &str = "BACKEND_API_TOKEN";
pub const ENV_FILE_VAR: &str = "GATEWAY_ENV_FILE";
pub const DEFAULT_ENV_FILE: &str = ".env.local";

/// 업스트림 요청에만 쓰이는 서비스 토큰
///
/// `Display`와 `Serialize`를 구현하지 않으며 `Debug` 출력은 가려집니다.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceToken(String);

impl ServiceToken {
    /// 빈 문자열(공백 포함)이나 헤더 값으로 쓸 수 없는 제어 문자가 섞인 값은 토큰으로 보지 않습니다.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_control) {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// `Authorization` 헤더를 만들 때만 사용합니다.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServiceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServiceToken(***)")
    }
}

/// 환경 변수와 로컬 오버라이드 파일에서 토큰을 찾는 소스
#[derive(Debug, Clone)]
pub struct CredentialSource {
    env_file: Option<PathBuf>,
}

impl CredentialSource {
    pub fn new(env_file: Option<PathBuf>) -> Self {
        Self { env_file }
    }

    /// `GATEWAY_ENV_FILE`(기본값 `.env.local`)을 오버라이드 파일로 사용합니다.
    pub fn from_env() -> Self {
        let path = env::var(ENV_FILE_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENV_FILE.to_string());
        Self::new(Some(PathBuf::from(path)))
    }

    pub fn resolve_token(&self) -> Option<ServiceToken> {
        let token = self.lookup(TOKEN_VAR).and_then(ServiceToken::new);
        // 값은 절대 기록하지 않습니다
        info!(token_present = token.is_some(), "서비스 토큰 해석 완료");
        token
    }

    /// 환경 변수를 먼저 확인하고, 없을 때만 오버라이드 파일을 봅니다.
    fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = env::var(key).ok().filter(|v| !v.is_empty()) {
            debug!(key, source = "env", "자격 증명 키 발견");
            return Some(value);
        }

        let path = self.env_file.as_deref()?;
        let entries = load_env_file(path)?;
        let value = entries.get(key).cloned();
        if value.is_some() {
            debug!(key, source = %path.display(), "자격 증명 키 발견");
        }
        value
    }
}

/// 파일을 읽지 못하면 `None`을 돌려줍니다. 실패는 치명적이지 않습니다.
fn load_env_file(path: &Path) -> Option<HashMap<String, String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(parse_env_file(&content).into_iter().collect()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "오버라이드 파일을 읽을 수 없음");
            None
        }
    }
}

/// `KEY=VALUE` 줄을 순서대로 파싱합니다.
///
/// 빈 줄과 `#` 주석, 선행 `export `를 허용하고 값 양끝의 따옴표를 벗겨냅니다.
/// 같은 키가 여러 번 나오면 먼저 나온 값을 유지합니다.
pub fn parse_env_file(content: &str) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }
        if entries.iter().any(|(k, _)| k == key) {
            continue;
        }

        entries.push((key.to_string(), unquote(value.trim()).to_string()));
    }

    entries
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
