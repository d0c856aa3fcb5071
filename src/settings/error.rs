use std::fmt;

/// 시작 단계의 설정 오류. 어느 것이든 프로세스를 종료시킵니다.
#[derive(Debug)]
pub enum SettingsError {
    /// 환경 변수 값을 해석할 수 없음
    EnvVarInvalid {
        var_name: String,
        value: String,
        reason: String,
    },
    /// `GATEWAY_CONFIG_FILE`을 읽을 수 없음
    FileError {
        path: String,
        error: std::io::Error,
    },
    ParseError {
        source: toml::de::Error,
    },
    /// 값은 읽혔지만 게이트웨이가 쓸 수 없는 조합
    InvalidConfig(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvVarInvalid { var_name, value, reason } =>
                write!(f, "환경 변수 {} 값 {} 오류: {}", var_name, value, reason),
            Self::FileError { path, error } =>
                write!(f, "설정 파일 {} 오류: {}", path, error),
            Self::ParseError { source } =>
                write!(f, "설정 파싱 오류: {}", source),
            Self::InvalidConfig(msg) =>
                write!(f, "잘못된 설정: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ParseError { source } => Some(source),
            Self::FileError { error, .. } => Some(error),
            _ => None,
        }
    }
}
