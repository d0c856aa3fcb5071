use std::fmt;

use crate::middleware::MiddlewareError;
use crate::settings::SettingsError;

#[derive(Debug)]
pub enum Error {
    Bind {
        addr: String,
        error: std::io::Error,
    },
    Settings(SettingsError),
    Middleware(MiddlewareError),
    IoError(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<SettingsError> for Error {
    fn from(err: SettingsError) -> Self {
        Error::Settings(err)
    }
}

impl From<MiddlewareError> for Error {
    fn from(err: MiddlewareError) -> Self {
        Error::Middleware(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bind { addr, error } => write!(f, "{} 바인딩 실패: {}", addr, error),
            Error::Settings(e) => write!(f, "설정 오류: {}", e),
            Error::Middleware(e) => write!(f, "미들웨어 초기화 실패: {}", e),
            Error::IoError(e) => write!(f, "IO 오류: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Bind { error, .. } => Some(error),
            Error::Settings(e) => Some(e),
            Error::Middleware(e) => Some(e),
            Error::IoError(e) => Some(e),
        }
    }
}
