use std::fmt;

/// 라우팅 관련 에러를 표현하는 열거형입니다.
#[derive(Debug, PartialEq)]
pub enum RoutingError {
    /// 잘못된 경로 패턴
    InvalidPathPattern {
        pattern: String,
        reason: String,
    },
    /// 잘못된 재작성 규칙
    InvalidRewrite {
        pattern: String,
        reason: String,
    },
    /// 업스트림 URI를 만들 수 없음
    InvalidTarget {
        target: String,
        reason: String,
    },
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::InvalidPathPattern { pattern, reason } =>
                write!(f, "잘못된 경로 패턴: {} ({})", pattern, reason),
            RoutingError::InvalidRewrite { pattern, reason } =>
                write!(f, "잘못된 재작성 규칙: {} ({})", pattern, reason),
            RoutingError::InvalidTarget { target, reason } =>
                write!(f, "업스트림 URI 생성 실패: {} ({})", target, reason),
        }
    }
}

impl std::error::Error for RoutingError {}
