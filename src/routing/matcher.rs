use std::str::FromStr;
use regex_lite as regex;

use super::error::RoutingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatcherKind {
    Exact,
    Prefix,
    Regex,
}

/// 요청 경로 매처
///
/// 문자열 표기: `^`로 시작하면 정규식, `*`로 끝나면 접두사, 그 외는 정확히 일치.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pub kind: PathMatcherKind,
    pub pattern: String,
    regex: Option<regex::Regex>,
}

impl PathMatcher {
    pub fn exact(path: &str) -> Self {
        Self {
            kind: PathMatcherKind::Exact,
            pattern: path.to_string(),
            regex: None,
        }
    }

    /// 세그먼트 단위 접두사. `/api`는 `/api`, `/api/x`와 맞지만 `/apix`와는 맞지 않습니다.
    pub fn prefix(prefix: &str) -> Self {
        let trimmed = prefix.trim_end_matches('/');
        Self {
            kind: PathMatcherKind::Prefix,
            pattern: if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() },
            regex: None,
        }
    }

    pub fn regex(pattern: &str) -> Result<Self, RoutingError> {
        let re = regex::Regex::new(pattern).map_err(|e| RoutingError::InvalidPathPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            kind: PathMatcherKind::Regex,
            pattern: pattern.to_string(),
            regex: Some(re),
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matched_len(path).is_some()
    }

    /// 매칭된 경로 앞부분의 길이. 매칭되지 않으면 `None`.
    pub fn matched_len(&self, path: &str) -> Option<usize> {
        match self.kind {
            PathMatcherKind::Exact => (self.pattern == path).then_some(path.len()),
            PathMatcherKind::Prefix => {
                if self.pattern == "/" {
                    return Some(0);
                }
                let rest = path.strip_prefix(self.pattern.as_str())?;
                (rest.is_empty() || rest.starts_with('/')).then_some(self.pattern.len())
            }
            PathMatcherKind::Regex => {
                let m = self.regex.as_ref()?.find(path)?;
                // 경로 앞부분에서 시작하는 매칭만 제거 대상으로 봅니다
                Some(if m.start() == 0 { m.end() } else { 0 })
            }
        }
    }
}

impl FromStr for PathMatcher {
    type Err = RoutingError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        if pattern.starts_with('^') {
            Self::regex(pattern)
        } else if !pattern.starts_with('/') {
            Err(RoutingError::InvalidPathPattern {
                pattern: pattern.to_string(),
                reason: "경로는 '/'로 시작해야 합니다".to_string(),
            })
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            Ok(Self::prefix(prefix))
        } else {
            Ok(Self::exact(pattern))
        }
    }
}

impl PartialEq for PathMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.pattern == other.pattern
    }
}

impl Eq for PathMatcher {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_segment_aware() {
        let matcher = PathMatcher::prefix("/api");
        assert!(matcher.matches("/api"));
        assert!(matcher.matches("/api/"));
        assert!(matcher.matches("/api/products/1"));
        assert!(!matcher.matches("/apix"));
        assert!(!matcher.matches("/"));
    }

    #[test]
    fn test_parse_notation() {
        assert_eq!("/users*".parse::<PathMatcher>().unwrap().kind, PathMatcherKind::Prefix);
        assert_eq!("/health".parse::<PathMatcher>().unwrap().kind, PathMatcherKind::Exact);
        assert_eq!("^/v[0-9]+/".parse::<PathMatcher>().unwrap().kind, PathMatcherKind::Regex);
        assert!("api".parse::<PathMatcher>().is_err());
        assert!("^(unclosed".parse::<PathMatcher>().is_err());
    }

    #[test]
    fn test_regex_matched_len() {
        let matcher = PathMatcher::regex("^/v[0-9]+").unwrap();
        assert_eq!(matcher.matched_len("/v2/items"), Some(3));
        assert_eq!(matcher.matched_len("/items"), None);
    }
}
