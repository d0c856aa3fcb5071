use regex_lite as regex;

use super::error::RoutingError;
use super::matcher::PathMatcher;

/// 업스트림으로 보내기 전 경로 재작성 규칙
#[derive(Debug, Clone)]
pub enum RewriteRule {
    /// 매처가 맞춘 앞부분을 떼어냅니다 (`/api/x` → `/x`)
    StripPrefix,
    /// 경로를 그대로 둡니다
    Preserve,
    /// 정규식 치환 (`$1` 등 캡처 그룹 참조 가능)
    Replace {
        pattern: regex::Regex,
        replacement: String,
    },
}

impl RewriteRule {
    pub fn replace(pattern: &str, replacement: &str) -> Result<Self, RoutingError> {
        let pattern = regex::Regex::new(pattern).map_err(|e| RoutingError::InvalidRewrite {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(RewriteRule::Replace {
            pattern,
            replacement: replacement.to_string(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RewriteRule::StripPrefix => "strip_prefix",
            RewriteRule::Preserve => "preserve",
            RewriteRule::Replace { .. } => "replace",
        }
    }

    /// 재작성된 경로. 결과는 항상 `/`로 시작합니다.
    pub fn apply(&self, matcher: &PathMatcher, path: &str) -> String {
        let rewritten = match self {
            RewriteRule::Preserve => path.to_string(),
            RewriteRule::StripPrefix => {
                let cut = matcher.matched_len(path).unwrap_or(0);
                path[cut..].to_string()
            }
            RewriteRule::Replace { pattern, replacement } => {
                pattern.replace(path, replacement.as_str()).into_owned()
            }
        };

        if rewritten.starts_with('/') {
            rewritten
        } else {
            format!("/{}", rewritten)
        }
    }
}
