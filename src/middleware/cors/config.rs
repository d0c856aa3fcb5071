use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// 허용할 HTTP 메서드 목록
    #[serde(default = "default_methods")]
    pub allow_methods: Vec<String>,

    /// 허용할 헤더 목록
    #[serde(default = "default_headers")]
    pub allow_headers: Vec<String>,

    /// preflight 요청 캐시 시간 (초)
    #[serde(default)]
    pub max_age: Option<u32>,
}

fn default_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_headers() -> Vec<String> {
    ["Content-Type", "Authorization", "X-Requested-With"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_methods: default_methods(),
            allow_headers: default_headers(),
            max_age: None,
        }
    }
}

impl CorsConfig {
    pub fn methods_value(&self) -> String {
        self.allow_methods.join(",")
    }

    pub fn headers_value(&self) -> String {
        self.allow_headers.join(", ")
    }
}
