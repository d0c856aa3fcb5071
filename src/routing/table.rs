use hyper::Uri;
use tracing::debug;
use url::Url;

use super::{PathMatcher, RewriteRule, RoutingError};

/// 라우트 하나: 경로 매처, 재작성 규칙, 업스트림 origin
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub matcher: PathMatcher,
    pub rewrite: RewriteRule,
    pub target: Url,
}

impl Route {
    pub fn new(name: &str, matcher: PathMatcher, rewrite: RewriteRule, target: Url) -> Self {
        Self {
            name: name.to_string(),
            matcher,
            rewrite,
            target,
        }
    }
}

/// 라우트 결정 결과
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub route: String,
    pub upstream_uri: Uri,
}

/// 순서가 있는 라우팅 테이블. 먼저 등록된 라우트가 우선합니다.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// 기본 테이블: `/api`는 접두사를 떼고, `/users`는 그대로 업스트림으로 보냅니다.
    pub fn with_defaults(origin: &Url) -> Self {
        let mut table = Self::new();
        table.add_route(Route::new("api", PathMatcher::prefix("/api"), RewriteRule::StripPrefix, origin.clone()));
        table.add_route(Route::new("users", PathMatcher::prefix("/users"), RewriteRule::Preserve, origin.clone()));
        table
    }

    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// 요청 URI에 맞는 첫 라우트를 찾아 업스트림 URI를 만듭니다.
    /// 맞는 라우트가 없으면 `Ok(None)` (정적 파일 처리 대상).
    pub fn decide(&self, uri: &Uri) -> Result<Option<RouteMatch>, RoutingError> {
        let path = uri.path();
        let Some(route) = self.routes.iter().find(|r| r.matcher.matches(path)) else {
            return Ok(None);
        };

        let rewritten = route.rewrite.apply(&route.matcher, path);
        let upstream_uri = upstream_uri(&route.target, &rewritten, uri.query())?;
        debug!(route = %route.name, %path, upstream = %upstream_uri, "라우트 결정");

        Ok(Some(RouteMatch {
            route: route.name.clone(),
            upstream_uri,
        }))
    }
}

/// origin의 base path 아래에 경로를 붙이고 원래 쿼리를 유지합니다.
pub fn upstream_uri(origin: &Url, path: &str, query: Option<&str>) -> Result<Uri, RoutingError> {
    let base = origin.path().trim_end_matches('/');
    let authority = match origin.port() {
        Some(port) => format!("{}:{}", origin.host_str().unwrap_or_default(), port),
        None => origin.host_str().unwrap_or_default().to_string(),
    };

    let mut target = format!("{}://{}{}{}", origin.scheme(), authority, base, path);
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }

    target.parse::<Uri>().map_err(|e| RoutingError::InvalidTarget {
        target,
        reason: e.to_string(),
    })
}
