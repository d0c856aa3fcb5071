//! 요청 경로를 업스트림 라우트와 매칭하고 경로를 재작성합니다.

pub mod error;
pub mod matcher;
pub mod rewrite;
pub mod table;

pub use error::RoutingError;
pub use matcher::{PathMatcher, PathMatcherKind};
pub use rewrite::RewriteRule;
pub use table::{upstream_uri, Route, RouteMatch, RouteTable};
