//! SPA Gateway는 빌드된 단일 페이지 앱과 원격 백엔드 API를 하나의 origin 뒤에
//! 묶어 주는 경량 리버스 프록시입니다.
//!
//! # 주요 기능
//!
//! - `/api`, `/users` 경로의 업스트림 전달 (접두사 제거 / 유지)
//! - 호출자가 인증 헤더를 보내지 않았을 때 서비스 토큰 주입
//! - 멀티파트 업로드 본문 캡처 후 동일한 바이트로 재전송
//! - 정적 파일 서빙과 SPA fallback
//! - 업스트림 장애를 502/504 응답으로 변환
//!
//! # 라우팅 예제
//!
//! ```
//! use spa_gateway::routing::{PathMatcher, RewriteRule, Route, RouteTable};
//! use url::Url;
//!
//! let origin = Url::parse("https://backend.example.com").unwrap();
//! let mut table = RouteTable::with_defaults(&origin);
//!
//! // 정규식 재작성 라우트 추가
//! table.add_route(Route::new(
//!     "legacy",
//!     PathMatcher::prefix("/legacy"),
//!     RewriteRule::replace("^/legacy/(.*)$", "/v2/$1").unwrap(),
//!     origin.clone(),
//! ));
//!
//! let matched = table.decide(&"/api/products?page=2".parse().unwrap()).unwrap().unwrap();
//! assert_eq!(matched.route, "api");
//! assert_eq!(matched.upstream_uri, "https://backend.example.com/products?page=2");
//! ```

pub mod body;
pub mod context;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod routing;
pub mod server;
pub mod settings;
pub mod static_files;
