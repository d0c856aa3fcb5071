pub mod capture;
pub mod chain;
pub mod cors;
pub mod error;
pub mod response;
pub mod traits;

pub use capture::CaptureMiddleware;
pub use chain::MiddlewareChain;
pub use cors::{CorsConfig, CorsMiddleware};
pub use error::MiddlewareError;
pub use response::handle_middleware_error;
pub use traits::Middleware;
