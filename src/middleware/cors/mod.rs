mod config;
mod middleware;

pub use config::CorsConfig;
pub use middleware::CorsMiddleware;
