mod core;
mod cors;
mod tracing;

pub use core::Middleware;
pub use cors::{CorsConfigError, CorsMiddleware, CorsMiddlewareBuilder};
pub use tracing::TracingMiddleware;
