use std::fmt;

/// Rejected CORS configurations, reported by [`super::CorsMiddlewareBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsConfigError {
    /// Wildcard origin combined with credentials. Forbidden by the CORS
    /// specification: browsers refuse `Access-Control-Allow-Origin: *`
    /// together with `Access-Control-Allow-Credentials: true`.
    WildcardWithCredentials,
    /// No origins configured and wildcard not selected.
    NoOrigins,
}

impl fmt::Display for CorsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsConfigError::WildcardWithCredentials => write!(
                f,
                "cannot use wildcard origin (*) with credentials; specify exact origins"
            ),
            CorsConfigError::NoOrigins => {
                write!(f, "no allowed origins configured; add origins or use wildcard")
            }
        }
    }
}

impl std::error::Error for CorsConfigError {}
