use http::Method;

use super::{CorsConfigError, CorsMiddleware, OriginValidation};

/// Builder for [`CorsMiddleware`].
///
/// Validates the configuration at build time instead of panicking, so
/// misconfiguration surfaces as an error during startup.
///
/// ```
/// use cinevault::middleware::CorsMiddleware;
///
/// let cors = CorsMiddleware::builder()
///     .allow_origin("https://movies.com")
///     .allow_header("Content-Type")
///     .max_age(3600)
///     .build()
///     .unwrap();
/// assert!(cors.validate_origin("https://movies.com").is_some());
/// ```
#[derive(Default)]
pub struct CorsMiddlewareBuilder {
    origins: Vec<String>,
    wildcard: bool,
    headers: Vec<String>,
    methods: Vec<Method>,
    allow_credentials: bool,
    expose_headers: Vec<String>,
    max_age: Option<u32>,
}

impl CorsMiddleware {
    #[must_use]
    pub fn builder() -> CorsMiddlewareBuilder {
        CorsMiddlewareBuilder::default()
    }
}

impl CorsMiddlewareBuilder {
    /// Add one allowed origin (scheme + host + optional port).
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.origins.push(origin.into());
        self
    }

    /// Add several allowed origins.
    #[must_use]
    pub fn allow_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origins.extend(origins.into_iter().map(Into::into));
        self
    }

    /// Allow every origin. Incompatible with [`Self::allow_credentials`].
    #[must_use]
    pub fn wildcard(mut self) -> Self {
        self.wildcard = true;
        self
    }

    /// Add an allowed request header.
    #[must_use]
    pub fn allow_header(mut self, header: impl Into<String>) -> Self {
        self.headers.push(header.into());
        self
    }

    /// Add an allowed method.
    #[must_use]
    pub fn allow_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Permit credentialed requests (cookies, Authorization).
    #[must_use]
    pub fn allow_credentials(mut self) -> Self {
        self.allow_credentials = true;
        self
    }

    /// Expose a response header to browser scripts.
    #[must_use]
    pub fn expose_header(mut self, header: impl Into<String>) -> Self {
        self.expose_headers.push(header.into());
        self
    }

    /// Preflight cache lifetime in seconds.
    #[must_use]
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Finish the build, rejecting invalid combinations.
    pub fn build(self) -> Result<CorsMiddleware, CorsConfigError> {
        let origin_validation = if self.wildcard || self.origins.iter().any(|o| o == "*") {
            OriginValidation::Wildcard
        } else if self.origins.is_empty() {
            return Err(CorsConfigError::NoOrigins);
        } else {
            OriginValidation::Exact(self.origins)
        };

        if self.allow_credentials && matches!(origin_validation, OriginValidation::Wildcard) {
            return Err(CorsConfigError::WildcardWithCredentials);
        }

        let headers = if self.headers.is_empty() {
            vec!["Content-Type".to_string()]
        } else {
            self.headers
        };
        let methods = if self.methods.is_empty() {
            super::default_methods()
        } else {
            self.methods
        };

        Ok(CorsMiddleware {
            origin_validation,
            allowed_headers: headers,
            allowed_methods: methods,
            allow_credentials: self.allow_credentials,
            expose_headers: self.expose_headers,
            max_age: self.max_age,
        })
    }
}
