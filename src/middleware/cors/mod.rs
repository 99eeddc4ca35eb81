mod builder;
mod error;

pub use builder::CorsMiddlewareBuilder;
pub use error::CorsConfigError;

use std::sync::Arc;
use std::time::Duration;

use http::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DEFAULT_ALLOWED_ORIGINS;
use crate::dispatcher::{HandlerRequest, HandlerResponse, HeaderVec};
use crate::middleware::Middleware;

/// Origin validation strategy.
#[derive(Debug, Clone)]
pub enum OriginValidation {
    /// Exact string matching against an allow-list
    Exact(Vec<String>),
    /// Wildcard (allow all origins)
    Wildcard,
}

impl OriginValidation {
    fn is_allowed(&self, origin: &str) -> bool {
        match self {
            OriginValidation::Exact(origins) => origins.iter().any(|o| o == origin),
            OriginValidation::Wildcard => true,
        }
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, OriginValidation::Wildcard)
    }
}

/// CORS (Cross-Origin Resource Sharing) gate.
///
/// Decides which request origins receive an access-allow response header.
/// Handles preflight OPTIONS requests and adds CORS headers to responses of
/// allowed cross-origin requests.
///
/// # Policy
///
/// - Requests without an `Origin` header always pass (curl, same-process
///   clients, server-to-server calls)
/// - Same-origin requests get no CORS headers
/// - Cross-origin requests from the allow-list get `Access-Control-Allow-Origin`
///   echoing the single validated origin, plus `Vary: Origin`
/// - Everything else is answered with 403 and no CORS headers
/// - Wildcard origin cannot be combined with credentials (CORS spec requirement)
#[derive(Debug)]
pub struct CorsMiddleware {
    pub(crate) origin_validation: OriginValidation,
    pub(crate) allowed_headers: Vec<String>,
    pub(crate) allowed_methods: Vec<Method>,
    pub(crate) allow_credentials: bool,
    pub(crate) expose_headers: Vec<String>,
    pub(crate) max_age: Option<u32>,
}

impl CorsMiddleware {
    /// Create a CORS gate with an explicit configuration.
    ///
    /// `allowed_origins` containing `"*"` selects wildcard validation.
    ///
    /// # Panics
    ///
    /// Panics if `allow_credentials` is `true` with a wildcard origin. This
    /// combination violates the CORS specification; the check runs only during
    /// startup, never on the request path. Prefer [`CorsMiddlewareBuilder`],
    /// which reports the same condition as an error.
    pub fn new(
        allowed_origins: Vec<String>,
        allowed_headers: Vec<String>,
        allowed_methods: Vec<Method>,
        allow_credentials: bool,
        expose_headers: Vec<String>,
        max_age: Option<u32>,
    ) -> Self {
        let origin_validation = if allowed_origins.iter().any(|o| o == "*") {
            OriginValidation::Wildcard
        } else {
            OriginValidation::Exact(allowed_origins)
        };

        if allow_credentials && origin_validation.is_wildcard() {
            #[allow(clippy::panic)]
            panic!(
                "CORS configuration error: cannot use wildcard origin (*) with credentials; \
                specify exact origins instead"
            );
        }

        Self {
            origin_validation,
            allowed_headers,
            allowed_methods,
            allow_credentials,
            expose_headers,
            max_age,
        }
    }

    /// Permissive gate for development and tests: all origins, no credentials.
    pub fn permissive() -> Self {
        Self {
            origin_validation: OriginValidation::Wildcard,
            allowed_headers: vec!["Content-Type".into()],
            allowed_methods: default_methods(),
            allow_credentials: false,
            expose_headers: vec![],
            max_age: None,
        }
    }

    /// Validate an origin against the allow-list.
    ///
    /// Returns the origin string to place in `Access-Control-Allow-Origin`
    /// (`"*"` under wildcard, the echoed origin otherwise), or `None` when the
    /// origin is not allowed.
    pub fn validate_origin(&self, origin: &str) -> Option<String> {
        if self.origin_validation.is_allowed(origin) {
            if self.origin_validation.is_wildcard() {
                Some("*".to_string())
            } else {
                Some(origin.to_string())
            }
        } else {
            None
        }
    }

    /// Whether the gate rejects a request with these `Origin`/`Host` values.
    ///
    /// Requests without an `Origin` header and same-origin requests always
    /// pass; only a cross-origin request from outside the allow-list is
    /// rejected.
    pub fn rejects(&self, origin: Option<&str>, host: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return false;
        };
        if Self::is_same_origin(host, origin) {
            return false;
        }
        self.validate_origin(origin).is_none()
    }

    /// Add CORS headers to a response for these `Origin`/`Host` values.
    ///
    /// No-op for requests without an `Origin` header, same-origin requests,
    /// and disallowed origins (those were already rejected).
    pub fn decorate(&self, origin: Option<&str>, host: Option<&str>, res: &mut HandlerResponse) {
        let Some(origin) = origin else {
            return;
        };
        if Self::is_same_origin(host, origin) {
            debug!("CORS: same-origin request, skipping CORS headers");
            return;
        }
        let Some(validated_origin) = self.validate_origin(origin) else {
            return;
        };

        res.set_header("access-control-allow-origin", validated_origin);
        if self.allow_credentials {
            res.set_header("access-control-allow-credentials", "true".to_string());
        }
        if !self.expose_headers.is_empty() {
            res.set_header(
                "access-control-expose-headers",
                self.expose_headers.join(", "),
            );
        }
        res.set_header("vary", "Origin".to_string());
    }

    /// Whether a request is same-origin (no CORS headers needed).
    ///
    /// Compares the `Host` header with the full authority (host and port) of
    /// the `Origin` value, case-insensitively. A port mismatch is a different
    /// origin.
    fn is_same_origin(host: Option<&str>, origin: &str) -> bool {
        let Some(host) = host else {
            return false;
        };
        let Some((_scheme, authority)) = origin.split_once("://") else {
            return false;
        };
        host.eq_ignore_ascii_case(authority)
    }

    /// Answer a preflight (OPTIONS) request.
    ///
    /// - No `Origin` header: not a CORS request, plain 200
    /// - Origin not allowed, requested method/headers not allowed, or the
    ///   `Access-Control-Request-Method` header missing/invalid: 403
    /// - Otherwise 200 with the negotiated CORS headers
    pub fn preflight(
        &self,
        origin: Option<&str>,
        requested_method: Option<&str>,
        requested_headers: Option<&str>,
    ) -> HandlerResponse {
        let Some(origin) = origin else {
            return HandlerResponse::new(200, HeaderVec::new(), Value::Null);
        };

        let Some(validated_origin) = self.validate_origin(origin) else {
            warn!(origin = %origin, "CORS preflight: origin not allowed");
            return HandlerResponse::new(403, HeaderVec::new(), Value::Null);
        };

        let requested_method = match requested_method.map(|m| m.parse::<Method>()) {
            Some(Ok(m)) => m,
            _ => {
                warn!("CORS preflight: missing or invalid Access-Control-Request-Method");
                return HandlerResponse::new(403, HeaderVec::new(), Value::Null);
            }
        };
        if !self.allowed_methods.contains(&requested_method) {
            warn!(
                method = %requested_method,
                "CORS preflight: method not in allowed methods"
            );
            return HandlerResponse::new(403, HeaderVec::new(), Value::Null);
        }

        if let Some(headers_str) = requested_headers {
            let allow_all = self.allowed_headers.iter().any(|h| h == "*");
            if !allow_all {
                for header in headers_str.split(',').map(|h| h.trim()) {
                    if !self
                        .allowed_headers
                        .iter()
                        .any(|h| h.eq_ignore_ascii_case(header))
                    {
                        warn!(header = %header, "CORS preflight: header not allowed");
                        return HandlerResponse::new(403, HeaderVec::new(), Value::Null);
                    }
                }
            }
        }

        let mut headers = HeaderVec::new();
        headers.push((
            Arc::from("access-control-allow-origin"),
            validated_origin,
        ));
        headers.push((
            Arc::from("access-control-allow-methods"),
            self.allowed_methods
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ));
        headers.push((
            Arc::from("access-control-allow-headers"),
            self.allowed_headers.join(", "),
        ));
        if self.allow_credentials {
            headers.push((
                Arc::from("access-control-allow-credentials"),
                "true".to_string(),
            ));
        }
        if let Some(age) = self.max_age {
            headers.push((Arc::from("access-control-max-age"), age.to_string()));
        }
        headers.push((Arc::from("vary"), "Origin".to_string()));

        HandlerResponse::new(200, headers, Value::Null)
    }
}

fn default_methods() -> Vec<Method> {
    vec![
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ]
}

/// Default gate: the service's built-in allow-list with the movie API verbs.
impl Default for CorsMiddleware {
    fn default() -> Self {
        Self {
            origin_validation: OriginValidation::Exact(
                DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
            ),
            allowed_headers: vec!["Content-Type".into()],
            allowed_methods: default_methods(),
            allow_credentials: false,
            expose_headers: vec![],
            max_age: None,
        }
    }
}

impl Middleware for CorsMiddleware {
    /// Reject disallowed cross-origin requests before the handler runs.
    ///
    /// OPTIONS requests are answered as preflights. Requests without an
    /// `Origin` header and same-origin requests pass untouched.
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        if req.method == Method::OPTIONS {
            return Some(self.preflight(
                req.get_header("origin"),
                req.get_header("access-control-request-method"),
                req.get_header("access-control-request-headers"),
            ));
        }

        if self.rejects(req.get_header("origin"), req.get_header("host")) {
            warn!(origin = ?req.get_header("origin"), "CORS: origin not allowed");
            return Some(HandlerResponse::new(403, HeaderVec::new(), Value::Null));
        }
        None
    }

    /// Add CORS headers to responses of allowed cross-origin requests.
    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        self.decorate(req.get_header("origin"), req.get_header("host"), res);
    }
}
