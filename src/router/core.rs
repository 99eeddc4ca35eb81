use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::routes::RouteMeta;

/// Maximum number of path/query parameters before heap allocation.
/// The movie API has exactly one path parameter, so this never spills.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the request path.
///
/// Names come from the static route table (`Arc<str>`, cloned in O(1));
/// values are per-request data extracted from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route metadata (Arc to avoid cloning schemas per request)
    pub route: Arc<RouteMeta>,
    /// Path parameters extracted from the URL (`{id}` → `("id", "...")`)
    pub path_params: ParamVec,
    /// Name of the handler that should process this request
    pub handler_name: String,
    /// Query string parameters (populated by the server)
    pub query_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name. Last write wins for duplicate names.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name. Last write wins for duplicate names.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Router matching HTTP requests against regex-compiled path patterns.
///
/// Patterns are compiled once in [`Router::new`]; matching is a linear scan in
/// table order, O(n) in the number of routes. With five routes that is cheaper
/// than maintaining a prefix tree.
#[derive(Clone)]
pub struct Router {
    routes: Vec<(Method, Regex, Arc<RouteMeta>, Vec<Arc<str>>)>,
}

impl Router {
    /// Build a router from a routing table.
    #[must_use]
    pub fn new(routes: Vec<RouteMeta>) -> Self {
        let routes: Vec<_> = routes
            .into_iter()
            .map(|route| {
                let (regex, param_names) = Self::path_to_regex(&route.path_pattern);
                let method = route.method.clone();
                (method, regex, Arc::new(route), param_names)
            })
            .collect();

        let routes_summary: Vec<String> = routes
            .iter()
            .map(|(method, _, meta, _)| format!("{} {}", method, meta.path_pattern))
            .collect();
        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "routing table loaded"
        );

        Self { routes }
    }

    /// Match an HTTP request to a route.
    ///
    /// Returns `None` when no pattern matches, which the server turns into 404.
    #[must_use]
    pub fn route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "route match attempt");

        for (route_method, regex, meta, param_names) in &self.routes {
            if *route_method != method {
                continue;
            }
            let Some(captures) = regex.captures(path) else {
                continue;
            };

            let mut path_params = ParamVec::new();
            for (idx, name) in param_names.iter().enumerate() {
                if let Some(value) = captures.get(idx + 1) {
                    path_params.push((name.clone(), value.as_str().to_string()));
                }
            }

            info!(
                method = %method,
                path = %path,
                handler_name = %meta.handler_name,
                route_pattern = %meta.path_pattern,
                path_params = ?path_params,
                "route matched"
            );

            return Some(RouteMatch {
                route: meta.clone(),
                path_params,
                handler_name: meta.handler_name.clone(),
                query_params: ParamVec::new(),
            });
        }

        warn!(method = %method, path = %path, "no route matched");
        None
    }

    /// Convert a path pattern to a regex and extract parameter names.
    ///
    /// `/movies/{id}` becomes `^/movies/([^/]+)$` with parameter names `["id"]`.
    pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<Arc<str>>) {
        if path == "/" {
            return (
                Regex::new(r"^/$").expect("failed to compile path regex"),
                Vec::new(),
            );
        }

        let mut pattern = String::with_capacity(path.len() + 5);
        pattern.push('^');
        let mut param_names: Vec<Arc<str>> = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') {
                let name = segment.trim_start_matches('{').trim_end_matches('}');
                pattern.push_str("/([^/]+)");
                param_names.push(Arc::from(name));
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(segment);
            }
        }

        pattern.push('$');
        let regex = Regex::new(&pattern).expect("failed to compile path regex");

        (regex, param_names)
    }
}
