//! Static routing table for the movie API.
//!
//! Routes are defined in code; the router compiles the path patterns at
//! startup. `request_body` names the schema the server validates the payload
//! against before the handler ever runs.

use http::Method;

use crate::validator::BodySchema;

/// Metadata for a single verb+path route.
#[derive(Debug, Clone)]
pub struct RouteMeta {
    pub method: Method,
    /// Path pattern with `{param}` placeholders (e.g. `/movies/{id}`)
    pub path_pattern: String,
    /// Name the dispatcher resolves to a handler coroutine
    pub handler_name: String,
    /// When true, a missing or non-JSON body is rejected with 400 before dispatch
    pub request_body_required: bool,
    /// Schema the server validates a present body against
    pub request_body: Option<BodySchema>,
}

impl RouteMeta {
    fn new(method: Method, path_pattern: &str, handler_name: &str) -> Self {
        RouteMeta {
            method,
            path_pattern: path_pattern.to_string(),
            handler_name: handler_name.to_string(),
            request_body_required: false,
            request_body: None,
        }
    }

    fn with_body(mut self, schema: BodySchema, required: bool) -> Self {
        self.request_body = Some(schema);
        self.request_body_required = required;
        self
    }
}

/// The movie API routing table.
pub fn movie_routes() -> Vec<RouteMeta> {
    vec![
        RouteMeta::new(Method::GET, "/movies", "list_movies"),
        RouteMeta::new(Method::GET, "/movies/{id}", "get_movie"),
        RouteMeta::new(Method::POST, "/movies", "create_movie")
            .with_body(BodySchema::MovieCreate, true),
        // PATCH with no body is treated as an empty patch, so the body is optional.
        RouteMeta::new(Method::PATCH, "/movies/{id}", "update_movie")
            .with_body(BodySchema::MoviePatch, false),
        RouteMeta::new(Method::DELETE, "/movies/{id}", "delete_movie"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_all_five_operations() {
        let routes = movie_routes();
        assert_eq!(routes.len(), 5);
        assert!(routes.iter().any(|r| r.handler_name == "create_movie"
            && r.request_body_required
            && r.request_body == Some(BodySchema::MovieCreate)));
        assert!(routes.iter().any(|r| r.handler_name == "update_movie"
            && !r.request_body_required
            && r.request_body == Some(BodySchema::MoviePatch)));
    }
}
