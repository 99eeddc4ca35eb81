use std::io;
use std::sync::Arc;

use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::{json, Value};
use tracing::warn;

use super::request::{parse_request, ParsedRequest};
use super::response::write_handler_response;
use crate::dispatcher::{Dispatcher, HandlerResponse, HeaderVec};
use crate::middleware::CorsMiddleware;
use crate::router::Router;
use crate::validator;

/// HTTP service tying together routing, CORS, validation, and dispatch.
///
/// One instance is cloned per connection by `may_minihttp`; all fields are
/// shared behind `Arc`. The CORS origin check runs before routing, so
/// disallowed origins never see routing or validation detail, and every error
/// response carries the CORS headers an allowed cross-origin caller needs to
/// read it.
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<Router>,
    pub dispatcher: Arc<Dispatcher>,
    pub cors: Arc<CorsMiddleware>,
}

impl AppService {
    #[must_use]
    pub fn new(router: Arc<Router>, dispatcher: Arc<Dispatcher>, cors: Arc<CorsMiddleware>) -> Self {
        Self {
            router,
            dispatcher,
            cors,
        }
    }

    /// Write a JSON error, decorated with CORS headers when the request came
    /// from an allowed cross-origin caller.
    fn write_error(
        &self,
        res: &mut Response,
        status: u16,
        body: Value,
        origin: Option<&str>,
        host: Option<&str>,
    ) {
        let mut hr = HandlerResponse::json(status, body);
        self.cors.decorate(origin, host, &mut hr);
        write_handler_response(res, hr.status, hr.body, &hr.headers);
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
fn health_endpoint(res: &mut Response) -> io::Result<()> {
    write_handler_response(res, 200, json!({ "status": "ok" }), &HeaderVec::new());
    Ok(())
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let ParsedRequest {
            method,
            path,
            headers,
            cookies,
            query_params,
            body,
        } = parse_request(req);

        if method == "GET" && path == "/health" {
            return health_endpoint(res);
        }

        let origin = find_header(&headers, "origin").map(str::to_string);
        let host = find_header(&headers, "host").map(str::to_string);

        // Preflights never reach the router: OPTIONS has no route of its own.
        if method == "OPTIONS" {
            let requested_method = find_header(&headers, "access-control-request-method");
            let requested_headers = find_header(&headers, "access-control-request-headers");
            let preflight =
                self.cors
                    .preflight(origin.as_deref(), requested_method, requested_headers);
            write_handler_response(res, preflight.status, preflight.body, &preflight.headers);
            return Ok(());
        }

        // Origin gate before routing: disallowed origins get a bare 403, not
        // routing or validation detail.
        if self.cors.rejects(origin.as_deref(), host.as_deref()) {
            warn!(origin = ?origin, path = %path, "CORS: origin not allowed");
            write_handler_response(res, 403, Value::Null, &HeaderVec::new());
            return Ok(());
        }

        let method: Method = match method.parse() {
            Ok(m) => m,
            Err(_) => {
                self.write_error(
                    res,
                    400,
                    json!({ "error": "Unsupported method" }),
                    origin.as_deref(),
                    host.as_deref(),
                );
                return Ok(());
            }
        };

        let Some(mut route_match) = self.router.route(method.clone(), &path) else {
            self.write_error(
                res,
                404,
                json!({ "error": "Not Found", "method": method.as_str(), "path": path }),
                origin.as_deref(),
                host.as_deref(),
            );
            return Ok(());
        };
        route_match.query_params = query_params;

        if route_match.route.request_body.is_some() && body.is_invalid() {
            self.write_error(
                res,
                400,
                json!({ "error": "Request body is not valid JSON" }),
                origin.as_deref(),
                host.as_deref(),
            );
            return Ok(());
        }

        let body = body.into_json();
        if route_match.route.request_body_required && body.is_none() {
            self.write_error(
                res,
                400,
                json!({ "error": "Request body required" }),
                origin.as_deref(),
                host.as_deref(),
            );
            return Ok(());
        }

        if let (Some(schema), Some(body_val)) = (route_match.route.request_body, &body) {
            if let Err(issues) = validator::validate_body(schema, body_val) {
                warn!(
                    path = %path,
                    issue_count = issues.len(),
                    "request body failed validation"
                );
                self.write_error(
                    res,
                    400,
                    json!({
                        "error": "Request validation failed",
                        "details": validator::issues_json(&issues),
                    }),
                    origin.as_deref(),
                    host.as_deref(),
                );
                return Ok(());
            }
        }

        match self.dispatcher.dispatch(route_match, body, headers, cookies) {
            Some(hr) => {
                write_handler_response(res, hr.status, hr.body, &hr.headers);
            }
            None => {
                self.write_error(
                    res,
                    500,
                    json!({
                        "error": "Handler failed or not registered",
                        "method": method.as_str(),
                        "path": path
                    }),
                    origin.as_deref(),
                    host.as_deref(),
                );
            }
        }
        Ok(())
    }
}

fn find_header<'a>(headers: &'a HeaderVec, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
