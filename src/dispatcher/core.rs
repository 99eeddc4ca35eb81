use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::RuntimeConfig;
use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::router::{ParamVec, RouteMatch};

/// Maximum inline headers/cookies before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header/cookie storage.
///
/// Header names repeat across requests (`content-type`, `origin`, ...), so they
/// are `Arc<str>`; values are per-request data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request data passed to a handler coroutine.
///
/// Carries everything extracted from the HTTP request plus the reply channel
/// the handler must answer on.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request id for log correlation
    pub request_id: RequestId,
    pub method: Method,
    /// Matched route pattern (e.g. `/movies/{id}`)
    pub path: String,
    pub handler_name: String,
    pub path_params: ParamVec,
    pub query_params: ParamVec,
    /// HTTP headers, lowercase names
    pub headers: HeaderVec,
    /// Cookies parsed from the Cookie header
    pub cookies: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    /// Channel for sending the response back to the dispatcher
    pub reply_tx: mpsc::Sender<HandlerResponse>,
}

impl HandlerRequest {
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

    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a cookie by name.
    #[inline]
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Response data sent back from a handler coroutine.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with the default content type.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// `{"error": message}` response.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// `{"message": message}` response, the shape the movie API uses for
    /// not-found and deleted confirmations.
    #[must_use]
    pub fn message(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "message": message }))
    }

    /// Get a header by name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Channel sender that delivers requests to a handler coroutine.
pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Dispatcher that routes matched requests to registered handler coroutines.
#[derive(Clone, Default)]
pub struct Dispatcher {
    /// Map of handler names to their channel senders
    pub handlers: HashMap<String, HandlerSender>,
    /// Ordered middleware applied around every dispatch
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    /// Create an empty dispatcher; handlers are registered afterwards.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append middleware. Order of addition is execution order for `before`;
    /// `after` hooks run in the same order.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Register a handler coroutine under the given name.
    ///
    /// Spawns a coroutine that drains the handler's channel. Panics inside the
    /// handler are caught and converted to 500 responses. Registering a name
    /// twice replaces the old handler; dropping its sender closes the channel
    /// and lets the old coroutine exit.
    ///
    /// # Safety
    ///
    /// `may::coroutine::Builder::spawn` is unsafe in the `may` runtime. The
    /// caller must ensure the May runtime is initialized before registration
    /// and that handlers send exactly one response per request.
    pub unsafe fn register_handler<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(HandlerRequest) + Send + 'static + Clone,
    {
        let name = name.to_string();
        let (tx, rx) = mpsc::channel::<HandlerRequest>();

        if let Some(old_sender) = self.handlers.remove(&name) {
            drop(old_sender);
            warn!(handler_name = %name, "replaced existing handler, old coroutine will exit");
        }

        let stack_size = RuntimeConfig::from_env().stack_size;
        let handler_name_for_logging = name.clone();

        // SAFETY: spawn is unsafe per the may runtime; we only register during
        // startup, the closure is Send + 'static, and errors flow through the
        // reply channel rather than panics.
        let spawn_result = unsafe {
            coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || {
                    debug!(
                        handler_name = %handler_name_for_logging,
                        stack_size = stack_size,
                        "handler coroutine start"
                    );

                    for req in rx.iter() {
                        let reply_tx = req.reply_tx.clone();
                        let handler_name = req.handler_name.clone();
                        let request_id = req.request_id;
                        let execution_start = Instant::now();

                        if let Err(panic) =
                            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                                handler_fn(req);
                            }))
                        {
                            error!(
                                request_id = %request_id,
                                handler_name = %handler_name,
                                panic_message = ?panic,
                                "handler panicked"
                            );
                            let _ = reply_tx.send(HandlerResponse::error(
                                500,
                                "Internal Server Error",
                            ));
                        } else {
                            debug!(
                                request_id = %request_id,
                                handler_name = %handler_name,
                                execution_time_ms = execution_start.elapsed().as_millis() as u64,
                                "handler execution complete"
                            );
                        }
                    }
                })
        };

        if let Err(e) = spawn_result {
            error!(
                handler_name = %name,
                error = %e,
                stack_size = stack_size,
                "failed to spawn handler coroutine"
            );
            return;
        }

        info!(
            handler_name = %name,
            total_handlers = self.handlers.len() + 1,
            "handler registered"
        );
        self.handlers.insert(name, tx);
    }

    /// Dispatch a request to the handler named by the route match.
    ///
    /// Runs middleware `before` hooks (the first to answer short-circuits the
    /// handler), sends the request over the handler's channel, waits for the
    /// reply, then runs `after` hooks on the response.
    ///
    /// Returns `None` if no handler is registered for the route.
    #[must_use]
    pub fn dispatch(
        &self,
        route_match: RouteMatch,
        body: Option<Value>,
        headers: HeaderVec,
        cookies: HeaderVec,
    ) -> Option<HandlerResponse> {
        let request_id = RequestId::new();
        let (reply_tx, reply_rx) = mpsc::channel();

        let tx = match self.handlers.get(&route_match.handler_name) {
            Some(tx) => tx,
            None => {
                error!(
                    handler_name = %route_match.handler_name,
                    available_handlers = ?self.handlers.keys().collect::<Vec<_>>(),
                    "handler not found"
                );
                return None;
            }
        };

        let request = HandlerRequest {
            request_id,
            method: route_match.route.method.clone(),
            path: route_match.route.path_pattern.clone(),
            handler_name: route_match.handler_name,
            path_params: route_match.path_params,
            query_params: route_match.query_params,
            headers,
            cookies,
            body,
            reply_tx,
        };

        let mut early_resp: Option<HandlerResponse> = None;
        for mw in &self.middlewares {
            if early_resp.is_none() {
                early_resp = mw.before(&request);
                if early_resp.is_some() {
                    debug!(
                        request_id = %request_id,
                        middleware_name = std::any::type_name_of_val(mw.as_ref()),
                        "middleware returned early response"
                    );
                }
            }
        }

        let (mut resp, latency) = if let Some(r) = early_resp {
            (r, Duration::from_millis(0))
        } else {
            info!(
                request_id = %request_id,
                handler_name = %request.handler_name,
                method = %request.method,
                path = %request.path,
                "request dispatched to handler"
            );
            let start = Instant::now();

            if let Err(e) = tx.send(request.clone()) {
                error!(
                    request_id = %request_id,
                    handler_name = %request.handler_name,
                    error = %e,
                    "failed to send request to handler"
                );
                return None;
            }

            match reply_rx.recv() {
                Ok(response) => {
                    info!(
                        request_id = %request_id,
                        handler_name = %request.handler_name,
                        latency_ms = start.elapsed().as_millis() as u64,
                        status = response.status,
                        "handler response received"
                    );
                    (response, start.elapsed())
                }
                Err(e) => {
                    error!(
                        request_id = %request_id,
                        handler_name = %request.handler_name,
                        error = %e,
                        "handler channel closed, handler may have crashed"
                    );
                    return Some(HandlerResponse::error(
                        503,
                        "handler is not responding",
                    ));
                }
            }
        };

        for mw in &self.middlewares {
            mw.after(&request, &mut resp, latency);
        }

        Some(resp)
    }
}
