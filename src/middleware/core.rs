use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Hook pair applied around every dispatched request.
///
/// `before` may short-circuit with a response (the handler never runs);
/// `after` may decorate the outgoing response.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}
