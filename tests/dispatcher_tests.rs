//! Dispatcher behavior: handler registration, the dispatch roundtrip,
//! middleware ordering, and panic recovery.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cinevault::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
use cinevault::middleware::Middleware;
use cinevault::router::{RouteMatch, Router};
use cinevault::routes::RouteMeta;
use http::Method;
use serde_json::json;

mod common;
use common::setup_may_runtime;

fn test_route(handler_name: &str) -> RouteMeta {
    RouteMeta {
        method: Method::GET,
        path_pattern: "/test".to_string(),
        handler_name: handler_name.to_string(),
        request_body_required: false,
        request_body: None,
    }
}

fn match_for(handler_name: &str) -> RouteMatch {
    let router = Router::new(vec![test_route(handler_name)]);
    router
        .route(Method::GET, "/test")
        .expect("route should match")
}

#[test]
fn test_dispatch_roundtrip() {
    setup_may_runtime();
    let mut dispatcher = Dispatcher::new();
    unsafe {
        dispatcher.register_handler("echo", |req: HandlerRequest| {
            let body = req.body.clone().unwrap_or(json!(null));
            let _ = req.reply_tx.send(HandlerResponse::json(200, body));
        });
    }

    let res = dispatcher
        .dispatch(
            match_for("echo"),
            Some(json!({ "hello": "world" })),
            Default::default(),
            Default::default(),
        )
        .expect("handler registered");
    assert_eq!(res.status, 200);
    assert_eq!(res.body["hello"], "world");
}

#[test]
fn test_dispatch_unknown_handler_returns_none() {
    setup_may_runtime();
    let dispatcher = Dispatcher::new();
    let res = dispatcher.dispatch(
        match_for("nobody_home"),
        None,
        Default::default(),
        Default::default(),
    );
    assert!(res.is_none());
}

#[test]
fn test_panicking_handler_becomes_500() {
    setup_may_runtime();
    let mut dispatcher = Dispatcher::new();
    unsafe {
        dispatcher.register_handler("boom", |_req: HandlerRequest| {
            panic!("handler exploded");
        });
    }

    let res = dispatcher
        .dispatch(match_for("boom"), None, Default::default(), Default::default())
        .expect("panic should surface as a response");
    assert_eq!(res.status, 500);
    assert_eq!(res.body["error"], "Internal Server Error");
}

#[test]
fn test_handler_survives_panic_for_next_request() {
    setup_may_runtime();
    let mut dispatcher = Dispatcher::new();
    unsafe {
        dispatcher.register_handler("flaky", |req: HandlerRequest| {
            if req.get_query_param("boom").is_some() {
                panic!("requested failure");
            }
            let _ = req.reply_tx.send(HandlerResponse::json(200, json!("ok")));
        });
    }

    let mut boom = match_for("flaky");
    boom.query_params.push((Arc::from("boom"), "1".to_string()));
    let res = dispatcher
        .dispatch(boom, None, Default::default(), Default::default())
        .unwrap();
    assert_eq!(res.status, 500);

    let res = dispatcher
        .dispatch(match_for("flaky"), None, Default::default(), Default::default())
        .unwrap();
    assert_eq!(res.status, 200);
}

struct ShortCircuit;

impl Middleware for ShortCircuit {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        Some(HandlerResponse::error(403, "blocked"))
    }
}

#[test]
fn test_middleware_before_short_circuits_handler() {
    setup_may_runtime();
    let reached = Arc::new(AtomicUsize::new(0));
    let reached_in_handler = reached.clone();

    let mut dispatcher = Dispatcher::new();
    unsafe {
        dispatcher.register_handler("guarded", move |req: HandlerRequest| {
            reached_in_handler.fetch_add(1, Ordering::SeqCst);
            let _ = req.reply_tx.send(HandlerResponse::json(200, json!("ok")));
        });
    }
    dispatcher.add_middleware(Arc::new(ShortCircuit));

    let res = dispatcher
        .dispatch(match_for("guarded"), None, Default::default(), Default::default())
        .unwrap();
    assert_eq!(res.status, 403);
    assert_eq!(reached.load(Ordering::SeqCst), 0);
}

struct StampHeader;

impl Middleware for StampHeader {
    fn after(&self, _req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        res.set_header("x-stamped", "yes".to_string());
    }
}

#[test]
fn test_middleware_after_decorates_response() {
    setup_may_runtime();
    let mut dispatcher = Dispatcher::new();
    unsafe {
        dispatcher.register_handler("plain", |req: HandlerRequest| {
            let _ = req.reply_tx.send(HandlerResponse::json(200, json!("ok")));
        });
    }
    dispatcher.add_middleware(Arc::new(StampHeader));

    let res = dispatcher
        .dispatch(match_for("plain"), None, Default::default(), Default::default())
        .unwrap();
    assert_eq!(res.get_header("x-stamped"), Some("yes"));
}

#[test]
fn test_after_hooks_run_on_early_response() {
    setup_may_runtime();
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_middleware(Arc::new(ShortCircuit));
    dispatcher.add_middleware(Arc::new(StampHeader));
    unsafe {
        dispatcher.register_handler("never", |req: HandlerRequest| {
            let _ = req.reply_tx.send(HandlerResponse::json(200, json!("ok")));
        });
    }

    let res = dispatcher
        .dispatch(match_for("never"), None, Default::default(), Default::default())
        .unwrap();
    assert_eq!(res.status, 403);
    assert_eq!(res.get_header("x-stamped"), Some("yes"));
}
