//! Coroutine-based request handler dispatch.
//!
//! Each handler runs in its own `may` coroutine, consuming requests from an
//! mpsc channel and replying on a per-request channel. The dispatcher owns the
//! handler registry and the ordered middleware chain; handler panics are caught
//! and converted into 500 responses so one bad request never takes the server
//! down.

mod core;

pub use core::{
    Dispatcher, HandlerRequest, HandlerResponse, HandlerSender, HeaderVec, MAX_INLINE_HEADERS,
};
