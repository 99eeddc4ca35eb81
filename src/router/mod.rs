//! Verb+path route matching.
//!
//! Path patterns like `/movies/{id}` are compiled to regexes once at startup;
//! matching an incoming request is a linear scan over the (small) table,
//! extracting path parameters on the way.

mod core;

pub use core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
