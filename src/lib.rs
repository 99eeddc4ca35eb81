//! # cinevault
//!
//! A small HTTP resource server for a single in-memory movie collection, built on
//! the `may` coroutine runtime and `may_minihttp`.
//!
//! The service exposes create/read/update/delete operations over `/movies`:
//!
//! - `GET /movies` — list the collection, optionally filtered by `?genre=`
//! - `GET /movies/{id}` — fetch one record by id
//! - `POST /movies` — create a record (schema-validated body)
//! - `PATCH /movies/{id}` — merge a partial update (schema-validated body)
//! - `DELETE /movies/{id}` — remove a record
//!
//! ## Architecture
//!
//! - **[`router`]** — regex-compiled verb+path matching with path parameter
//!   extraction
//! - **[`dispatcher`]** — coroutine-per-handler dispatch with panic recovery and
//!   a pluggable middleware chain
//! - **[`server`]** — `may_minihttp` service: request parsing, CORS preflight,
//!   request body validation, response writing
//! - **[`middleware`]** — CORS gate and per-request tracing
//! - **[`store`]** — the in-memory movie collection (ordered `Vec`, linear scans)
//! - **[`validator`]** — JSON Schema validation for create/patch payloads
//!
//! Request flow: parse → CORS check → route dispatch → (writes) schema
//! validation → store read/mutate → JSON response.

pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod ids;
pub mod middleware;
pub mod registry;
pub mod router;
pub mod routes;
pub mod server;
pub mod store;
pub mod validator;

pub use config::RuntimeConfig;
pub use routes::movie_routes;
pub use store::{Genre, Movie, MovieStore};
