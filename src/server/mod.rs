//! HTTP front end: request parsing, response writing, and the service that
//! glues the router, dispatcher, and CORS gate to `may_minihttp`.

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_cookies, parse_query_params, parse_request, ParsedRequest, RequestBody};
pub use response::{write_handler_response, write_json_error};
pub use service::AppService;
