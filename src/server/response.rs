use may_minihttp::Response;
use serde_json::Value;

use crate::dispatcher::HeaderVec;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Write a handler response to the wire.
///
/// Headers from the handler are written first; `Content-Type:
/// application/json` is added when the handler did not set one. A `Null` body
/// writes as an empty payload (preflight answers and 403 rejections).
pub fn write_handler_response(res: &mut Response, status: u16, body: Value, headers: &HeaderVec) {
    res.status_code(status as usize, status_reason(status));

    let mut has_content_type = false;
    for (name, value) in headers {
        if name.eq_ignore_ascii_case("content-type") {
            has_content_type = true;
        }
        // may_minihttp takes &'static str header lines; responses are
        // short-lived but header strings must outlive the write.
        let line = format!("{name}: {value}").into_boxed_str();
        res.header(Box::leak(line));
    }

    match body {
        Value::Null => {
            res.body_vec(Vec::new());
        }
        Value::String(s) => {
            if !has_content_type {
                res.header("Content-Type: text/plain");
            }
            res.body_vec(s.into_bytes());
        }
        other => {
            if !has_content_type {
                res.header("Content-Type: application/json");
            }
            res.body_vec(other.to_string().into_bytes());
        }
    }
}

/// Write a JSON error payload with the given status.
pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}
