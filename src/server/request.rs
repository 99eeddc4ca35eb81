use std::io::Read;
use std::sync::Arc;

use may_minihttp::Request;
use tracing::debug;

use crate::dispatcher::HeaderVec;
use crate::router::ParamVec;

/// Body of a parsed request.
///
/// Distinguishes "no body at all" from "a body that is not valid JSON": an
/// absent body on PATCH is an empty patch, a malformed one is a client error.
#[derive(Debug)]
pub enum RequestBody {
    /// No payload bytes
    Absent,
    /// Payload present but not parseable as JSON
    Invalid,
    /// Parsed JSON payload
    Json(serde_json::Value),
}

impl RequestBody {
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, RequestBody::Invalid)
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            RequestBody::Json(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            RequestBody::Json(v) => Some(v),
            _ => None,
        }
    }
}

/// Parsed HTTP request data used by `AppService`.
#[derive(Debug)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, ...), as received
    pub method: String,
    /// Request path with the query string stripped
    pub path: String,
    /// HTTP headers, lowercase names
    pub headers: HeaderVec,
    /// Cookies from the Cookie header
    pub cookies: HeaderVec,
    /// Decoded query string parameters
    pub query_params: ParamVec,
    /// Request body, when any payload bytes were sent
    pub body: RequestBody,
}

impl ParsedRequest {
    /// Look up a header by name (case-insensitive per RFC 7230).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Split a Cookie header value into name/value pairs.
pub fn parse_cookies(headers: &HeaderVec) -> HeaderVec {
    let Some(cookie_header) = headers
        .iter()
        .find(|(k, _)| k.as_ref() == "cookie")
        .map(|(_, v)| v.as_str())
    else {
        return HeaderVec::new();
    };
    cookie_header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            let value = parts.next().unwrap_or("").trim();
            Some((Arc::from(name), value.to_string()))
        })
        .collect()
}

/// Decode the query string portion of a request path.
///
/// Everything after `?` is percent-decoded with `+` treated as space.
pub fn parse_query_params(path: &str) -> ParamVec {
    let Some(pos) = path.find('?') else {
        return ParamVec::new();
    };
    url::form_urlencoded::parse(path[pos + 1..].as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.to_string()))
        .collect()
}

/// Extract method, path, headers, cookies, query parameters, and JSON body
/// from a raw `may_minihttp` request.
///
/// A body that is present but not valid JSON parses to
/// [`RequestBody::Invalid`]; routes that accept a body answer it with 400.
pub fn parse_request(req: Request) -> ParsedRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::from(h.name.to_ascii_lowercase().as_str()),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let cookies = parse_cookies(&headers);
    let query_params = parse_query_params(&raw_path);

    let body = {
        let mut body_str = String::new();
        match req.body().read_to_string(&mut body_str) {
            Ok(size) if size > 0 => match serde_json::from_str(&body_str) {
                Ok(json) => RequestBody::Json(json),
                Err(e) => {
                    debug!(error = %e, body_size = size, "request body is not valid JSON");
                    RequestBody::Invalid
                }
            },
            _ => RequestBody::Absent,
        }
    };

    debug!(
        method = %method,
        path = %path,
        header_count = headers.len(),
        query_param_count = query_params.len(),
        has_body = body.as_json().is_some(),
        "HTTP request parsed"
    );

    ParsedRequest {
        method,
        path,
        headers,
        cookies,
        query_params,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_of(pairs: &[(&str, &str)]) -> HeaderVec {
        pairs
            .iter()
            .map(|(k, v)| (Arc::from(*k), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_cookies() {
        let h = headers_of(&[("cookie", "a=b; c=d")]);
        let cookies = parse_cookies(&h);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|(k, v)| k.as_ref() == "a" && v == "b"));
        assert!(cookies.iter().any(|(k, v)| k.as_ref() == "c" && v == "d"));
    }

    #[test]
    fn test_parse_cookies_absent() {
        let h = headers_of(&[("host", "localhost")]);
        assert!(parse_cookies(&h).is_empty());
    }

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("/movies?genre=Drama&x=1");
        assert!(q.iter().any(|(k, v)| k.as_ref() == "genre" && v == "Drama"));
        assert!(q.iter().any(|(k, v)| k.as_ref() == "x" && v == "1"));
    }

    #[test]
    fn test_parse_query_params_decodes_percent_escapes() {
        let q = parse_query_params("/movies?genre=Sci%2DFi&title=The+Matrix");
        assert!(q.iter().any(|(k, v)| k.as_ref() == "genre" && v == "Sci-Fi"));
        assert!(q
            .iter()
            .any(|(k, v)| k.as_ref() == "title" && v == "The Matrix"));
    }

    #[test]
    fn test_parse_query_params_no_query() {
        assert!(parse_query_params("/movies").is_empty());
    }

    #[test]
    fn test_request_body_states() {
        assert!(RequestBody::Invalid.is_invalid());
        assert!(RequestBody::Absent.as_json().is_none());
        assert!(RequestBody::Invalid.into_json().is_none());
        let body = RequestBody::Json(serde_json::json!({ "rate": 7 }));
        assert_eq!(body.as_json().unwrap()["rate"], 7);
    }
}
