//! Request middleware: request ids and JSON body parsing.
//!
//! `request_id_layer` wraps every request in a tracing span keyed by a request
//! id, so all logs for one request can be correlated. `json_body_layer` parses
//! JSON request bodies before handlers run and rejects malformed ones.

use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::JSON_BODY_LIMIT;
use crate::error::AppError;

/// Header carrying the request id, read from requests and echoed on responses.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Parsed JSON request body stored in request extensions.
#[derive(Clone, Debug, PartialEq)]
pub struct JsonBody(pub Value);

/// Middleware that assigns a request id and creates a request span.
///
/// An incoming `x-request-id` header is reused; otherwise a UUID v4 is
/// generated. This should be the outermost layer so the span covers
/// every other middleware.
pub async fn request_id_layer(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::debug_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let start = Instant::now();
        let mut response = next.run(request).await;

        tracing::debug!(
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(X_REQUEST_ID.clone(), value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Middleware that parses `application/json` request bodies.
///
/// Only UTF-8 bodies are accepted; any other declared charset is answered
/// with 415. Bodies are buffered up to `JSON_BODY_LIMIT` bytes. An empty body parses to
/// an empty object. Only objects and arrays are accepted at the top level.
/// The parsed value lands in request extensions as `JsonBody`, and the
/// original bytes are handed on to the handler.
pub async fn json_body_layer(request: Request, next: Next) -> Result<Response, AppError> {
    if !is_json_content_type(request.headers()) {
        return Ok(next.run(request).await);
    }

    if let Some(charset) = declared_charset(request.headers()) {
        if !charset.eq_ignore_ascii_case("utf-8") {
            return Err(AppError::UnsupportedCharset(charset));
        }
    }

    let (mut parts, body) = request.into_parts();

    let bytes = match Limited::new(body, JSON_BODY_LIMIT).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.is::<LengthLimitError>() => {
            return Err(AppError::PayloadTooLarge {
                limit: JSON_BODY_LIMIT,
            })
        }
        Err(err) => return Err(AppError::BodyRead(err.to_string())),
    };

    let value = parse_json_body(&bytes)?;
    parts.extensions.insert(JsonBody(value));

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Parse a buffered JSON body in strict mode.
pub fn parse_json_body(bytes: &[u8]) -> Result<Value, AppError> {
    if bytes.is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| AppError::MalformedJson(e.to_string()))?;

    match value {
        Value::Object(_) | Value::Array(_) => Ok(value),
        _ => Err(AppError::MalformedJson(
            "top-level value must be an object or array".to_string(),
        )),
    }
}

/// Whether the request declares a JSON body (`application/json`, any parameters).
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

/// The `charset` parameter of the Content-Type header, unquoted.
pub fn declared_charset(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn json_content_type_detection() {
        assert!(is_json_content_type(&headers_with("application/json")));
        assert!(is_json_content_type(&headers_with(
            "Application/JSON; charset=utf-8"
        )));
        assert!(!is_json_content_type(&headers_with("text/plain")));
        assert!(!is_json_content_type(&headers_with("application/jsonp")));
        assert!(!is_json_content_type(&HeaderMap::new()));
    }

    #[test]
    fn charset_parameter_is_extracted() {
        assert_eq!(
            declared_charset(&headers_with("application/json; Charset=\"UTF-8\"")),
            Some("UTF-8".to_string())
        );
        assert_eq!(
            declared_charset(&headers_with("application/json;charset=latin1")),
            Some("latin1".to_string())
        );
        assert_eq!(declared_charset(&headers_with("application/json")), None);
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert_eq!(parse_json_body(b"").unwrap(), serde_json::json!({}));
    }

    #[test]
    fn truncated_json_is_rejected() {
        let err = parse_json_body(br#"{"a":1"#).unwrap_err();
        assert!(matches!(err, AppError::MalformedJson(_)));
    }

    #[test]
    fn scalars_are_rejected_at_top_level() {
        for body in [&b"123"[..], &b"\"text\""[..], &b"null"[..], &b"true"[..]] {
            assert!(parse_json_body(body).is_err());
        }
    }

    #[test]
    fn objects_and_arrays_parse() {
        assert_eq!(
            parse_json_body(br#"{"a":[1,2]}"#).unwrap(),
            serde_json::json!({"a": [1, 2]})
        );
        assert_eq!(parse_json_body(b"[]").unwrap(), serde_json::json!([]));
    }
}
