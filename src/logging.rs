//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// The number of bytes of a body logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level with any
/// `password` fields in JSON bodies redacted. If a body is longer than
/// [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated and the full body is logged
/// at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let Some(body_text) = read_body(body).await else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    log_request(&parts, &redact_password(&body_text, "password"));

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let Some(body_text) = read_body(body).await else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    log_response(&parts, &body_text);

    Response::from_parts(parts, body_text.into())
}

async fn read_body(body: Body) -> Option<String> {
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).to_string()),
        Err(error) => {
            tracing::error!("Could not read body: {error}");
            None
        }
    }
}

/// Replace the value of every `field_name` key in a JSON body with asterisks.
///
/// Bodies that are not JSON are returned unchanged.
fn redact_password(body_text: &str, field_name: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_owned();
    };

    if redact_field(&mut value, field_name) {
        value.to_string()
    } else {
        body_text.to_owned()
    }
}

fn redact_field(value: &mut Value, field_name: &str) -> bool {
    match value {
        Value::Object(map) => {
            let mut redacted = false;

            for (key, value) in map.iter_mut() {
                if key == field_name {
                    *value = Value::String(REDACTED.to_owned());
                    redacted = true;
                } else {
                    redacted |= redact_field(value, field_name);
                }
            }

            redacted
        }
        Value::Array(values) => values
            .iter_mut()
            .fold(false, |redacted, value| redact_field(value, field_name) | redacted),
        _ => false,
    }
}

/// The longest prefix of `text` that fits in [LOG_BODY_LENGTH_LIMIT] bytes
/// without splitting a character.
fn truncate(text: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(text.len());

    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {:}...",
            parts.method,
            parts.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {:}...",
            parts.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}

#[cfg(test)]
mod tests {
    use super::{LOG_BODY_LENGTH_LIMIT, redact_password, truncate};

    #[test]
    fn redacts_top_level_password() {
        let body = r#"{"email":"john@mail.com","password":"changeme"}"#;

        let got = redact_password(body, "password");

        assert!(!got.contains("changeme"));
        assert!(got.contains("john@mail.com"));
        assert!(got.contains(r#""password":"********""#));
    }

    #[test]
    fn redacts_nested_password() {
        let body = r#"{"user":{"name":"Maria","password":"12345"}}"#;

        let got = redact_password(body, "password");

        assert!(!got.contains("12345"));
    }

    #[test]
    fn leaves_other_bodies_alone() {
        assert_eq!(redact_password("not json", "password"), "not json");
        assert_eq!(
            redact_password(r#"{"email":"a@b"}"#, "password"),
            r#"{"email":"a@b"}"#
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "é".repeat(LOG_BODY_LENGTH_LIMIT);

        let got = truncate(&text);

        assert!(got.len() <= LOG_BODY_LENGTH_LIMIT);
        assert_eq!(got.chars().count(), LOG_BODY_LENGTH_LIMIT / 2);
    }
}
