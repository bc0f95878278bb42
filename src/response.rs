use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

const FALLBACK_ERROR: &str =
    r#"{"status":"error","category":"internal","body":"Internal server error"}"#;

/// The JSON envelope every gateway response is wrapped in.
///
/// `{"status":"ok","body":<payload>}` on success,
/// `{"status":"error","category":"<category>","body":"<message>"}` on failure.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'static str>,
    body: T,
}

impl<T: Serialize> Envelope<T> {
    /// Wraps a successful payload.
    pub fn ok(body: T) -> Self {
        Self {
            status: "ok",
            category: None,
            body,
        }
    }
}

impl Envelope<String> {
    /// Builds an error envelope with the given category and client-facing message.
    pub fn error(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            category: Some(category),
            body: message.into(),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        match sonic_rs::to_string(&self) {
            Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => {
                tracing::error!("❌ Envelope serialization failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "application/json")],
                    FALLBACK_ERROR,
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_carries_category() {
        let json = sonic_rs::to_string(&Envelope::error("forbidden", "nope")).unwrap();
        assert_eq!(json, r#"{"status":"error","category":"forbidden","body":"nope"}"#);
    }

    #[test]
    fn ok_envelope_omits_category() {
        let json = sonic_rs::to_string(&Envelope::ok(vec!["Moscow"])).unwrap();
        assert_eq!(json, r#"{"status":"ok","body":["Moscow"]}"#);
    }
}
