//! The ping service.
//!
//! Serves one fixed string, JSON-encoded. The service is built once at startup
//! and shared read-only between all request handlers.

use std::sync::Arc;

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::Span;

use crate::error::AppError;

/// Immutable ping responder.
///
/// `span` is the diagnostic sink: errors raised while answering are logged
/// inside it, so they carry whatever fields the caller attached at construction.
#[derive(Debug, Clone)]
pub struct PingService {
    response: Arc<str>,
    span: Span,
}

impl PingService {
    pub fn new(response: impl Into<Arc<str>>, span: Span) -> Self {
        Self {
            response: response.into(),
            span,
        }
    }

    /// The raw (unencoded) response string.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Answers a ping with the configured string as a JSON string literal.
    pub fn handle(&self) -> Response {
        json_response(&*self.response, &self.span)
    }
}

/// Serializes `value` into a 200 `application/json` response.
///
/// If serialization fails the error is logged within `span` and the caller
/// gets a 500 with an empty body.
pub fn json_response<T>(value: &T, span: &Span) -> Response
where
    T: Serialize + ?Sized,
{
    match serde_json::to_vec(value) {
        Ok(body) => (
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response(),
        Err(e) => span.in_scope(|| AppError::from(e).into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use std::io;
    use std::sync::Mutex;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refusing to serialize"))
        }
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    async fn body_of(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_default_response_is_quoted_pong() {
        let service = PingService::new("PONG", Span::none());
        let response = service.handle();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = body_of(response).await;
        assert_eq!(body, b"\"PONG\"");
        assert_eq!(body.len(), 8);
    }

    #[tokio::test]
    async fn test_body_decodes_to_configured_string() {
        let samples = [
            "",
            "hello world",
            "she said \"hi\"",
            "back\\slash",
            "tab\there\nnewline",
            "\u{1}control",
            "héllo wörld",
            "日本語テキスト",
            "emoji 🏓",
        ];

        for sample in samples {
            let service = PingService::new(sample, Span::none());
            assert_eq!(service.response(), sample);

            let body = body_of(service.handle()).await;
            let decoded: String = serde_json::from_slice(&body).unwrap();
            assert_eq!(decoded, sample);
        }
    }

    #[tokio::test]
    async fn test_serialization_failure_is_empty_500() {
        let response = json_response(&Unserializable, &Span::none());

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert!(body_of(response).await.is_empty());
    }

    #[test]
    fn test_serialization_failure_is_logged_in_span() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::error_span!("ping", endpoint = "/ping");
            let _ = json_response(&Unserializable, &span);
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("refusing to serialize"), "{output}");
        assert!(output.contains("ping{endpoint=\"/ping\"}"), "{output}");
    }
}
