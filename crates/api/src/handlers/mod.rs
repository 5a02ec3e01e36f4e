//! Request handlers, one module per resource.

pub mod playbooks;
pub mod workflows;

use axum::{body::Bytes, Json};
use engine::EngineError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::ApiError;
use crate::permissions::{Action, ResourcePermissions};

pub(crate) const READ: ResourcePermissions = ResourcePermissions::new("playbooks", &[Action::Read]);
pub(crate) const CREATE: ResourcePermissions = ResourcePermissions::new("playbooks", &[Action::Create]);
pub(crate) const UPDATE: ResourcePermissions = ResourcePermissions::new("playbooks", &[Action::Update]);
pub(crate) const DELETE: ResourcePermissions = ResourcePermissions::new("playbooks", &[Action::Delete]);
pub(crate) const COPY: ResourcePermissions =
    ResourcePermissions::new("playbooks", &[Action::Create, Action::Read]);

/// `?source=<id>` on create turns the request into a copy of `<id>`.
#[derive(Debug, Default, Deserialize)]
pub struct SourceParams {
    pub source: Option<String>,
}

impl SourceParams {
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| !s.is_empty())
    }
}

/// Decode a JSON request body.  An empty body reads as `{}`.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, EngineError> {
    let parsed = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Object(Default::default()))
    } else {
        serde_json::from_slice(body)
    };
    parsed.map_err(|e| EngineError::InvalidInput(e.to_string()))
}

/// Decode a body the handler needs before any session is open.
///
/// Nothing settles such a request, so a rejected body is logged here.
pub(crate) fn decode_request<T: DeserializeOwned>(operation: &'static str, body: &Bytes) -> Result<T, ApiError> {
    decode_body(body).map_err(|err| {
        warn!(operation, error = %err, "Request rejected");
        ApiError::from(err)
    })
}

/// Treat an empty optional string like an absent one.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::NewPlaybook;
    use std::sync::{Arc, Mutex};

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct CaptureWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl CaptureWriter {
        fn output(&self) -> String {
            String::from_utf8_lossy(&self.buffer.lock().unwrap()).to_string()
        }
    }

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[derive(Debug, Deserialize)]
    struct Named {
        #[serde(default)]
        name: Option<String>,
    }

    #[test]
    fn empty_body_reads_as_empty_object() {
        let named: Named = decode_body(&Bytes::from_static(b"  ")).unwrap();
        assert!(named.name.is_none());
    }

    #[test]
    fn malformed_or_incomplete_body_is_invalid_input() {
        assert!(matches!(
            decode_body::<Named>(&Bytes::from_static(b"{not json")),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            decode_body::<NewPlaybook>(&Bytes::from_static(b"{}")),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejected_request_body_is_logged_with_its_operation() {
        let writer = CaptureWriter::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer.clone())
            .with_ansi(false)
            .finish();

        let decoded = tracing::subscriber::with_default(subscriber, || {
            decode_request::<NewPlaybook>("update playbook", &Bytes::from_static(b"{not json"))
        });

        assert!(matches!(decoded, Err(ApiError::InvalidInput(_))));
        let output = writer.output();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("Request rejected"), "{output}");
        assert!(output.contains("update playbook"), "{output}");
    }

    #[test]
    fn empty_source_is_ignored() {
        let params = SourceParams { source: Some(String::new()) };
        assert_eq!(params.source(), None);
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("x".into())), Some("x".into()));
    }
}
