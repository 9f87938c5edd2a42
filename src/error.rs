use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Failures surfaced to the desktop UI.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    /// Transport, auth or HTTP-level failure reported by a data source.
    #[error("tracking service unavailable: {0}")]
    SourceUnavailable(String),

    #[error("work item {0} not found")]
    NotFound(i64),

    #[error("work item {0} update failed: no item returned")]
    UpdateFailed(i64),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl TrackerError {
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerError::SourceUnavailable(_) => "SourceUnavailable",
            TrackerError::NotFound(_) => "NotFound",
            TrackerError::UpdateFailed(_) => "UpdateFailed",
            TrackerError::InvalidInput(_) => "InvalidInput",
            TrackerError::Config(_) => "Config",
        }
    }
}

// The UI receives `{ kind, message }` in place of the payload.
impl Serialize for TrackerError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TrackerError", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_kind_and_message_for_the_ui() {
        let value = serde_json::to_value(TrackerError::NotFound(42)).unwrap();
        assert_eq!(
            value,
            json!({ "kind": "NotFound", "message": "work item 42 not found" })
        );
    }

    #[test]
    fn source_errors_keep_transport_detail() {
        let err = TrackerError::SourceUnavailable("Projects request failed (401)".to_string());
        assert_eq!(err.kind(), "SourceUnavailable");
        assert!(err.to_string().contains("401"));
    }
}
