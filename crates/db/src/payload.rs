//! Change-notification payload parsing (§4.4, §6).
//!
//! Payloads are JSON objects carrying at least `operation` and `id`.
//! `operation` is one of INSERT, UPDATE, DELETE, RELOAD, RELOAD_ALL;
//! anything else is ignored rather than treated as an error (§6: "unrecognized
//! operations are ignored").

use serde::Deserialize;
use serde_json::Value;

use crate::error::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
    Reload,
    ReloadAll,
}

impl Operation {
    /// Lowercase label for metrics (§10.1 `warden_handler_dispatch_total`).
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Reload => "reload",
            Self::ReloadAll => "reload_all",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            "RELOAD" => Some(Self::Reload),
            "RELOAD_ALL" => Some(Self::ReloadAll),
            _ => None,
        }
    }
}

/// A parsed change notification: which operation, and which row (absent for
/// `RELOAD_ALL`, which targets every profile).
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub operation: Operation,
    pub id: Option<i64>,
    /// The raw JSON payload, kept around for fields handlers need beyond
    /// `operation`/`id` (e.g. rule `scope`/`scope_value` on cheap paths that
    /// don't want to re-fetch). Handlers are still expected to re-fetch the
    /// authoritative row rather than trust this blindly (§4.5).
    pub raw: Value,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    operation: String,
    #[serde(default)]
    id: Option<i64>,
}

/// Parse one NOTIFY payload. Returns `Ok(None)` for a syntactically valid
/// payload whose `operation` is unrecognized (dropped silently per §6), and
/// `Err(InvalidPayload)` for payloads that don't even parse as the expected
/// envelope (§7 InvalidPayload: "logged and dropped; no state change" — the
/// caller is responsible for the logging and the dropping, this just reports
/// which case it is).
pub fn parse(payload: &str) -> Result<Option<ChangeEvent>, DbError> {
    let raw: Value = serde_json::from_str(payload)
        .map_err(|e| DbError::InvalidPayload(format!("not valid JSON: {e}")))?;

    let envelope: RawEnvelope = serde_json::from_value(raw.clone())
        .map_err(|e| DbError::InvalidPayload(format!("missing required field: {e}")))?;

    let Some(operation) = Operation::parse(&envelope.operation) else {
        return Ok(None);
    };

    if operation != Operation::ReloadAll && envelope.id.is_none() {
        return Err(DbError::InvalidPayload(format!(
            "operation {} requires an id",
            envelope.operation
        )));
    }

    Ok(Some(ChangeEvent {
        operation,
        id: envelope.id,
        raw,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_insert() {
        let event = parse(r#"{"operation":"INSERT","id":7}"#).unwrap().unwrap();
        assert_eq!(event.operation, Operation::Insert);
        assert_eq!(event.id, Some(7));
    }

    #[test]
    fn parses_reload_all_without_id() {
        let event = parse(r#"{"operation":"RELOAD_ALL"}"#).unwrap().unwrap();
        assert_eq!(event.operation, Operation::ReloadAll);
        assert_eq!(event.id, None);
    }

    #[test]
    fn unrecognized_operation_is_dropped_not_errored() {
        let result = parse(r#"{"operation":"TRUNCATE","id":1}"#).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn malformed_json_is_invalid_payload() {
        let err = parse("not json").unwrap_err();
        assert!(matches!(err, DbError::InvalidPayload(_)));
    }

    #[test]
    fn missing_operation_is_invalid_payload() {
        let err = parse(r#"{"id":1}"#).unwrap_err();
        assert!(matches!(err, DbError::InvalidPayload(_)));
    }

    #[test]
    fn insert_without_id_is_invalid_payload() {
        let err = parse(r#"{"operation":"INSERT"}"#).unwrap_err();
        assert!(matches!(err, DbError::InvalidPayload(_)));
    }
}
