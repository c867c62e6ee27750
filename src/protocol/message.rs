//! Protocol messages and request builders.

use std::fmt;

use serde::Serialize;
use serde_json::json;

use crate::error::Result;
use crate::protocol::command::CommandKind;

/// Payload used by requests that carry no parameters.
const EMPTY_OBJECT: &str = "{}";

/// A command kind paired with its text payload.
///
/// Built fresh for every request and every decoded reply. The payload is
/// opaque text, usually JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolMessage {
    kind: CommandKind,
    payload: String,
}

impl ProtocolMessage {
    /// Creates a message from a kind and a raw payload.
    #[must_use]
    pub fn new(kind: CommandKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Creates a message whose payload is `value` serialized as JSON.
    pub fn json<V: Serialize + ?Sized>(kind: CommandKind, value: &V) -> Result<Self> {
        Ok(Self::new(kind, serde_json::to_string(value)?))
    }

    /// Returns the command kind.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Returns the payload text.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Consumes the message, returning the payload text.
    #[must_use]
    pub fn into_payload(self) -> String {
        self.payload
    }

    // ==================== Request Builders ====================

    /// System status query.
    #[must_use]
    pub fn system_status_request() -> Self {
        Self::new(CommandKind::SystemStatus, EMPTY_OBJECT)
    }

    /// Printing status query for a print group.
    #[must_use]
    pub fn printing_status_request(group_id: i32) -> Self {
        Self::new(
            CommandKind::PrintingStatus,
            json!({ "group_id": group_id }).to_string(),
        )
    }

    /// Test information query.
    #[must_use]
    pub fn test_information_request() -> Self {
        Self::new(CommandKind::TestInformation, EMPTY_OBJECT)
    }

    /// Start printing the named template.
    #[must_use]
    pub fn start_printing_request(template_name: &str) -> Self {
        Self::new(
            CommandKind::StartPrinting,
            json!({ "template": template_name }).to_string(),
        )
    }

    /// Push dynamic content of the given content type.
    ///
    /// Payload: `{"type": <content_type>, "data": <data>}`.
    pub fn dynamic_data_request<D: Serialize + ?Sized>(content_type: &str, data: &D) -> Result<Self> {
        #[derive(Serialize)]
        struct DynamicData<'a, D: ?Sized> {
            #[serde(rename = "type")]
            content_type: &'a str,
            data: &'a D,
        }

        Self::json(
            CommandKind::SetDynamicData,
            &DynamicData { content_type, data },
        )
    }

    /// Printing cache query (recently used templates).
    #[must_use]
    pub fn printing_cache_request() -> Self {
        Self::new(CommandKind::GetPrintingCache, EMPTY_OBJECT)
    }

    /// Printing log query.
    #[must_use]
    pub fn printing_log_request() -> Self {
        Self::new(CommandKind::GetPrintingLog, EMPTY_OBJECT)
    }
}

impl fmt::Display for ProtocolMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.payload)
    }
}
