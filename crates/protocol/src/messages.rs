//! Wire-format message types for the engine WebSocket protocol
//!
//! One JSON document per text frame, in both directions. Every document is
//! `{header, body}`; the header's `messagePurpose` tag classifies the
//! message's role. Field names are dictated by the engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Protocol version carried in every outbound header and body.
pub const PROTOCOL_VERSION: u32 = 1;

/// Protocol-level tag classifying a message's role.
///
/// The set of inbound purposes is open (subscribed events arrive under
/// their own purposes), so unknown tags are preserved in `Other` rather
/// than failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessagePurpose {
    #[serde(rename = "commandRequest")]
    CommandRequest,
    #[serde(rename = "commandResponse")]
    CommandResponse,
    #[serde(rename = "subscribe")]
    Subscribe,
    #[serde(rename = "error")]
    Error,
    /// Any other purpose (event notifications, future message kinds)
    #[serde(untagged)]
    Other(String),
}

impl MessagePurpose {
    pub fn as_str(&self) -> &str {
        match self {
            MessagePurpose::CommandRequest => "commandRequest",
            MessagePurpose::CommandResponse => "commandResponse",
            MessagePurpose::Subscribe => "subscribe",
            MessagePurpose::Error => "error",
            MessagePurpose::Other(purpose) => purpose,
        }
    }
}

impl std::fmt::Display for MessagePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Outbound Packets (Blockline → Engine)
// =============================================================================

/// Header of an outbound packet.
///
/// `message_type` is `"commandRequest"` for every outbound purpose,
/// including subscriptions - the engine expects it that way.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketHeader {
    pub request_id: Uuid,
    pub message_purpose: MessagePurpose,
    pub version: u32,
    pub message_type: String,
}

impl PacketHeader {
    fn new(request_id: Uuid, message_purpose: MessagePurpose) -> Self {
        Self {
            request_id,
            message_purpose,
            version: PROTOCOL_VERSION,
            message_type: "commandRequest".to_string(),
        }
    }
}

/// Outbound packet, immutable once constructed.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundPacket {
    Command(CommandRequest),
    Subscribe(SubscribeRequest),
}

impl OutboundPacket {
    /// Build a slash-command request carrying the given correlation id.
    pub fn command(request_id: Uuid, command_line: impl Into<String>) -> Self {
        OutboundPacket::Command(CommandRequest {
            header: PacketHeader::new(request_id, MessagePurpose::CommandRequest),
            body: CommandRequestBody {
                origin: CommandOrigin {
                    origin_type: "player".to_string(),
                },
                command_line: command_line.into(),
                version: PROTOCOL_VERSION,
            },
        })
    }

    /// Build an event subscription request.
    pub fn subscribe(request_id: Uuid, event_name: impl Into<String>) -> Self {
        OutboundPacket::Subscribe(SubscribeRequest {
            header: PacketHeader::new(request_id, MessagePurpose::Subscribe),
            body: SubscribeBody {
                event_name: event_name.into(),
            },
        })
    }

    pub fn request_id(&self) -> Uuid {
        self.header().request_id
    }

    pub fn purpose(&self) -> &MessagePurpose {
        &self.header().message_purpose
    }

    fn header(&self) -> &PacketHeader {
        match self {
            OutboundPacket::Command(packet) => &packet.header,
            OutboundPacket::Subscribe(packet) => &packet.header,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest {
    pub header: PacketHeader,
    pub body: CommandRequestBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequestBody {
    pub origin: CommandOrigin,
    pub command_line: String,
    pub version: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandOrigin {
    #[serde(rename = "type")]
    pub origin_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscribeRequest {
    pub header: PacketHeader,
    pub body: SubscribeBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeBody {
    pub event_name: String,
}

// =============================================================================
// Inbound Messages (Engine → Blockline)
// =============================================================================

/// Malformed inbound document. Logged and dropped by the dispatcher;
/// never affects pending commands.
#[derive(Debug, thiserror::Error)]
#[error("malformed engine message: {0}")]
pub struct ParseError(#[from] serde_json::Error);

/// Inbound message, classified by purpose. Parsed fresh per frame and not
/// retained beyond dispatch.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// Response to a command this side issued, keyed by `request_id`.
    CommandResponse(CommandResponse),
    /// Engine-level failure unrelated to a specific command. Never
    /// correlated, even when the document carries a requestId.
    EngineError { status_message: String },
    /// Event notification or unrecognized purpose; carries no identity to
    /// correlate against.
    Event {
        purpose: MessagePurpose,
        body: serde_json::Value,
    },
}

/// The correlated half of a command round trip.
#[derive(Debug, Clone)]
pub struct CommandResponse {
    /// Missing on malformed engine responses; such responses can never
    /// match a waiter.
    pub request_id: Option<Uuid>,
    pub status_code: i32,
    pub status_message: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct InboundFrame {
    header: InboundHeader,
    #[serde(default)]
    body: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboundHeader {
    message_purpose: MessagePurpose,
    #[serde(default)]
    request_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    #[serde(default)]
    status_code: i32,
    #[serde(default)]
    status_message: Option<String>,
}

/// Parse one inbound text frame and classify it by purpose.
///
/// Tie-break: purpose `error` wins over any requestId the document carries;
/// correlation only ever happens for the literal `commandResponse` purpose.
pub fn classify(text: &str) -> Result<InboundMessage, ParseError> {
    let frame: InboundFrame = serde_json::from_str(text)?;
    let status: StatusBody = serde_json::from_value(frame.body.clone()).unwrap_or_default();

    Ok(match frame.header.message_purpose {
        MessagePurpose::Error => InboundMessage::EngineError {
            status_message: status.status_message.unwrap_or_default(),
        },
        MessagePurpose::CommandResponse => InboundMessage::CommandResponse(CommandResponse {
            request_id: frame.header.request_id,
            status_code: status.status_code,
            status_message: status.status_message,
            body: frame.body,
        }),
        purpose => InboundMessage::Event {
            purpose,
            body: frame.body,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_packet_matches_engine_wire_shape() {
        let request_id = Uuid::new_v4();
        let packet = OutboundPacket::command(request_id, "setblock ~ ~-1 ~ glass");

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&packet).unwrap()).unwrap();

        assert_eq!(json["header"]["requestId"], request_id.to_string());
        assert_eq!(json["header"]["messagePurpose"], "commandRequest");
        assert_eq!(json["header"]["version"], 1);
        assert_eq!(json["header"]["messageType"], "commandRequest");
        assert_eq!(json["body"]["origin"]["type"], "player");
        assert_eq!(json["body"]["commandLine"], "setblock ~ ~-1 ~ glass");
        assert_eq!(json["body"]["version"], 1);
    }

    #[test]
    fn subscribe_packet_matches_engine_wire_shape() {
        let request_id = Uuid::new_v4();
        let packet = OutboundPacket::subscribe(request_id, "PlayerMessage");

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&packet).unwrap()).unwrap();

        assert_eq!(json["header"]["requestId"], request_id.to_string());
        assert_eq!(json["header"]["messagePurpose"], "subscribe");
        assert_eq!(json["header"]["messageType"], "commandRequest");
        assert_eq!(json["body"]["eventName"], "PlayerMessage");
    }

    #[test]
    fn classifies_command_response() {
        let request_id = Uuid::new_v4();
        let text = format!(
            r#"{{"header":{{"messagePurpose":"commandResponse","requestId":"{request_id}"}},
                "body":{{"statusCode":0,"statusMessage":"ok","extra":42}}}}"#
        );

        let message = classify(&text).unwrap();
        let InboundMessage::CommandResponse(response) = message else {
            panic!("expected a command response, got {message:?}");
        };
        assert_eq!(response.request_id, Some(request_id));
        assert_eq!(response.status_code, 0);
        assert_eq!(response.status_message.as_deref(), Some("ok"));
        assert_eq!(response.body["extra"], 42);
    }

    #[test]
    fn error_purpose_wins_over_request_id() {
        // An error-shaped document carrying a requestId is still an engine
        // error: the purpose literal decides, not the presence of an id.
        let request_id = Uuid::new_v4();
        let text = format!(
            r#"{{"header":{{"messagePurpose":"error","requestId":"{request_id}"}},
                "body":{{"statusMessage":"out of cheese"}}}}"#
        );

        let message = classify(&text).unwrap();
        assert!(matches!(
            message,
            InboundMessage::EngineError { ref status_message } if status_message == "out of cheese"
        ));
    }

    #[test]
    fn unknown_purpose_classifies_as_event() {
        let text = r#"{"header":{"messagePurpose":"PlayerMessage"},
                       "body":{"sender":"Steve","message":"hi"}}"#;

        let message = classify(text).unwrap();
        let InboundMessage::Event { purpose, body } = message else {
            panic!("expected an event, got {message:?}");
        };
        assert_eq!(purpose, MessagePurpose::Other("PlayerMessage".to_string()));
        assert_eq!(body["sender"], "Steve");
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        assert!(classify("not json at all").is_err());
        assert!(classify(r#"{"body":{}}"#).is_err());
    }

    #[test]
    fn response_without_request_id_still_classifies() {
        let text = r#"{"header":{"messagePurpose":"commandResponse"},
                       "body":{"statusCode":0}}"#;

        let message = classify(text).unwrap();
        let InboundMessage::CommandResponse(response) = message else {
            panic!("expected a command response, got {message:?}");
        };
        assert_eq!(response.request_id, None);
    }
}
