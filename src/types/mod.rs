//! Wire types for the VK Callback API and the `messages.send` method.
//!
//! Inbound deliveries are decoded into [`Packet`]; outbound results into
//! [`ApiResponse`]. Both round-trip through `serde_json` without loss.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ── Event discriminator ─────────────────────────────────────────

/// Discriminator carried in the `type` field of every Callback API delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `message_new`: a user wrote to the community.
    MessageNew,
    /// `message_reply`: the community sent a message.
    MessageReply,
    /// `group_join`: a user joined the community.
    GroupJoin,
    /// `group_leave`: a user left the community.
    GroupLeave,
    /// `confirmation`: server address verification challenge.
    Confirmation,
    /// Any other event type, kept verbatim.
    Other(String),
}

impl EventKind {
    /// The wire name of this event kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::MessageNew => "message_new",
            Self::MessageReply => "message_reply",
            Self::GroupJoin => "group_join",
            Self::GroupLeave => "group_leave",
            Self::Confirmation => "confirmation",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        match value {
            "message_new" => Self::MessageNew,
            "message_reply" => Self::MessageReply,
            "group_join" => Self::GroupJoin,
            "group_leave" => Self::GroupLeave,
            "confirmation" => Self::Confirmation,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

// ── Inbound ─────────────────────────────────────────────────────

/// One inbound delivery from the Callback API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Event discriminator.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Event payload.
    #[serde(rename = "object", default, deserialize_with = "null_as_default")]
    pub payload: Payload,
    /// Community the event belongs to.
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_id: u64,
    /// Shared secret attached by the provider.
    #[serde(default, deserialize_with = "null_as_default")]
    pub secret: String,
}

impl Packet {
    /// Whether this delivery is the server confirmation challenge.
    pub fn is_confirmation(&self) -> bool {
        self.kind == EventKind::Confirmation
    }
}

/// Event payload (`object` field). Absent or `null` fields decode to zero values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payload {
    /// Message identifier.
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    /// Unix timestamp in seconds.
    #[serde(deserialize_with = "null_as_default")]
    pub date: i64,
    /// `1` for outgoing messages, `0` for incoming.
    #[serde(deserialize_with = "null_as_default")]
    pub out: u8,
    /// Author (or joining/leaving user) identifier.
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: i64,
    /// `1` if the message has been read.
    #[serde(deserialize_with = "null_as_default")]
    pub read_state: u8,
    /// Message title.
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    /// Message text.
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
    /// How the user joined (`group_join` only). Numeric values are kept as
    /// their decimal string.
    #[serde(deserialize_with = "string_or_number")]
    pub join_type: String,
    /// `1` if the user left on their own (`group_leave` only).
    #[serde(rename = "self", deserialize_with = "null_as_default")]
    pub self_: u8,
}

impl Payload {
    /// Message timestamp, if `date` is a valid unix time.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date, 0)
    }

    /// Whether the message was sent by the community.
    pub fn is_outgoing(&self) -> bool {
        self.out != 0
    }

    /// Whether the message has been read.
    pub fn is_read(&self) -> bool {
        self.read_state != 0
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => text,
        Some(Raw::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

// ── Outbound ────────────────────────────────────────────────────

/// Decoded body of a `messages.send` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Error reported by the API, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
    /// Identifier of the sent message on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<i64>,
}

impl ApiResponse {
    /// The embedded error, if it carries a non-empty message.
    pub fn api_error(&self) -> Option<&ApiErrorBody> {
        self.error.as_ref().filter(|e| !e.error_msg.is_empty())
    }
}

/// Structured error returned by the VK API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    /// Numeric error code.
    pub error_code: i64,
    /// Human-readable error message.
    pub error_msg: String,
    /// Request parameters echoed back by the API.
    pub request_params: Vec<serde_json::Value>,
}
