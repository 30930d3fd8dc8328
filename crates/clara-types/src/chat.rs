//! Chat session and message types for Clara.
//!
//! A session is one conversation thread on one channel. Messages within a
//! session are append-only and ordered by their per-session `seq`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Surface the customer is talking to us through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Web,
    Mobile,
    Whatsapp,
    Telegram,
    Kiosk,
    Voice,
}

impl Channel {
    /// Formatting hint appended to the sales prompt for this channel.
    pub fn formatting_hint(&self) -> Option<&'static str> {
        match self {
            Channel::Web => None,
            Channel::Mobile => Some("Keep formatting compact for mobile."),
            Channel::Whatsapp => Some("Use crisp bullets and natural conversational style."),
            Channel::Telegram => Some("Use short paragraphs and avoid wide tables."),
            Channel::Kiosk => Some("Include in-store try-on / pickup suggestions when relevant."),
            Channel::Voice => {
                Some("Answer in short spoken sentences without markdown, bullets, or links.")
            }
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Web => write!(f, "web"),
            Channel::Mobile => write!(f, "mobile"),
            Channel::Whatsapp => write!(f, "whatsapp"),
            Channel::Telegram => write!(f, "telegram"),
            Channel::Kiosk => write!(f, "kiosk"),
            Channel::Voice => write!(f, "voice"),
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" => Ok(Channel::Web),
            "mobile" => Ok(Channel::Mobile),
            "whatsapp" => Ok(Channel::Whatsapp),
            "telegram" => Ok(Channel::Telegram),
            "kiosk" => Ok(Channel::Kiosk),
            "voice" => Ok(Channel::Voice),
            other => Err(format!("invalid channel: '{other}'")),
        }
    }
}

/// Author of a stored chat message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant', 'system', 'agent'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
    /// Output recorded on behalf of a specialist agent.
    Agent,
}

impl ChatRole {
    /// User and assistant turns; agent and system rows are bookkeeping.
    pub fn is_conversational(self) -> bool {
        matches!(self, ChatRole::User | ChatRole::Assistant)
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
            ChatRole::System => write!(f, "system"),
            ChatRole::Agent => write!(f, "agent"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            "system" => Ok(ChatRole::System),
            "agent" => Ok(ChatRole::Agent),
            other => Err(format!("invalid chat role: '{other}'")),
        }
    }
}

/// Lifecycle status of a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Closed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "closed" => Ok(SessionStatus::Closed),
            other => Err(format!("invalid session status: '{other}'")),
        }
    }
}

/// A conversation thread bound to (optionally) a user and a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// `sess_` followed by 12 lowercase hex characters.
    pub id: String,
    pub user_id: Option<i64>,
    pub channel: Channel,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Generate a fresh session id of the form `sess_<12 hex>`.
    pub fn generate_id() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("sess_{}", &hex[..12])
    }
}

/// A single message within a chat session.
///
/// `seq` starts at 1 and increases by one per appended message; it is the
/// only ordering that matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: String,
    pub seq: i64,
    pub role: ChatRole,
    pub content: String,
    /// Originating specialist agent, when `role == Agent`.
    pub agent_tag: Option<String>,
    pub created_at: DateTime<Utc>,
}
