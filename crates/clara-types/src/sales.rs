//! Request/response shapes for one sales turn.

use serde::{Deserialize, Serialize};

use crate::chat::Channel;
use crate::llm::Message;

/// One inbound customer message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRequest {
    pub message: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub channel: Channel,
    /// Client-held history, used only when the turn has no stored session.
    #[serde(default)]
    pub history: Option<Vec<Message>>,
}

impl SalesRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_id: None,
            session_id: None,
            channel: Channel::default(),
            history: None,
        }
    }
}

/// Follow-up action the client should offer after a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    AddToCart,
    Checkout,
}

/// The assistant's reply for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesResponse {
    pub reply: String,
    pub session_id: Option<String>,
    pub requires_action: bool,
    pub action_type: Option<ActionType>,
    pub action_data: Option<serde_json::Value>,
}
