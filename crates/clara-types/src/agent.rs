//! Agent routing types for Clara.
//!
//! `Category` is the unit the intent classifier emits and the fan-out
//! coordinator dispatches on. `UserContext` is the immutable per-turn
//! snapshot every specialist receives.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::commerce::Order;
use crate::pricing::LoyaltyTier;

/// A routing category emitted by the intent classifier.
///
/// `Sales` is the fallback category; it has no specialist and is handled
/// by the response composer alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Recommendation,
    Inventory,
    Payment,
    Fulfillment,
    Loyalty,
    Support,
    Sales,
}

impl Category {
    /// Every specialist category, in classifier table order.
    pub const SPECIALISTS: [Category; 6] = [
        Category::Recommendation,
        Category::Inventory,
        Category::Payment,
        Category::Fulfillment,
        Category::Loyalty,
        Category::Support,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Recommendation => "recommendation",
            Category::Inventory => "inventory",
            Category::Payment => "payment",
            Category::Fulfillment => "fulfillment",
            Category::Loyalty => "loyalty",
            Category::Support => "support",
            Category::Sales => "sales",
        }
    }

    /// Source tag attached to this category's specialist output.
    pub fn source_tag(&self) -> String {
        format!("{}_agent", self.as_str())
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Category::Sales)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recommendation" => Ok(Category::Recommendation),
            "inventory" => Ok(Category::Inventory),
            "payment" => Ok(Category::Payment),
            "fulfillment" => Ok(Category::Fulfillment),
            "loyalty" => Ok(Category::Loyalty),
            "support" => Ok(Category::Support),
            "sales" => Ok(Category::Sales),
            other => Err(format!("invalid category: '{other}'")),
        }
    }
}

/// The output of one specialist agent for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistOutput {
    pub source: String,
    pub content: String,
}

impl SpecialistOutput {
    pub fn new(category: Category, content: impl Into<String>) -> Self {
        Self {
            source: category.source_tag(),
            content: content.into(),
        }
    }

    /// Labeled output standing in for a failed or timed-out agent.
    pub fn failure(category: Category, message: impl fmt::Display) -> Self {
        Self::new(category, format!("{} agent error: {message}", category.as_str()))
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Style signals inferred from the user's other conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylePreferences {
    /// Colour keywords ranked by mention count, ties by first mention.
    pub colors: Vec<String>,
    pub occasion: Option<String>,
}

impl StylePreferences {
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.occasion.is_none()
    }
}

/// Per-turn snapshot of who we are talking to.
///
/// Rebuilt every turn and never cached. Every field is optional in effect:
/// an anonymous turn gets `UserContext::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<i64>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub loyalty_points: Option<i64>,
    pub past_orders: Vec<Order>,
    pub cross_channel_memory: Vec<String>,
    pub style: StylePreferences,
}

impl UserContext {
    /// Context for a user id the store does not know.
    pub fn unknown_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn first_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
    }

    pub fn tier(&self) -> LoyaltyTier {
        LoyaltyTier::from_points(self.loyalty_points.unwrap_or(0))
    }
}
