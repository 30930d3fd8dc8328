//! Keyword intent classifier.
//!
//! A deterministic rule engine: a message triggers every category whose
//! phrase list it contains (case-insensitive substring match), in table
//! order, capped at [`MAX_CATEGORIES`]. No match yields `[Sales]`.

use clara_types::agent::Category;

/// Upper bound on categories per message, which bounds fan-out cost.
pub const MAX_CATEGORIES: usize = 3;

/// Category -> trigger phrases, in declaration (and tie-break) order.
const TRIGGERS: &[(Category, &[&str])] = &[
    (
        Category::Recommendation,
        &["recommend", "suggest", "find", "looking for", "style"],
    ),
    (
        Category::Inventory,
        &["stock", "available", "in stock", "inventory", "size availability"],
    ),
    (
        Category::Payment,
        &["pay", "payment", "checkout", "buy", "purchase", "price total"],
    ),
    (
        Category::Fulfillment,
        &["delivery", "ship", "pickup", "arrive", "track", "shipping"],
    ),
    (
        Category::Loyalty,
        &["discount", "coupon", "promo", "loyalty", "points", "offer"],
    ),
    (
        Category::Support,
        &["return", "exchange", "refund", "issue", "problem", "damaged"],
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a message into 1..=3 categories.
    pub fn classify(&self, message: &str) -> Vec<Category> {
        let lowered = message.to_lowercase();
        let mut categories: Vec<Category> = TRIGGERS
            .iter()
            .filter(|(_, phrases)| phrases.iter().any(|p| lowered.contains(p)))
            .map(|(category, _)| *category)
            .take(MAX_CATEGORIES)
            .collect();

        if categories.is_empty() {
            categories.push(Category::Sales);
        }
        categories
    }
}
