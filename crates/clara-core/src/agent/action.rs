//! Follow-up action detection on the final reply.
//!
//! A keyword heuristic over the reply text. "add to cart" wins over
//! checkout when both appear.

use serde_json::json;

use clara_types::sales::ActionType;

use crate::agent::retrieval::Candidate;

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedAction {
    pub action_type: ActionType,
    pub data: serde_json::Value,
}

pub fn derive_action(
    reply: &str,
    candidates: &[Candidate],
    user_id: Option<i64>,
) -> Option<SuggestedAction> {
    let lowered = reply.to_lowercase();

    if lowered.contains("add to cart") {
        let data = match first_named_candidate(&lowered, candidates) {
            Some(product_id) => json!({ "product_id": product_id, "quantity": 1 }),
            None => json!({ "quantity": 1 }),
        };
        return Some(SuggestedAction {
            action_type: ActionType::AddToCart,
            data,
        });
    }

    if lowered.contains("checkout") || lowered.contains("complete purchase") {
        return Some(SuggestedAction {
            action_type: ActionType::Checkout,
            data: json!({ "user_id": user_id }),
        });
    }

    None
}

/// The candidate whose name appears earliest in the reply.
fn first_named_candidate(lowered_reply: &str, candidates: &[Candidate]) -> Option<i64> {
    candidates
        .iter()
        .filter_map(|c| {
            lowered_reply
                .find(&c.product.name.to_lowercase())
                .map(|pos| (pos, c.product.id))
        })
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, id)| id)
}
