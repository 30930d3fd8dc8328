//! Deterministic reply used when the language model is skipped or fails.
//!
//! Only ever names products from the candidate set it is given.

use std::fmt::Write;

use clara_types::agent::UserContext;

use crate::agent::preferences::Preferences;
use crate::agent::retrieval::Candidate;

/// Candidates listed in a fallback reply.
pub const FALLBACK_CANDIDATES: usize = 3;

/// Messages this short get the greeting reply.
pub const SHORT_MESSAGE_CHARS: usize = 4;

pub fn is_short_message(message: &str) -> bool {
    message.trim().chars().count() <= SHORT_MESSAGE_CHARS
}

pub fn fallback_reply(
    message: &str,
    context: &UserContext,
    preferences: &Preferences,
    candidates: &[Candidate],
) -> String {
    let name = context.first_name().unwrap_or("there");

    if is_short_message(message) {
        return format!(
            "Hi {name}! I'm Clara, your personal stylist. Tell me your occasion, budget, \
             and preferred color, and I'll pull together the best options for you."
        );
    }

    if candidates.is_empty() {
        return format!(
            "Got it, {name}. I couldn't find an exact match yet. Share your budget range \
             and preferred color, and I'll narrow it down for you."
        );
    }

    let mut out = format!("Excellent choice, {name}. ");
    let basis = preferences.describe();
    if basis.is_empty() {
        out.push_str("Here are my top picks:\n");
    } else {
        let _ = writeln!(out, "Based on your preferences ({basis}), here are my top picks:");
    }
    for candidate in candidates.iter().take(FALLBACK_CANDIDATES) {
        let product = &candidate.product;
        let _ = writeln!(
            out,
            "• {} — ${} ({}), stock: {}",
            product.name, product.price, product.occasion, product.stock
        );
    }
    out.push_str(
        "\nIf you like one, tell me the product name and quantity and I'll help you add it \
         to cart and move to checkout.",
    );
    out
}
