//! System prompt builder for the sales composer.
//!
//! Sections are wrapped in XML tags, in this order:
//!
//! ```text
//! <persona>...</persona>
//! <customer>Name, loyalty tier, past orders, city</customer>
//! <channel>formatting hint</channel>
//! <cross_channel_memory>- user: ...</cross_channel_memory>
//! <turn>Inferred intent, parsed preferences</turn>
//! <cart>Items, subtotal</cart>
//! <candidate_products>- name | $price | occasion= | category= | stock=</candidate_products>
//! <specialist_outputs>[source] content</specialist_outputs>
//! <instructions>How to answer</instructions>
//! ```
//!
//! Empty sections are omitted, except `<candidate_products>`, which says
//! explicitly when nothing matched so the model does not invent products.

use std::fmt::Write;

use rust_decimal::Decimal;

use clara_types::agent::{SpecialistOutput, UserContext};
use clara_types::chat::Channel;

use crate::agent::composer::SalesIntent;
use crate::agent::context::truncate_chars;
use crate::agent::preferences::Preferences;
use crate::agent::retrieval::Candidate;

/// Candidates embedded in the prompt.
pub const PROMPT_CANDIDATES: usize = 5;
/// Specialist outputs embedded in the prompt.
pub const MAX_TOOL_OUTPUTS: usize = 4;
/// Per-output character budget.
pub const TOOL_OUTPUT_CHARS: usize = 1000;

const PERSONA: &str = "You are Clara, an elite omnichannel fashion sales strategist. \
You help customers discover outfits they love, answer questions about stock, \
delivery, payment and rewards, and guide them confidently toward checkout. \
You are warm, concise and specific.";

const INSTRUCTIONS: &str = "How to answer:\n\
1. Lead with a direct answer to the customer's latest message.\n\
2. Cite concrete products from <candidate_products> when any fit; never invent products, prices or stock.\n\
3. Use facts from <specialist_outputs> when they are relevant.\n\
4. Ask at most 1-2 clarifying questions, and only if something critical is missing.\n\
5. End with one clear next step (for example: add to cart, choose a size, or checkout).";

/// Snapshot of the customer's cart for the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub items: i64,
    pub subtotal: Decimal,
}

/// Everything the prompt is built from.
pub struct PromptInput<'a> {
    pub context: &'a UserContext,
    pub channel: Channel,
    pub intent: SalesIntent,
    pub preferences: &'a Preferences,
    pub candidates: &'a [Candidate],
    pub cart: Option<&'a CartSummary>,
    pub tool_outputs: &'a [SpecialistOutput],
}

pub struct SalesPromptBuilder;

impl SalesPromptBuilder {
    pub fn build(input: &PromptInput<'_>) -> String {
        let mut sections = Vec::with_capacity(9);

        sections.push(format!("<persona>\n{PERSONA}\n</persona>"));
        sections.push(format!("<customer>\n{}\n</customer>", customer_profile(input.context)));

        if let Some(hint) = input.channel.formatting_hint() {
            sections.push(format!("<channel>\n{} channel. {hint}\n</channel>", input.channel));
        }

        if !input.context.cross_channel_memory.is_empty() {
            let lines: Vec<String> = input
                .context
                .cross_channel_memory
                .iter()
                .map(|snippet| format!("- {snippet}"))
                .collect();
            sections.push(format!(
                "<cross_channel_memory>\nRecent messages from this customer's other conversations:\n{}\n</cross_channel_memory>",
                lines.join("\n")
            ));
        }

        let mut turn = format!("Inferred intent: {}", input.intent);
        let described = input.preferences.describe();
        if !described.is_empty() {
            let _ = write!(turn, "\nPreferences: {described}");
        }
        sections.push(format!("<turn>\n{turn}\n</turn>"));

        if let Some(cart) = input.cart {
            sections.push(format!(
                "<cart>\nItems: {}\nSubtotal: ${}\n</cart>",
                cart.items, cart.subtotal
            ));
        }

        sections.push(format!(
            "<candidate_products>\n{}\n</candidate_products>",
            candidate_lines(input.candidates)
        ));

        let outputs: Vec<String> = input
            .tool_outputs
            .iter()
            .take(MAX_TOOL_OUTPUTS)
            .map(|o| format!("[{}]\n{}", o.source, truncate_chars(o.content.trim(), TOOL_OUTPUT_CHARS)))
            .collect();
        if !outputs.is_empty() {
            sections.push(format!(
                "<specialist_outputs>\n{}\n</specialist_outputs>",
                outputs.join("\n\n")
            ));
        }

        sections.push(format!("<instructions>\n{INSTRUCTIONS}\n</instructions>"));

        sections.join("\n\n")
    }
}

fn customer_profile(context: &UserContext) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Name: {}", context.name.as_deref().unwrap_or("Guest")));
    if let Some(points) = context.loyalty_points {
        lines.push(format!("Loyalty: {} tier ({points} points)", context.tier()));
    }
    if context.user_id.is_some() {
        lines.push(format!("Past orders: {}", context.past_orders.len()));
    }
    if let Some(ref city) = context.city {
        lines.push(format!("City: {city}"));
    }
    if !context.style.colors.is_empty() {
        lines.push(format!("Favourite colors: {}", context.style.colors.join(", ")));
    }
    lines.join("\n")
}

fn candidate_lines(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "No matching products in the catalog.".to_string();
    }
    candidates
        .iter()
        .take(PROMPT_CANDIDATES)
        .map(|c| {
            format!(
                "- {} | ${} | occasion={} | category={} | stock={}",
                c.product.name, c.product.price, c.product.occasion, c.product.category, c.product.stock
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
