//! Shopping-preference extraction from free text.
//!
//! Shared vocabulary for the context builder (style inference over past
//! messages) and the composer (preferences stated in the current message).

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use clara_types::agent::StylePreferences;

/// Colour keywords we recognise, in first-seen tie-break order.
pub const COLOR_PALETTE: &[&str] = &[
    "black", "white", "blue", "navy", "red", "green", "pink", "beige", "burgundy", "gold",
    "silver", "emerald",
];

/// Occasion keyword -> normalized tag. First match in this order wins.
pub const OCCASION_KEYWORDS: &[(&str, &str)] = &[
    ("wedding", "Formal"),
    ("gala", "Formal"),
    ("prom", "Formal"),
    ("formal", "Formal"),
    ("office", "Business"),
    ("business", "Business"),
    ("casual", "Casual"),
    ("party", "Party"),
    ("date", "Date"),
];

static BUDGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:under|below|less than|upto|up to)\s*\$?(\d+(?:\.\d+)?)")
        .expect("BUDGET_RE is a compile-time constant")
});

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$?(\d+(?:\.\d+)?)\s*(?:to|-|–)\s*\$?(\d+(?:\.\d+)?)")
        .expect("RANGE_RE is a compile-time constant")
});

/// Criteria parsed from one message, used to score candidate products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub occasion: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub colors: Vec<String>,
}

impl Preferences {
    /// Parse a message, falling back to inferred style colours when the
    /// message names none.
    pub fn from_message(message: &str, style: &StylePreferences) -> Self {
        let text = message.to_lowercase();
        let mut prefs = Preferences {
            occasion: detect_occasion(&text).map(str::to_string),
            ..Preferences::default()
        };

        if let Some(amount) = BUDGET_RE
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<Decimal>().ok())
        {
            prefs.max_price = Some(amount);
        }

        if let Some(caps) = RANGE_RE.captures(&text) {
            let bounds = (
                caps.get(1).and_then(|m| m.as_str().parse::<Decimal>().ok()),
                caps.get(2).and_then(|m| m.as_str().parse::<Decimal>().ok()),
            );
            if let (Some(low), Some(high)) = bounds {
                prefs.min_price = Some(low.min(high));
                prefs.max_price = Some(low.max(high));
            }
        }

        let words = words(&text);
        prefs.colors = COLOR_PALETTE
            .iter()
            .filter(|color| words.iter().any(|w| w == *color))
            .map(|color| color.to_string())
            .collect();
        if prefs.colors.is_empty() {
            prefs.colors = style.colors.clone();
        }

        prefs
    }

    /// Whether any scoring criterion is present.
    pub fn has_criteria(&self) -> bool {
        self.occasion.is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || !self.colors.is_empty()
    }

    /// One-line human summary, e.g. `occasion Formal, up to $200, colors: black`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref occasion) = self.occasion {
            parts.push(format!("occasion {occasion}"));
        }
        match (self.min_price, self.max_price) {
            (Some(min), Some(max)) => parts.push(format!("${min} to ${max}")),
            (None, Some(max)) => parts.push(format!("up to ${max}")),
            (Some(min), None) => parts.push(format!("from ${min}")),
            (None, None) => {}
        }
        if !self.colors.is_empty() {
            parts.push(format!("colors: {}", self.colors.join(", ")));
        }
        parts.join(", ")
    }
}

/// Lowercased alphanumeric words of `text`, in order.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// First occasion keyword (in map order) present as a word in `text`.
pub fn detect_occasion(text: &str) -> Option<&'static str> {
    let words = words(text);
    OCCASION_KEYWORDS
        .iter()
        .find(|(keyword, _)| words.iter().any(|w| w == keyword))
        .map(|(_, tag)| *tag)
}

/// Rank palette colours in `texts` by mention count, ties by first mention.
pub fn rank_colors<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    // (color, count, first-seen position)
    let mut tally: Vec<(&'static str, usize, usize)> = Vec::new();
    let mut position = 0usize;

    for text in texts {
        let hits = words(text)
            .into_iter()
            .filter_map(|w| COLOR_PALETTE.iter().copied().find(|c| *c == w));

        for color in hits {
            match tally.iter_mut().find(|(c, _, _)| *c == color) {
                Some(entry) => entry.1 += 1,
                None => tally.push((color, 1, position)),
            }
            position += 1;
        }
    }

    tally.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    tally.into_iter().map(|(c, _, _)| c.to_string()).collect()
}
