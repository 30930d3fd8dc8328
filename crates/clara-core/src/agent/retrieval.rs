//! Candidate product retrieval.
//!
//! Scores the whole catalog against the parsed preferences:
//!
//! | signal                      | weight |
//! |-----------------------------|--------|
//! | occasion matches            | +4     |
//! | price <= max                | +2     |
//! | price >= min                | +1     |
//! | any colour substring match  | +2     |
//! | in stock / out of stock     | +1 / -2|
//! | featured                    | +1     |
//!
//! With criteria present, non-positive scores are dropped. Ties break on
//! stock, highest first.

use clara_types::catalog::Product;

use crate::agent::preferences::Preferences;

/// Candidates kept after ranking.
pub const MAX_CANDIDATES: usize = 6;

/// A catalog entry with its retrieval score.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub product: Product,
    pub score: i32,
}

/// Score one product.
pub fn score_product(product: &Product, prefs: &Preferences) -> i32 {
    let mut score = 0;

    if let Some(ref occasion) = prefs.occasion {
        if product.occasion.eq_ignore_ascii_case(occasion) {
            score += 4;
        }
    }
    if let Some(max) = prefs.max_price {
        if product.price <= max {
            score += 2;
        }
    }
    if let Some(min) = prefs.min_price {
        if product.price >= min {
            score += 1;
        }
    }
    if !prefs.colors.is_empty() {
        let product_colors: Vec<String> = product.colors.iter().map(|c| c.to_lowercase()).collect();
        let hit = prefs.colors.iter().any(|wanted| {
            let wanted = wanted.to_lowercase();
            product_colors.iter().any(|c| c.contains(&wanted))
        });
        if hit {
            score += 2;
        }
    }
    score += if product.in_stock() { 1 } else { -2 };
    if product.featured {
        score += 1;
    }

    score
}

/// Rank the catalog and keep the top [`MAX_CANDIDATES`].
pub fn rank_candidates(catalog: Vec<Product>, prefs: &Preferences) -> Vec<Candidate> {
    let filter = prefs.has_criteria();
    let mut scored: Vec<Candidate> = catalog
        .into_iter()
        .map(|product| {
            let score = score_product(&product, prefs);
            Candidate { product, score }
        })
        .filter(|c| !filter || c.score > 0)
        .collect();

    // Stable sort keeps catalog order among full ties.
    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.product.stock.cmp(&a.product.stock))
    });
    scored.truncate(MAX_CANDIDATES);
    scored
}
