//! Recommendation agent: top catalog matches for the stated need.

use std::fmt::Write;

use clara_types::agent::UserContext;
use clara_types::catalog::{Product, ProductQuery};
use clara_types::error::AgentError;

use crate::agent::preferences::Preferences;
use crate::repository::Store;

const CATEGORY_KEYWORDS: &[&str] = &[
    "evening", "summer", "office", "casual", "formal", "wedding", "party",
];

const OCCASION_KEYWORDS: &[&str] = &[
    "wedding", "party", "business", "date", "formal", "casual", "vacation",
];

const MAX_RECOMMENDATIONS: usize = 3;

pub async fn handle<S: Store>(
    store: &S,
    message: &str,
    context: &UserContext,
) -> Result<String, AgentError> {
    let lowered = message.to_lowercase();
    let category = first_keyword(&lowered, CATEGORY_KEYWORDS);
    let occasion = first_keyword(&lowered, OCCASION_KEYWORDS);
    let max_price = Preferences::from_message(message, &context.style).max_price;

    let query = ProductQuery {
        occasion: occasion.map(str::to_string),
        max_price,
        ..ProductQuery::default()
    };
    let mut products = store.search_products(&query).await?;

    // Category keywords are loose ("evening", "summer"); prefer products that
    // mention them but keep the broader set if none do.
    if let Some(keyword) = category {
        let narrowed: Vec<Product> = products
            .iter()
            .filter(|p| mentions(p, keyword))
            .cloned()
            .collect();
        if !narrowed.is_empty() {
            products = narrowed;
        }
    }

    products.sort_by(|a, b| b.in_stock().cmp(&a.in_stock()).then(b.featured.cmp(&a.featured)));
    products.truncate(MAX_RECOMMENDATIONS);

    if products.is_empty() {
        return Ok("I couldn't find any products matching your criteria. \
                   Could you tell me more about what you're looking for?"
            .to_string());
    }

    let mut out = String::from("Based on what you're looking for, here are my recommendations:\n\n");
    for (i, product) in products.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, product.name);
        let _ = writeln!(out, "   - Price: ${}", product.price);
        let _ = writeln!(out, "   - Category: {}", product.category);
        let _ = writeln!(out, "   - Occasion: {}", product.occasion);
        if !product.colors.is_empty() {
            let _ = writeln!(out, "   - Available in: {}", product.colors.join(", "));
        }
        if product.in_stock() {
            let _ = writeln!(out, "   - In stock ({} available)", product.stock);
        } else {
            let _ = writeln!(out, "   - Currently out of stock");
        }
    }
    out.push_str(
        "\nI can show more details, check your size, or suggest accessories to go with these.",
    );
    Ok(out)
}

fn first_keyword(text: &str, keywords: &[&'static str]) -> Option<&'static str> {
    keywords.iter().copied().find(|k| text.contains(k))
}

fn mentions(product: &Product, keyword: &str) -> bool {
    [&product.category, &product.name, &product.description, &product.occasion]
        .iter()
        .any(|field| field.to_lowercase().contains(keyword))
}
