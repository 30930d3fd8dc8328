//! Inventory agent: online stock plus per-store availability.

use std::fmt::Write;

use clara_types::agent::UserContext;
use clara_types::catalog::Product;
use clara_types::error::AgentError;

use crate::repository::Store;

const STORES: &[&str] = &["NYC Flagship", "LA Boutique", "Chicago Store", "Miami Store"];
const STORE_SIZES: &[&str] = &["S", "M", "L"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoreStock {
    store: &'static str,
    quantity: i64,
    size: &'static str,
}

pub async fn handle<S: Store>(
    store: &S,
    message: &str,
    _context: &UserContext,
) -> Result<String, AgentError> {
    let Some(product_id) = extract_product_id(message) else {
        return Ok("I'd be happy to check inventory for you! \
                   Could you specify which product you're interested in?"
            .to_string());
    };

    let Some(product) = store.get_product(product_id).await? else {
        return Ok(format!(
            "I couldn't find product #{product_id}. Could you double-check the product number?"
        ));
    };

    Ok(render(&product, &store_availability(product.id)))
}

/// Short numeric token (`12`, `#12`) naming a product id.
pub fn extract_product_id(message: &str) -> Option<i64> {
    message
        .split_whitespace()
        .map(|token| {
            token
                .trim_start_matches('#')
                .trim_end_matches(|c: char| !c.is_alphanumeric())
        })
        .filter(|token| !token.is_empty() && token.len() < 4)
        .find(|token| token.chars().all(|c| c.is_ascii_digit()))
        .and_then(|token| token.parse().ok())
}

/// Stand-in for a store-systems feed, stable per product.
fn store_availability(product_id: i64) -> Vec<StoreStock> {
    let seed = product_id.unsigned_abs();
    STORES
        .iter()
        .copied()
        .enumerate()
        .map(|(i, store)| {
            let mix = seed.wrapping_mul(31).wrapping_add(i as u64 * 17);
            StoreStock {
                store,
                quantity: (mix % 6) as i64,
                size: STORE_SIZES[(mix % STORE_SIZES.len() as u64) as usize],
            }
        })
        .collect()
}

fn online_status(stock: i64) -> String {
    if stock > 10 {
        format!("Plenty in stock ({stock} units)")
    } else if stock > 0 {
        format!("Low stock ({stock} units left)")
    } else {
        "Out of stock".to_string()
    }
}

fn render(product: &Product, stores: &[StoreStock]) -> String {
    let mut out = format!("Inventory for {} (#{})\n\n", product.name, product.id);
    let _ = writeln!(out, "Online: {}", online_status(product.stock));

    out.push_str("\nIn-store availability:\n");
    for entry in stores {
        if entry.quantity > 0 {
            let _ = writeln!(
                out,
                "- {}: {} available (size {})",
                entry.store, entry.quantity, entry.size
            );
        } else {
            let _ = writeln!(out, "- {}: not available", entry.store);
        }
    }

    let any_store = stores.iter().any(|s| s.quantity > 0);
    out.push_str("\nOptions:\n");
    if product.in_stock() {
        out.push_str("- Order online for home delivery or store pickup\n");
    }
    if any_store {
        out.push_str("- Reserve in a store near you, or visit to try it on\n");
    }
    if !product.in_stock() && !any_store {
        out.push_str(
            "- I can notify you when it's back in stock, or suggest similar items\n",
        );
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[test]
    fn test_extract_product_id() {
        assert_eq!(extract_product_id("is product 12 in stock?"), Some(12));
        assert_eq!(extract_product_id("check #7 please"), Some(7));
        assert_eq!(extract_product_id("order 20260115 status"), None);
        assert_eq!(extract_product_id("do you have it in stock"), None);
    }

    #[test]
    fn test_online_status_thresholds() {
        assert_eq!(online_status(11), "Plenty in stock (11 units)");
        assert_eq!(online_status(10), "Low stock (10 units left)");
        assert_eq!(online_status(0), "Out of stock");
    }

    #[test]
    fn test_store_availability_is_stable() {
        assert_eq!(store_availability(5), store_availability(5));
        assert_eq!(store_availability(5).len(), STORES.len());
    }

    #[tokio::test]
    async fn test_asks_for_product_when_missing() {
        let store = MemoryStore::new();
        let reply = handle(&store, "is it available?", &UserContext::default())
            .await
            .unwrap();
        assert!(reply.contains("which product"));
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let store = MemoryStore::new();
        let reply = handle(&store, "stock for 99", &UserContext::default())
            .await
            .unwrap();
        assert!(reply.contains("couldn't find product #99"));
    }

    #[tokio::test]
    async fn test_reports_online_stock() {
        let store = MemoryStore::new();
        let product = store.add_product("Velvet Wrap Dress", "party", 140, 3, &["Burgundy"]);
        let reply = handle(
            &store,
            &format!("is {} available", product.id),
            &UserContext::default(),
        )
        .await
        .unwrap();
        assert!(reply.contains("Velvet Wrap Dress"));
        assert!(reply.contains("Low stock (3 units left)"));
        assert!(reply.contains("Order online"));
    }
}
