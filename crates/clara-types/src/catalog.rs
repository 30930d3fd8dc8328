//! Customer and product catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::LoyaltyTier;

/// A registered customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub city: Option<String>,
    /// Never negative; earned on settled payments, spent on redemption.
    pub loyalty_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn tier(&self) -> LoyaltyTier {
        LoyaltyTier::from_points(self.loyalty_points)
    }
}

/// Input for creating a user (seeding, tests).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub loyalty_points: i64,
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub occasion: String,
    pub price: Decimal,
    /// Never negative; decremented on order creation and floored at zero.
    pub stock: i64,
    pub material: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub featured: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Input for creating a product (seeding, tests).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub occasion: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Filter for catalog search. All present fields must match.
///
/// `category` and `occasion` compare case-insensitively; price bounds are inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub occasion: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductQuery {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.occasion.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    /// Whether `product` satisfies every present filter.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(ref category) = self.category {
            if !product.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(ref occasion) = self.occasion {
            if !product.occasion.eq_ignore_ascii_case(occasion) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(category: &str, occasion: &str, price: i64) -> Product {
        Product {
            id: 1,
            name: "Test Dress".into(),
            description: String::new(),
            category: category.into(),
            occasion: occasion.into(),
            price: Decimal::new(price, 0),
            stock: 3,
            material: None,
            sizes: vec![],
            colors: vec![],
            featured: false,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let query = ProductQuery::default();
        assert!(query.is_empty());
        assert!(query.matches(&product("evening", "formal", 10)));
    }

    #[test]
    fn test_query_is_case_insensitive_and_inclusive() {
        let query = ProductQuery {
            category: Some("Evening".into()),
            occasion: Some("FORMAL".into()),
            min_price: Some(Decimal::new(100, 0)),
            max_price: Some(Decimal::new(200, 0)),
        };
        assert!(query.matches(&product("evening", "formal", 100)));
        assert!(query.matches(&product("evening", "formal", 200)));
        assert!(!query.matches(&product("evening", "formal", 201)));
        assert!(!query.matches(&product("summer", "formal", 150)));
    }

    #[test]
    fn test_user_full_name_trims_missing_last_name() {
        let user = User {
            id: 1,
            email: "a@b.c".into(),
            first_name: "Maya".into(),
            last_name: String::new(),
            city: None,
            loyalty_points: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(user.full_name(), "Maya");
    }
}
