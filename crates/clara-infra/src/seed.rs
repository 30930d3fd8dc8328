//! Demo catalog seeding.
//!
//! The bundled catalog (`seed/catalog.json`) is compiled in. Seeding is
//! idempotent: users are matched by email, and products are only inserted
//! into an empty catalog.

use serde::Deserialize;
use tracing::{debug, info};

use clara_core::repository::Store;
use clara_types::catalog::{NewProduct, NewUser, ProductQuery};
use clara_types::error::RepositoryError;

const BUNDLED_CATALOG: &str = include_str!("../../../seed/catalog.json");

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub users: Vec<NewUser>,
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

impl SeedCatalog {
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub users_skipped: usize,
    pub products_created: usize,
    pub products_skipped: usize,
}

pub async fn seed_store<S: Store>(
    store: &S,
    catalog: &SeedCatalog,
) -> Result<SeedReport, RepositoryError> {
    let mut report = SeedReport::default();

    for user in &catalog.users {
        if store.get_user_by_email(&user.email).await?.is_some() {
            debug!(email = %user.email, "Seed user already present");
            report.users_skipped += 1;
            continue;
        }
        store.create_user(user).await?;
        report.users_created += 1;
    }

    let existing = store.search_products(&ProductQuery::default()).await?;
    if existing.is_empty() {
        for product in &catalog.products {
            store.create_product(product).await?;
            report.products_created += 1;
        }
    } else {
        report.products_skipped = catalog.products.len();
    }

    info!(
        users_created = report.users_created,
        products_created = report.products_created,
        "Seeded catalog"
    );
    Ok(report)
}
