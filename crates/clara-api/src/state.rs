//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! The orchestrator and checkout service are generic over the store trait;
//! AppState pins them to the SQLite adapter.

use std::path::PathBuf;
use std::sync::Arc;

use clara_core::agent::orchestrator::Orchestrator;
use clara_core::commerce::checkout::CheckoutService;
use clara_core::commerce::payment::SimulatedGateway;
use clara_infra::config::{api_key_from_env, data_dir, load_config};
use clara_infra::llm::create_provider;
use clara_infra::sqlite::pool::{database_url, DatabasePool};
use clara_infra::sqlite::store::SqliteStore;
use clara_types::config::AssistantConfig;

pub type ConcreteOrchestrator = Orchestrator<SqliteStore>;

pub type ConcreteCheckoutService = CheckoutService<SqliteStore, SimulatedGateway>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub checkout: Arc<ConcreteCheckoutService>,
    pub store: Arc<SqliteStore>,
    pub config: AssistantConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        Self::build(data_dir, config, api_key_from_env().is_some()).await
    }

    /// Wire services against `data_dir`.
    ///
    /// When `with_llm` is false (or no key is set) the composer answers with
    /// the deterministic fallback reply.
    pub async fn build(
        data_dir: PathBuf,
        config: AssistantConfig,
        with_llm: bool,
    ) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let store = Arc::new(SqliteStore::new(db_pool));

        let provider = if with_llm {
            create_provider(&config.llm, api_key_from_env())
        } else {
            None
        };

        let orchestrator = Orchestrator::new(Arc::clone(&store), provider, &config);
        let checkout = CheckoutService::new(Arc::clone(&store), SimulatedGateway);

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            checkout: Arc::new(checkout),
            store,
            config,
            data_dir,
        })
    }
}
