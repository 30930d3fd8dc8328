//! Specialist agents.
//!
//! A closed set of stateless rule engines behind one capability,
//! [`SpecialistAgent::handle`], selected by category. Agents may read and
//! write through the store but never call each other or the composer, so
//! any subset of them can run in parallel.

pub mod fulfillment;
pub mod inventory;
pub mod loyalty;
pub mod payment;
pub mod recommendation;
pub mod support;

use clara_types::agent::{Category, UserContext};
use clara_types::error::AgentError;

use crate::repository::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialistAgent {
    Recommendation,
    Inventory,
    Payment,
    Fulfillment,
    Loyalty,
    Support,
}

impl SpecialistAgent {
    /// The agent serving a category; `None` for the fallback category.
    pub fn for_category(category: Category) -> Option<Self> {
        match category {
            Category::Recommendation => Some(SpecialistAgent::Recommendation),
            Category::Inventory => Some(SpecialistAgent::Inventory),
            Category::Payment => Some(SpecialistAgent::Payment),
            Category::Fulfillment => Some(SpecialistAgent::Fulfillment),
            Category::Loyalty => Some(SpecialistAgent::Loyalty),
            Category::Support => Some(SpecialistAgent::Support),
            Category::Sales => None,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            SpecialistAgent::Recommendation => Category::Recommendation,
            SpecialistAgent::Inventory => Category::Inventory,
            SpecialistAgent::Payment => Category::Payment,
            SpecialistAgent::Fulfillment => Category::Fulfillment,
            SpecialistAgent::Loyalty => Category::Loyalty,
            SpecialistAgent::Support => Category::Support,
        }
    }

    /// Answer one message. Errors are decoded by the fan-out coordinator.
    pub async fn handle<S: Store>(
        &self,
        store: &S,
        message: &str,
        context: &UserContext,
    ) -> Result<String, AgentError> {
        match self {
            SpecialistAgent::Recommendation => recommendation::handle(store, message, context).await,
            SpecialistAgent::Inventory => inventory::handle(store, message, context).await,
            SpecialistAgent::Payment => payment::handle(store, message, context).await,
            SpecialistAgent::Fulfillment => fulfillment::handle(store, message, context).await,
            SpecialistAgent::Loyalty => loyalty::handle(store, message, context).await,
            SpecialistAgent::Support => Ok(support::handle(message)),
        }
    }
}
