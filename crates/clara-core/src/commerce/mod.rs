//! Cart management and checkout settlement.

pub mod checkout;
pub mod payment;
