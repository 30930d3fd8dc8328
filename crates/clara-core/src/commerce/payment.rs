//! Payment gateway port and the simulated gateway used in this deployment.

use rust_decimal::Decimal;
use uuid::Uuid;

use clara_types::commerce::Order;
use clara_types::error::CheckoutError;

/// A settled charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub amount: Decimal,
}

pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &str;

    /// Charge the order's final amount with `method`.
    fn charge(
        &self,
        order: &Order,
        method: &str,
    ) -> impl std::future::Future<Output = Result<PaymentReceipt, CheckoutError>> + Send;
}

/// Approves every charge with a random `txn_<12 hex>` id.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedGateway;

impl SimulatedGateway {
    pub fn transaction_id() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("txn_{}", &hex[..12])
    }
}

impl PaymentGateway for SimulatedGateway {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn charge(&self, order: &Order, _method: &str) -> Result<PaymentReceipt, CheckoutError> {
        Ok(PaymentReceipt {
            transaction_id: Self::transaction_id(),
            amount: order.final_amount,
        })
    }
}
