//! Cart mutations and order settlement.
//!
//! `checkout` turns the cart into an order (claiming the cart, numbering
//! and stock decrement are one store transaction), charges the gateway,
//! marks the order paid and settles loyalty points. A checkout that loses
//! the cart to a concurrent one re-reads it and usually ends in `EmptyCart`.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use clara_types::commerce::{
    cart_subtotal, CartItem, CartView, CheckoutReceipt, CheckoutRequest, NewOrder, OrderStatus,
    PaymentStatus,
};
use clara_types::error::{CheckoutError, RepositoryError};
use clara_types::pricing::{
    loyalty_discount, points_earned, OrderTotals, MIN_REDEEM_POINTS, POINT_VALUE,
};

use crate::commerce::payment::PaymentGateway;
use crate::repository::Store;

/// How often a checkout re-reads a cart that changed under it.
const CLAIM_ATTEMPTS: u32 = 3;

pub struct CheckoutService<S: Store, G: PaymentGateway> {
    store: Arc<S>,
    gateway: G,
}

impl<S: Store, G: PaymentGateway> CheckoutService<S, G> {
    pub fn new(store: Arc<S>, gateway: G) -> Self {
        Self { store, gateway }
    }

    /// Add `quantity` of a product, merging with an existing line.
    pub async fn add_to_cart(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, CheckoutError> {
        if quantity < 1 {
            return Err(CheckoutError::InvalidQuantity(quantity));
        }
        if self.store.get_user(user_id).await?.is_none() {
            return Err(CheckoutError::UserNotFound(user_id));
        }
        if self.store.get_product(product_id).await?.is_none() {
            return Err(CheckoutError::ProductNotFound(product_id));
        }
        Ok(self.store.add_to_cart(user_id, product_id, quantity).await?)
    }

    /// The cart with totals before any loyalty discount.
    pub async fn cart(&self, user_id: i64) -> Result<CartView, CheckoutError> {
        if self.store.get_user(user_id).await?.is_none() {
            return Err(CheckoutError::UserNotFound(user_id));
        }
        let lines = self.store.get_cart(user_id).await?;
        let totals = OrderTotals::compute(cart_subtotal(&lines), Decimal::ZERO);
        Ok(CartView {
            user_id,
            lines,
            totals,
        })
    }

    pub async fn checkout(
        &self,
        user_id: i64,
        request: &CheckoutRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(CheckoutError::UserNotFound(user_id))?;

        let shipping_address = request.shipping_address.trim().to_string();
        let billing_address = request
            .billing_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| shipping_address.clone());

        let mut attempt = 0;
        let mut order = loop {
            attempt += 1;
            let lines = self.store.get_cart(user_id).await?;
            if lines.is_empty() {
                return Err(CheckoutError::EmptyCart);
            }
            let discount = if request.redeem_points {
                if user.loyalty_points < MIN_REDEEM_POINTS {
                    return Err(CheckoutError::InsufficientPoints {
                        requested: MIN_REDEEM_POINTS,
                        available: user.loyalty_points,
                    });
                }
                loyalty_discount(user.loyalty_points)
            } else {
                Decimal::ZERO
            };
            let totals = OrderTotals::compute(cart_subtotal(&lines), discount);
            let new_order = NewOrder {
                user_id,
                lines,
                totals,
                shipping_address: shipping_address.clone(),
                billing_address: billing_address.clone(),
                payment_method: request.payment_method.clone(),
            };
            match self.store.create_order(&new_order).await {
                Ok(order) => break order,
                Err(RepositoryError::Conflict(reason)) if attempt < CLAIM_ATTEMPTS => {
                    debug!(user_id, attempt, %reason, "Cart changed during checkout, re-reading");
                }
                Err(e) => return Err(e.into()),
            }
        };
        let points_redeemed = i64::try_from((order.discount / POINT_VALUE).floor()).unwrap_or(0);

        let receipt = match self.gateway.charge(&order, &request.payment_method).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(order = %order.order_number, gateway = self.gateway.name(), error = %e, "Payment failed");
                self.store
                    .update_order_status(&order.id, OrderStatus::Cancelled)
                    .await?;
                return Err(e);
            }
        };
        self.store
            .mark_paid(&order.id, &receipt.transaction_id)
            .await?;
        order.payment_status = PaymentStatus::Paid;
        order.status = OrderStatus::Confirmed;
        order.transaction_id = Some(receipt.transaction_id.clone());

        let earned = points_earned(order.final_amount);
        let loyalty_balance = self
            .store
            .update_loyalty(user_id, earned - points_redeemed)
            .await?;

        info!(
            order = %order.order_number,
            user_id,
            amount = %order.final_amount,
            points_earned = earned,
            points_redeemed,
            "Checkout settled"
        );

        Ok(CheckoutReceipt {
            order,
            transaction_id: receipt.transaction_id,
            points_earned: earned,
            points_redeemed,
            loyalty_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commerce::payment::{PaymentReceipt, SimulatedGateway};
    use crate::repository::{CartRepository, OrderRepository};
    use crate::testing::MemoryStore;
    use clara_types::commerce::Order;

    fn service(store: &Arc<MemoryStore>) -> CheckoutService<MemoryStore, SimulatedGateway> {
        CheckoutService::new(Arc::clone(store), SimulatedGateway)
    }

    fn request(redeem_points: bool) -> CheckoutRequest {
        CheckoutRequest {
            shipping_address: "12 Rose Lane".into(),
            billing_address: None,
            payment_method: "credit_card".into(),
            redeem_points,
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_add_to_cart_validates() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Zoe", 0);
        let dress = store.add_product("Tea Dress", "casual", 60, 3, &[]);
        let service = service(&store);

        assert!(matches!(
            service.add_to_cart(user.id, dress.id, 0).await,
            Err(CheckoutError::InvalidQuantity(0))
        ));
        assert!(matches!(
            service.add_to_cart(user.id, 999, 1).await,
            Err(CheckoutError::ProductNotFound(999))
        ));
        assert!(matches!(
            service.add_to_cart(999, dress.id, 1).await,
            Err(CheckoutError::UserNotFound(999))
        ));

        service.add_to_cart(user.id, dress.id, 1).await.unwrap();
        let merged = service.add_to_cart(user.id, dress.id, 2).await.unwrap();
        assert_eq!(merged.quantity, 3);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Zoe", 0);
        let result = service(&store).checkout(user.id, &request(false)).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_checkout_settles_order() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Zoe", 0);
        let dress = store.add_product("Linen Midi", "casual", 75, 5, &[]);
        let service = service(&store);
        service.add_to_cart(user.id, dress.id, 2).await.unwrap();

        let receipt = service.checkout(user.id, &request(false)).await.unwrap();

        assert_eq!(receipt.order.final_amount, dec("162.00"));
        assert_eq!(receipt.order.order_number, "ORD-20260115-0001");
        assert_eq!(receipt.order.payment_status, PaymentStatus::Paid);
        assert_eq!(receipt.order.billing_address, "12 Rose Lane");
        assert!(receipt.transaction_id.starts_with("txn_"));
        assert_eq!(receipt.points_earned, 1620);
        assert_eq!(receipt.loyalty_balance, 1620);
        assert_eq!(store.product_stock(dress.id), 3);
        assert!(store.get_cart(user.id).await.unwrap().is_empty());

        let stored = store.get_orders(user.id).await.unwrap();
        assert_eq!(stored[0].transaction_id.as_deref(), Some(receipt.transaction_id.as_str()));
    }

    #[tokio::test]
    async fn test_cart_settles_only_once() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Zoe", 0);
        let dress = store.add_product("Linen Midi", "casual", 75, 5, &[]);
        let service = service(&store);
        service.add_to_cart(user.id, dress.id, 2).await.unwrap();

        let (req_a, req_b) = (request(false), request(false));
        let (first, second) = tokio::join!(
            service.checkout(user.id, &req_a),
            service.checkout(user.id, &req_b),
        );
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(CheckoutError::EmptyCart))));
        assert_eq!(store.get_orders(user.id).await.unwrap().len(), 1);
        assert_eq!(store.product_stock(dress.id), 3);
    }

    #[tokio::test]
    async fn test_small_order_pays_shipping() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Zoe", 0);
        let top = store.add_product("Silk Cami", "casual", 50, 5, &[]);
        let service = service(&store);
        service.add_to_cart(user.id, top.id, 1).await.unwrap();

        let receipt = service.checkout(user.id, &request(false)).await.unwrap();
        assert_eq!(receipt.order.shipping, dec("9.99"));
        assert_eq!(receipt.order.final_amount, dec("63.99"));
        assert_eq!(receipt.points_earned, 639);
    }

    #[tokio::test]
    async fn test_redeeming_points_discounts_and_deducts() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Zoe", 1_500);
        let coat = store.add_product("Wool Coat", "business", 200, 2, &[]);
        let service = service(&store);
        service.add_to_cart(user.id, coat.id, 1).await.unwrap();

        let receipt = service.checkout(user.id, &request(true)).await.unwrap();
        assert_eq!(receipt.order.discount, dec("15.00"));
        assert_eq!(receipt.order.final_amount, dec("201.00"));
        assert_eq!(receipt.points_redeemed, 1_500);
        assert_eq!(receipt.points_earned, 2_010);
        assert_eq!(receipt.loyalty_balance, 2_010);
    }

    #[tokio::test]
    async fn test_redeem_requires_minimum_balance() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Zoe", 40);
        let coat = store.add_product("Wool Coat", "business", 200, 2, &[]);
        let service = service(&store);
        service.add_to_cart(user.id, coat.id, 1).await.unwrap();

        let result = service.checkout(user.id, &request(true)).await;
        assert!(matches!(
            result,
            Err(CheckoutError::InsufficientPoints { requested: 100, available: 40 })
        ));
    }

    struct DecliningGateway;

    impl PaymentGateway for DecliningGateway {
        fn name(&self) -> &str {
            "declining"
        }

        async fn charge(&self, _order: &Order, _method: &str) -> Result<PaymentReceipt, CheckoutError> {
            Err(CheckoutError::PaymentDeclined("card expired".into()))
        }
    }

    #[tokio::test]
    async fn test_declined_payment_cancels_order() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Zoe", 0);
        let dress = store.add_product("Tea Dress", "casual", 60, 3, &[]);
        let service = CheckoutService::new(Arc::clone(&store), DecliningGateway);
        service.add_to_cart(user.id, dress.id, 1).await.unwrap();

        let result = service.checkout(user.id, &request(false)).await;
        assert!(matches!(result, Err(CheckoutError::PaymentDeclined(_))));
        let orders = store.get_orders(user.id).await.unwrap();
        assert_eq!(orders[0].status, OrderStatus::Cancelled);
    }
}
