//! Checkout arithmetic and loyalty tiers.
//!
//! All money is [`Decimal`] rounded to cents. The order invariant is
//! `final_amount = subtotal + tax - discount + shipping`, floored at zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Sales tax rate applied to the subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Subtotal at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Flat shipping fee below the free-shipping threshold.
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(999, 0, 0, false, 2);

/// Dollar value of one loyalty point.
pub const POINT_VALUE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum loyalty discount applied to a single order.
pub const MAX_LOYALTY_DISCOUNT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Minimum points a customer may redeem at once.
pub const MIN_REDEEM_POINTS: i64 = 100;

/// Points earned per dollar paid.
pub const POINTS_PER_DOLLAR: i64 = 10;

/// Round a money amount to cents, half away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Dollar value of `points` loyalty points.
pub fn points_value(points: i64) -> Decimal {
    round_cents(Decimal::from(points.max(0)) * POINT_VALUE)
}

/// Loyalty discount for a point balance: `min(points * 0.01, 50.00)`.
pub fn loyalty_discount(points: i64) -> Decimal {
    points_value(points).min(MAX_LOYALTY_DISCOUNT)
}

/// Points earned on a settled payment: `floor(amount * 10)`.
pub fn points_earned(amount: Decimal) -> i64 {
    let points = (amount * Decimal::from(POINTS_PER_DOLLAR)).floor();
    i64::try_from(points).unwrap_or(0).max(0)
}

/// Computed totals for a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub final_amount: Decimal,
}

impl OrderTotals {
    /// Compute totals for `subtotal` with an already-capped `discount`.
    pub fn compute(subtotal: Decimal, discount: Decimal) -> Self {
        let subtotal = round_cents(subtotal);
        let tax = round_cents(subtotal * TAX_RATE);
        let shipping = if subtotal >= FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING_FEE
        };
        let discount = round_cents(discount.max(Decimal::ZERO));
        let final_amount = (subtotal + tax - discount + shipping).max(Decimal::ZERO);

        Self {
            subtotal,
            tax,
            shipping,
            discount,
            final_amount,
        }
    }

    /// Totals when the customer applies their loyalty balance.
    pub fn with_loyalty(subtotal: Decimal, loyalty_points: i64) -> Self {
        Self::compute(subtotal, loyalty_discount(loyalty_points))
    }
}

/// Coarse loyalty bucket derived from a point balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    /// Thresholds are inclusive on the low side: 100 is Silver, 99 is Bronze.
    pub fn from_points(points: i64) -> Self {
        if points >= 500 {
            LoyaltyTier::Platinum
        } else if points >= 200 {
            LoyaltyTier::Gold
        } else if points >= 100 {
            LoyaltyTier::Silver
        } else {
            LoyaltyTier::Bronze
        }
    }

    /// Minimum points for this tier.
    pub fn threshold(&self) -> i64 {
        match self {
            LoyaltyTier::Bronze => 0,
            LoyaltyTier::Silver => 100,
            LoyaltyTier::Gold => 200,
            LoyaltyTier::Platinum => 500,
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            LoyaltyTier::Bronze => Some(LoyaltyTier::Silver),
            LoyaltyTier::Silver => Some(LoyaltyTier::Gold),
            LoyaltyTier::Gold => Some(LoyaltyTier::Platinum),
            LoyaltyTier::Platinum => None,
        }
    }

    pub fn benefits(&self) -> &'static [&'static str] {
        match self {
            LoyaltyTier::Bronze => &[
                "5% off all purchases",
                "Free shipping over $100",
                "Earn 2x points on first purchase",
            ],
            LoyaltyTier::Silver => &[
                "10% off all purchases",
                "Free shipping over $75",
                "Birthday bonus (100 points)",
            ],
            LoyaltyTier::Gold => &[
                "15% off all purchases",
                "Free standard shipping",
                "48-hour early access to sales",
                "Birthday bonus (250 points)",
            ],
            LoyaltyTier::Platinum => &[
                "20% off all purchases",
                "Free express shipping",
                "Early access to sales",
                "Personal shopping assistant",
                "Birthday bonus (500 points)",
            ],
        }
    }
}

impl fmt::Display for LoyaltyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoyaltyTier::Bronze => write!(f, "Bronze"),
            LoyaltyTier::Silver => write!(f, "Silver"),
            LoyaltyTier::Gold => write!(f, "Gold"),
            LoyaltyTier::Platinum => write!(f, "Platinum"),
        }
    }
}

impl FromStr for LoyaltyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bronze" => Ok(LoyaltyTier::Bronze),
            "silver" => Ok(LoyaltyTier::Silver),
            "gold" => Ok(LoyaltyTier::Gold),
            "platinum" => Ok(LoyaltyTier::Platinum),
            other => Err(format!("invalid loyalty tier: '{other}'")),
        }
    }
}
