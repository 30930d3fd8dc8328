//! Loyalty agent: tier status, coupons, and point redemption quotes.

use std::fmt::Write;

use rust_decimal::Decimal;

use clara_types::agent::UserContext;
use clara_types::catalog::User;
use clara_types::error::AgentError;
use clara_types::pricing::{points_value, LoyaltyTier, MIN_REDEEM_POINTS};

use crate::repository::Store;

#[derive(Debug, Clone, Copy)]
pub struct Coupon {
    pub code: &'static str,
    pub description: &'static str,
    pub min_purchase: Option<Decimal>,
}

const BASE_COUPONS: &[Coupon] = &[
    Coupon {
        code: "WELCOME15",
        description: "15% off your first order",
        min_purchase: None,
    },
    Coupon {
        code: "SPRING20",
        description: "20% off all dresses",
        min_purchase: Some(Decimal::from_parts(50, 0, 0, false, 0)),
    },
];

const PROMOTIONS: &[&str] = &[
    "Spring Collection: 20% off all dresses",
    "Free shipping on orders over $100",
    "Double points weekend on accessories",
];

pub fn tier_coupon(tier: LoyaltyTier) -> Coupon {
    match tier {
        LoyaltyTier::Bronze => Coupon {
            code: "BRONZE10",
            description: "10% off orders over $75",
            min_purchase: Some(Decimal::from_parts(75, 0, 0, false, 0)),
        },
        LoyaltyTier::Silver => Coupon {
            code: "SILVER15",
            description: "15% off any order",
            min_purchase: None,
        },
        LoyaltyTier::Gold => Coupon {
            code: "GOLD20",
            description: "20% off any order",
            min_purchase: None,
        },
        LoyaltyTier::Platinum => Coupon {
            code: "PLATINUM25",
            description: "25% off any order",
            min_purchase: None,
        },
    }
}

/// Coupons a customer of `tier` can use: the base set plus their tier's.
pub fn available_coupons(tier: LoyaltyTier) -> Vec<Coupon> {
    let mut coupons = BASE_COUPONS.to_vec();
    coupons.push(tier_coupon(tier));
    coupons
}

/// Look up any known coupon code, case-insensitively.
pub fn find_coupon(code: &str) -> Option<Coupon> {
    BASE_COUPONS
        .iter()
        .copied()
        .chain(
            [
                LoyaltyTier::Bronze,
                LoyaltyTier::Silver,
                LoyaltyTier::Gold,
                LoyaltyTier::Platinum,
            ]
            .into_iter()
            .map(tier_coupon),
        )
        .find(|c| c.code.eq_ignore_ascii_case(code))
}

pub async fn handle<S: Store>(
    store: &S,
    message: &str,
    context: &UserContext,
) -> Result<String, AgentError> {
    let Some(user_id) = context.user_id else {
        return Ok("I need to know who you are to look up your rewards. \
                   Please sign in first."
            .to_string());
    };
    let Some(user) = store.get_user(user_id).await? else {
        return Ok("I couldn't find your account. Please check your details and try again."
            .to_string());
    };

    let lowered = message.to_lowercase();
    let reply = if lowered.contains("redeem") && lowered.contains("point") {
        redeem_quote(&user, &lowered)
    } else if lowered.contains("apply") && lowered.contains("coupon") {
        apply_coupon(message)
    } else if ["point", "loyalty", "reward"].iter().any(|k| lowered.contains(k)) {
        status(&user)
    } else if ["coupon", "promo", "discount", "offer", "code"]
        .iter()
        .any(|k| lowered.contains(k))
    {
        coupons(&user)
    } else {
        all_offers(&user)
    };
    Ok(reply)
}

fn status(user: &User) -> String {
    let tier = user.tier();
    let mut out = format!("Your loyalty status, {}:\n\n", user.first_name);
    let _ = writeln!(out, "Tier: {tier}");
    let _ = writeln!(out, "Points: {}", user.loyalty_points);
    let _ = writeln!(out, "Member since: {}", user.created_at.format("%B %Y"));
    out.push_str("\nYour benefits:\n");
    for benefit in tier.benefits() {
        let _ = writeln!(out, "- {benefit}");
    }
    let _ = writeln!(
        out,
        "\nYour points are worth ${}.",
        points_value(user.loyalty_points)
    );
    match tier.next() {
        Some(next) => {
            let _ = write!(
                out,
                "Next tier: {next} Tier in {} points.",
                next.threshold() - user.loyalty_points
            );
        }
        None => out.push_str("You're at the highest tier!"),
    }
    out
}

fn coupons(user: &User) -> String {
    let mut out = String::from("Coupons available to you:\n\n");
    for coupon in available_coupons(user.tier()) {
        let _ = write!(out, "- {}: {}", coupon.code, coupon.description);
        if let Some(min) = coupon.min_purchase {
            let _ = write!(out, " (min. purchase ${min})");
        }
        out.push('\n');
    }
    out.push_str("\nSay \"apply coupon <CODE>\" to use one.");
    out
}

/// A coupon code is a token of at least six characters mixing letters and digits.
fn extract_coupon_code(message: &str) -> Option<String> {
    message
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|t| {
            t.len() >= 6
                && t.chars().any(|c| c.is_ascii_alphabetic())
                && t.chars().any(|c| c.is_ascii_digit())
        })
        .map(str::to_uppercase)
}

fn apply_coupon(message: &str) -> String {
    let Some(code) = extract_coupon_code(message) else {
        return "Which coupon code would you like to apply?".to_string();
    };
    match find_coupon(&code) {
        Some(coupon) => {
            let mut out = format!("Coupon {} applied: {}.", coupon.code, coupon.description);
            if let Some(min) = coupon.min_purchase {
                let _ = write!(out, " Valid on orders of ${min} or more.");
            }
            out
        }
        None => format!("Sorry, {code} isn't a valid coupon code."),
    }
}

fn redeem_quote(user: &User, lowered: &str) -> String {
    let requested = lowered
        .split(|c: char| !c.is_ascii_digit())
        .find(|t| !t.is_empty())
        .and_then(|t| t.parse::<i64>().ok());
    let Some(points) = requested else {
        return format!(
            "You have {} points (worth ${}). How many would you like to redeem?",
            user.loyalty_points,
            points_value(user.loyalty_points)
        );
    };
    if points > user.loyalty_points {
        return format!("You only have {} points available.", user.loyalty_points);
    }
    if points < MIN_REDEEM_POINTS {
        return format!("Minimum redemption is {MIN_REDEEM_POINTS} points.");
    }
    format!(
        "Redeeming {points} points gives you ${} off your next order. \
         You'll have {} points remaining.",
        points_value(points),
        user.loyalty_points - points
    )
}

fn all_offers(user: &User) -> String {
    let mut out = String::from("Current promotions:\n");
    for promo in PROMOTIONS {
        let _ = writeln!(out, "- {promo}");
    }
    out.push_str("\nYour coupons:\n");
    for coupon in available_coupons(user.tier()).iter().take(3) {
        let _ = writeln!(out, "- {}: {}", coupon.code, coupon.description);
    }
    let _ = write!(
        out,
        "\nYou have {} points as a {} member.",
        user.loyalty_points,
        user.tier()
    );
    out
}
