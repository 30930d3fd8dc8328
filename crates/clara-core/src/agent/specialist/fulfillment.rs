//! Fulfillment agent: delivery options, store pickup and order tracking.

use std::fmt::Write;

use chrono::{Days, NaiveDate, Utc};

use clara_types::agent::UserContext;
use clara_types::error::AgentError;

use crate::repository::Store;

const MAX_TRACKED_ORDERS: usize = 3;

struct DeliveryOption {
    name: &'static str,
    price: &'static str,
    days: u64,
}

const DELIVERY_OPTIONS: &[DeliveryOption] = &[
    DeliveryOption { name: "Standard Delivery", price: "FREE", days: 3 },
    DeliveryOption { name: "Express Delivery", price: "$12.99", days: 1 },
    DeliveryOption { name: "Premium Same-Day", price: "$24.99", days: 0 },
];

struct PickupStore {
    name: &'static str,
    address: &'static str,
    hours: &'static str,
    ready_in: &'static str,
    parking: &'static str,
}

const NEW_YORK_STORES: &[PickupStore] = &[
    PickupStore {
        name: "NYC Flagship Store",
        address: "123 Fifth Avenue",
        hours: "10am - 9pm daily",
        ready_in: "2 hours",
        parking: "Validated garage parking",
    },
    PickupStore {
        name: "Soho Boutique",
        address: "456 Broadway",
        hours: "11am - 8pm daily",
        ready_in: "4 hours",
        parking: "Street parking",
    },
];

const LOS_ANGELES_STORES: &[PickupStore] = &[PickupStore {
    name: "Beverly Hills Boutique",
    address: "789 Rodeo Drive",
    hours: "10am - 8pm daily",
    ready_in: "3 hours",
    parking: "Free valet",
}];

const CHICAGO_STORES: &[PickupStore] = &[PickupStore {
    name: "Magnificent Mile Store",
    address: "101 Michigan Avenue",
    hours: "10am - 9pm daily",
    ready_in: "2 hours",
    parking: "Partner garage",
}];

pub async fn handle<S: Store>(
    store: &S,
    message: &str,
    context: &UserContext,
) -> Result<String, AgentError> {
    let Some(user_id) = context.user_id else {
        return Ok("I need to know who you are to help with delivery or pickup. \
                   Please sign in first."
            .to_string());
    };

    let lowered = message.to_lowercase();
    let today = Utc::now().date_naive();

    if lowered.contains("track") || (lowered.contains("when") && lowered.contains("arrive")) {
        let orders = store.get_orders(user_id).await?;
        let open: Vec<_> = orders.iter().filter(|o| o.is_open()).take(MAX_TRACKED_ORDERS).collect();
        if open.is_empty() {
            return Ok("You don't have any pending deliveries.".to_string());
        }
        let mut out = String::from("Here are your pending deliveries:\n\n");
        for order in open {
            let _ = writeln!(
                out,
                "- Order {}: {} (tracking: {})",
                order.order_number,
                order.status,
                order.tracking_number.as_deref().unwrap_or("Not assigned yet")
            );
        }
        return Ok(out.trim_end().to_string());
    }

    if lowered.contains("delivery") || lowered.contains("ship") {
        return Ok(delivery_options(today));
    }

    if lowered.contains("pickup") || lowered.contains("pick up") || lowered.contains("store") {
        return Ok(pickup_options(context.city.as_deref()));
    }

    Ok("How would you like to receive your order?\n\n\
        - Home Delivery: standard, express, or same-day\n\
        - Store Pickup: ready in as little as 2 hours\n\
        - Parcel Locker: collect any time at a locker near you"
        .to_string())
}

fn delivery_options(today: NaiveDate) -> String {
    let mut out = String::from("Here are your delivery options:\n\n");
    for option in DELIVERY_OPTIONS {
        let eta = today
            .checked_add_days(Days::new(option.days))
            .unwrap_or(today)
            .format("%A, %B %d");
        let _ = writeln!(out, "- {} ({}): arrives {}", option.name, option.price, eta);
    }
    out.trim_end().to_string()
}

fn stores_for_city(city: Option<&str>) -> (&'static str, &'static [PickupStore]) {
    let city = city.map(str::to_lowercase).unwrap_or_default();
    if city.contains("los angeles") || city == "la" {
        ("Los Angeles", LOS_ANGELES_STORES)
    } else if city.contains("chicago") {
        ("Chicago", CHICAGO_STORES)
    } else {
        ("New York", NEW_YORK_STORES)
    }
}

fn pickup_options(city: Option<&str>) -> String {
    let (city_name, stores) = stores_for_city(city);
    let mut out = format!("Pickup locations in {city_name}:\n\n");
    for store in stores {
        let _ = writeln!(out, "{} - {}", store.name, store.address);
        let _ = writeln!(out, "  Hours: {}", store.hours);
        let _ = writeln!(out, "  Ready in: {}", store.ready_in);
        let _ = writeln!(out, "  Parking: {}", store.parking);
    }
    out.trim_end().to_string()
}
