//! CLI command definitions and dispatch for the `clara` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod catalog;
pub mod chat;
pub mod commerce;
pub mod session;
pub mod status;

use std::time::Duration;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;

use clara_types::chat::Channel;

/// Clara, the omnichannel sales assistant.
#[derive(Parser)]
#[command(name = "clara", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans to stdout as OpenTelemetry traces.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Start an interactive chat with Clara.
    Chat {
        /// Customer id to chat as (anonymous when omitted).
        #[arg(long, short = 'u')]
        user: Option<i64>,

        /// Channel to format replies for.
        #[arg(long, short = 'c', default_value = "web")]
        channel: Channel,

        /// Resume a previous session by id.
        #[arg(long)]
        session: Option<String>,
    },

    /// Load the bundled demo customers and catalog.
    Seed,

    /// Browse the product catalog.
    Products {
        /// Filter by category (e.g. women-dresses).
        #[arg(long)]
        category: Option<String>,

        /// Filter by occasion (e.g. wedding).
        #[arg(long)]
        occasion: Option<String>,

        /// Minimum price, inclusive.
        #[arg(long)]
        min_price: Option<Decimal>,

        /// Maximum price, inclusive.
        #[arg(long)]
        max_price: Option<Decimal>,
    },

    /// Show a customer's cart.
    Cart {
        /// Customer id.
        user: i64,
    },

    /// Add a product to a customer's cart.
    Add {
        /// Customer id.
        user: i64,

        /// Product id.
        product: i64,

        /// Quantity to add.
        #[arg(long, short = 'n', default_value = "1")]
        quantity: i64,
    },

    /// Place and pay for the order in a customer's cart.
    Checkout {
        /// Customer id.
        user: i64,

        /// Shipping address (prompted when omitted).
        #[arg(long)]
        address: Option<String>,

        /// Billing address (defaults to the shipping address).
        #[arg(long)]
        billing: Option<String>,

        /// Payment method label.
        #[arg(long, default_value = "card")]
        payment_method: String,

        /// Redeem loyalty points against this order.
        #[arg(long)]
        redeem_points: bool,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// List a customer's orders.
    Orders {
        /// Customer id.
        user: i64,
    },

    /// Show the message log of a chat session.
    History {
        /// Session id.
        session: String,

        /// Number of most recent messages to show.
        #[arg(long, short = 'n', default_value = "20")]
        limit: u32,
    },

    /// System status dashboard.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Steady-ticking spinner with `message`.
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
