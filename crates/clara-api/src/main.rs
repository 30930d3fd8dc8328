//! Clara CLI and REST API entry point.
//!
//! Binary name: `clara`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use clara_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};
use clara_types::catalog::ProductQuery;
use clara_types::commerce::CheckoutRequest;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "clara", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (config, DB, services)
    let state = AppState::init().await?;

    let result = run(cli, state).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Clara API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            if !state.orchestrator.has_llm() {
                println!(
                    "  {}",
                    console::style("OPENROUTER_API_KEY not set: replies use the fallback summary")
                        .yellow()
                );
            }
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }

        Commands::Chat {
            user,
            channel,
            session,
        } => {
            cli::chat::chat(&state, user, channel, session, cli.json).await?;
        }

        Commands::Seed => {
            cli::catalog::seed(&state, cli.json).await?;
        }

        Commands::Products {
            category,
            occasion,
            min_price,
            max_price,
        } => {
            let query = ProductQuery {
                category,
                occasion,
                min_price,
                max_price,
            };
            cli::catalog::list_products(&state, query, cli.json).await?;
        }

        Commands::Cart { user } => {
            cli::commerce::show_cart(&state, user, cli.json).await?;
        }

        Commands::Add {
            user,
            product,
            quantity,
        } => {
            cli::commerce::add_to_cart(&state, user, product, quantity, cli.json).await?;
        }

        Commands::Checkout {
            user,
            address,
            billing,
            payment_method,
            redeem_points,
            force,
        } => {
            let request = CheckoutRequest {
                shipping_address: address.unwrap_or_default(),
                billing_address: billing,
                payment_method,
                redeem_points,
            };
            cli::commerce::checkout(&state, user, request, force, cli.json).await?;
        }

        Commands::Orders { user } => {
            cli::commerce::list_orders(&state, user, cli.json).await?;
        }

        Commands::History { session, limit } => {
            cli::session::history(&state, &session, limit, cli.json).await?;
        }

        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
