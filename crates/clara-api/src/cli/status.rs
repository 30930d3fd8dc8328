//! System status dashboard command.

use anyhow::Result;
use console::style;

use clara_core::repository::ProductRepository;
use clara_infra::config::api_key_from_env;
use clara_infra::llm::{create_provider, test_provider_connection};
use clara_types::catalog::ProductQuery;

use crate::state::AppState;

/// Display system status dashboard.
///
/// Shows catalog counts, storage location, LLM configuration and whether
/// the provider answers, and the orchestrator limits in effect.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let products = state.store.search_products(&ProductQuery::default()).await?;
    let in_stock = products.iter().filter(|p| p.in_stock()).count();

    let llm = &state.config.llm;
    let provider = create_provider(llm, api_key_from_env());
    let connection = match &provider {
        Some(provider) => {
            let spinner = super::spinner(&format!("Checking {}...", provider.name()));
            let result = test_provider_connection(provider).await;
            spinner.finish_and_clear();
            Some(result)
        }
        None => None,
    };

    let orchestrator = &state.config.orchestrator;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "catalog": {
                "products": products.len(),
                "in_stock": in_stock,
            },
            "llm": {
                "provider": provider.as_ref().map(|p| p.name()),
                "model": llm.model,
                "base_url": llm.base_url,
                "connected": connection.as_ref().map(|r| r.is_ok()),
                "error": connection.as_ref().and_then(|r| r.as_ref().err().map(|e| e.to_string())),
            },
            "orchestrator": orchestrator,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Clara v{}",
        style("✦").magenta().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Catalog ──").dim());
    println!("  Products: {}", style(products.len()).bold());
    println!("  In stock: {}", style(in_stock).green());
    let sold_out = products.len() - in_stock;
    if sold_out > 0 {
        println!("  Sold out: {}", style(sold_out).yellow());
    }
    if products.is_empty() {
        println!(
            "  {}",
            style("Run `clara seed` to load the demo catalog.").dim()
        );
    }
    println!();

    println!("  {}", style("── LLM ──").dim());
    println!("  Model:    {}", style(&llm.model).cyan());
    println!("  Endpoint: {}", style(&llm.base_url).dim());
    match (&provider, &connection) {
        (Some(provider), Some(Ok(()))) => println!(
            "  Provider: {} {}",
            provider.name(),
            style("● connected").green()
        ),
        (Some(provider), Some(Err(e))) => println!(
            "  Provider: {} {}",
            provider.name(),
            style(format!("○ {e}")).red()
        ),
        _ => println!(
            "  Provider: {}",
            style("○ not configured (set OPENROUTER_API_KEY); using fallback replies").yellow()
        ),
    }
    println!();

    println!("  {}", style("── Orchestrator ──").dim());
    println!("  Agent timeout: {}ms", orchestrator.agent_timeout_ms);
    println!("  History limit: {} messages", orchestrator.history_limit);
    println!("  Memory window: {} messages", orchestrator.memory_window);
    println!();

    println!("  {}", style("── Storage ──").dim());
    println!(
        "  Data dir: {}",
        style(state.data_dir.display()).dim()
    );
    println!();

    Ok(())
}
