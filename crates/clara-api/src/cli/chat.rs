//! Interactive chat loop.
//!
//! Each line typed is one sales turn through the orchestrator. A known
//! customer gets a persisted session (resumable with `--session`); an
//! anonymous chat keeps its history client-side and sends it with each turn.

use anyhow::Result;
use console::style;
use dialoguer::Input;

use clara_core::repository::UserRepository;
use clara_types::chat::Channel;
use clara_types::llm::{Message, MessageRole};
use clara_types::sales::{ActionType, SalesRequest, SalesResponse};

use crate::state::AppState;

const EXIT_COMMANDS: &[&str] = &["/exit", "/quit", "exit", "quit"];

pub async fn chat(
    state: &AppState,
    user_id: Option<i64>,
    channel: Channel,
    session: Option<String>,
    json: bool,
) -> Result<()> {
    let user = match user_id {
        Some(id) => Some(
            state
                .store
                .get_user(id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("user {id} not found (run `clara seed`?)"))?,
        ),
        None => None,
    };

    if !json {
        println!();
        println!("  {} Clara", style("✦").magenta().bold());
        match &user {
            Some(user) => println!(
                "  Chatting as {} ({} tier, {} points) on {}",
                style(user.full_name()).cyan(),
                user.tier(),
                user.loyalty_points,
                channel
            ),
            None => println!("  Chatting anonymously on {channel}"),
        }
        if !state.orchestrator.has_llm() {
            println!(
                "  {}",
                style("No OPENROUTER_API_KEY set: replies use the built-in summary.").yellow()
            );
        }
        println!("  {}", style("Type /exit to leave.").dim());
        println!();
    }

    let mut session_id = session;
    let mut local_history: Vec<Message> = Vec::new();

    loop {
        let line = match Input::<String>::new()
            .with_prompt(style("you").cyan().bold().to_string())
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            // Ctrl+C / Ctrl+D
            Err(_) => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&line) {
            break;
        }

        let mut request = SalesRequest::new(line);
        request.user_id = user_id;
        request.session_id = session_id.clone();
        request.channel = channel;
        if session_id.is_none() {
            request.history = Some(local_history.clone());
        }

        let spinner = super::spinner("Clara is thinking...");
        let result = state.orchestrator.process_message(request).await;
        spinner.finish_and_clear();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                eprintln!("  {} {e}", style("error:").red().bold());
                continue;
            }
        };

        if json {
            println!("{}", serde_json::to_string(&response)?);
        } else {
            print_reply(&response, user_id);
        }

        match &response.session_id {
            Some(id) => session_id = Some(id.clone()),
            None => {
                local_history.push(Message::new(MessageRole::User, line));
                local_history.push(Message::new(MessageRole::Assistant, response.reply.clone()));
            }
        }
    }

    if let (Some(id), false) = (&session_id, json) {
        println!();
        println!(
            "  Session saved. Resume with {}",
            style(format!("clara chat --session {id}")).cyan()
        );
        println!();
    }

    Ok(())
}

fn print_reply(response: &SalesResponse, user_id: Option<i64>) {
    println!();
    println!("{} {}", style("clara").magenta().bold(), response.reply);
    if let Some(hint) = action_hint(response, user_id) {
        println!("      {}", style(hint).dim());
    }
    println!();
}

/// One-line suggestion of the follow-up CLI command for an action.
fn action_hint(response: &SalesResponse, user_id: Option<i64>) -> Option<String> {
    if !response.requires_action {
        return None;
    }
    let data = response.action_data.as_ref();
    match response.action_type? {
        ActionType::AddToCart => {
            let product = data.and_then(|d| d.get("product_id")).and_then(|v| v.as_i64());
            match (user_id, product) {
                (Some(user), Some(product)) => Some(format!("→ clara add {user} {product}")),
                _ => Some("→ add to cart with `clara add <user> <product>`".to_string()),
            }
        }
        ActionType::Checkout => {
            let user = data
                .and_then(|d| d.get("user_id"))
                .and_then(|v| v.as_i64())
                .or(user_id);
            match user {
                Some(user) => Some(format!("→ clara checkout {user}")),
                None => Some("→ check out with `clara checkout <user>`".to_string()),
            }
        }
    }
}
