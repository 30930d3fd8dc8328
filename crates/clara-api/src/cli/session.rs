//! Session history CLI command.

use anyhow::Result;
use console::style;

use clara_core::chat::repository::ChatRepository;
use clara_types::chat::ChatRole;

use crate::state::AppState;

/// Print the last `limit` messages of a session, oldest first.
pub async fn history(state: &AppState, session_id: &str, limit: u32, json: bool) -> Result<()> {
    let session = state
        .store
        .get_session(session_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("session '{session_id}' not found"))?;
    let messages = state.orchestrator.sessions().history(session_id, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} {}",
        style("Session").bold(),
        style(&session.id).cyan(),
        style(format!("({}, {})", session.channel, session.status)).dim()
    );
    println!();

    if messages.is_empty() {
        println!("  No messages yet.");
        println!();
        return Ok(());
    }

    for message in &messages {
        let time = message.created_at.format("%H:%M:%S");
        let speaker = match message.role {
            ChatRole::User => style("you".to_string()).cyan().bold(),
            ChatRole::Assistant => style("clara".to_string()).magenta().bold(),
            ChatRole::Agent => style(
                message
                    .agent_tag
                    .clone()
                    .unwrap_or_else(|| "agent".to_string()),
            )
            .yellow(),
            ChatRole::System => style("system".to_string()).dim(),
        };
        println!("  {} {speaker}", style(format!("[{}] #{}", time, message.seq)).dim());
        for line in message.content.lines() {
            println!("    {line}");
        }
    }
    println!();

    Ok(())
}
