use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use dotenv::dotenv;
use pantry_core::{AssistantClient, ChatSession};

mod app;
mod cli;
mod commands;
mod config;
mod logging;
mod output;

use crate::cli::Args;
use crate::commands::resolve_tag;
use crate::logging::{log_error, log_info};
use crate::output::print_usage_instructions;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before clap reads PANTRY_ENDPOINT
    dotenv().ok();

    let args = Args::parse();
    let config = config::resolve_config(&args)?;
    logging::init(config.log_level.as_deref());

    if !args.interactive && args.prompt.is_none() {
        print_usage_instructions();
        return Ok(());
    }

    let client = AssistantClient::new(config.client_config()?)
        .context("Failed to initialize assistant client")?;

    let mut session = match &args.session {
        Some(path) if path.exists() => {
            let session = ChatSession::load_from_file(path)
                .with_context(|| format!("Failed to load session from {}", path.display()))?;
            log_info(&format!("Resumed session {} from {}", session.id, path.display()));
            session
        }
        _ => ChatSession::default(),
    };

    let options = config.dietary_options();
    for tag in &args.prefs {
        match resolve_tag(tag, &options) {
            Some(tag) if !session.dietary_preferences().contains(&tag) => {
                session.toggle_preference(&tag);
            }
            Some(_) => {}
            None => eprintln!(
                "{}",
                format!("Ignoring unknown preference '{}'. Options: {}", tag, options.join(", ")).yellow()
            ),
        }
    }

    match client.health().await {
        Ok(true) => log_info("Assistant service is healthy."),
        Ok(false) | Err(_) => eprintln!(
            "{}",
            format!("Assistant service at {} is not responding; replies may fail.", client.endpoint()).yellow()
        ),
    }

    let outcome = if args.interactive {
        app::run_interactive_chat(&client, &config, &mut session).await
    } else if let Some(prompt) = args.prompt.clone() {
        app::run_single_query(prompt, &client, &config, &mut session).await
    } else {
        Ok(())
    };

    if let Err(e) = &outcome {
        log_error(&format!("Chat failed: {}", e));
    }

    if let Some(path) = &args.session {
        session
            .save_to_file(path)
            .with_context(|| format!("Failed to save session to {}", path.display()))?;
        log_info(&format!("Saved session to {}", path.display()));
    }

    outcome
}
