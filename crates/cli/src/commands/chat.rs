//! `shopdesk chat`: Interactive or single-message chat mode.

use shopdesk_agent::{AgentLoop, AgentStreamEvent};
use shopdesk_core::message::SessionId;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    message: Option<String>,
    session: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    // Check for API key early: give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    SHOPDESK_API_KEY=sk-ant-...");
        eprintln!("    ANTHROPIC_API_KEY=sk-ant-...");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!(
            "    {}",
            shopdesk_config::AppConfig::config_dir()
                .join("config.toml")
                .display()
        );
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let store = Arc::new(super::open_store(&config).await?);
    let provider = Arc::new(shopdesk_providers::build_from_config(&config)?);
    let tools = Arc::new(shopdesk_tools::default_registry(store.clone()));
    let agent = Arc::new(AgentLoop::from_config(&config, provider, store, tools));

    let session_id = session.map(SessionId).unwrap_or_default();

    if let Some(msg) = message {
        // Single message mode
        let ok = ask(&agent, &msg, &session_id).await?;
        eprintln!("  session: {session_id}");
        if !ok {
            return Err("The agent could not answer.".into());
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Shopdesk: order and product support");
    println!();
    println!("  Model:     {}", config.default_model);
    println!("  Database:  {}", config.database.url);
    println!("  Session:   {session_id}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        print!("  Assistant > ");
        ask(&agent, line, &session_id).await?;
        println!();
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

/// Stream one answer to stdout. Returns `false` if the agent reported an error.
async fn ask(
    agent: &Arc<AgentLoop>,
    message: &str,
    session_id: &SessionId,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (_, mut rx) = agent.stream(message, Some(session_id.clone()));

    while let Some(event) = rx.recv().await {
        match event {
            AgentStreamEvent::Chunk { text } => {
                print!("{text}");
                std::io::stdout().flush()?;
            }
            AgentStreamEvent::Done { .. } => {
                println!();
                return Ok(true);
            }
            AgentStreamEvent::Error { message } => {
                println!();
                eprintln!("  [Error] {message}");
                return Ok(false);
            }
        }
    }
    Ok(false)
}
