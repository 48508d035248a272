// ABOUTME: Interactive REPL wiring config, tools, and the agent together.
// ABOUTME: Plain lines go to the agent; colon-commands drive calendar auth.

use std::sync::Arc;

use anyhow::Result;
use rustyline::DefaultEditor;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use relay::agent::Agent;
use relay::config::Config;
use relay::error::AgentError;
use relay::llm::OllamaClient;
use relay::tool::Registry;
use relay::tools::{BashTool, CalendarTool, OciTool, PythonTool, ScrapeTool, TimeTool};

const HELP: &str = "Commands:
  :help            Show this help message
  :tools           List registered tools
  :auth            Connect Google Calendar
  :authcode CODE   Complete Google auth
  :quit            Exit

Or just ask things like:
  \"What's on my calendar today?\"
  \"Write a Python script to calculate pi\"
  \"Summarize https://example.com\"";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Config::load();

    let client = Arc::new(OllamaClient::with_base_url(
        &cfg.ollama_url,
        &cfg.ollama_model,
    ));

    let registry = Registry::new();
    registry.register(TimeTool).await;

    // Python and bash share the same workspace.
    let python = PythonTool::new(&cfg.workspace_dir);
    if let Err(e) = python.init() {
        warn!(error = %e, "workspace warning");
    } else {
        info!(workspace = %cfg.workspace_dir, "workspace ready");
    }
    registry.register(python).await;
    registry.register(BashTool::new(&cfg.workspace_dir)).await;

    registry.register(ScrapeTool::new(client.clone())).await;
    registry.register(OciTool).await;

    let calendar = Arc::new(CalendarTool::new(
        &cfg.google_client_id,
        &cfg.google_client_secret,
        &cfg.google_redirect_url,
        &cfg.google_token_file,
    ));
    match calendar.init().await {
        Err(e) => warn!(error = %e, "calendar init warning"),
        Ok(Some(_)) => info!("calendar needs authentication, use :auth"),
        Ok(None) => info!("calendar authenticated"),
    }
    registry.register_arc(calendar.clone()).await;

    info!(tools = registry.count().await, model = %cfg.ollama_model, "ready");

    let agent = Agent::new(client, registry.clone()).model(&cfg.ollama_model);

    println!(
        "relay - an assistant powered by {}. Type :help for commands.\n",
        cfg.ollama_model
    );

    let mut rl = DefaultEditor::new()?;
    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(_) => break,
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        match line.split_once(' ').map_or((line, ""), |(c, rest)| (c, rest.trim())) {
            (":quit" | ":exit", _) => break,
            (":help", _) => println!("{HELP}\n"),
            (":tools", _) => {
                println!("{}\n", registry.list().await.join(", "));
            }
            (":auth", _) => match calendar.init().await {
                Err(e) => println!("{e}\n"),
                Ok(None) => println!("Google Calendar is already connected.\n"),
                Ok(Some(url)) => println!(
                    "To connect Google Calendar:\n\n\
                     1. Open this link:\n{url}\n\n\
                     2. Sign in and authorize access\n\n\
                     3. Copy the code you receive\n\n\
                     4. Run: :authcode YOUR_CODE\n"
                ),
            },
            (":authcode", code) => {
                if code.is_empty() {
                    println!("Provide the authorization code: :authcode YOUR_CODE\n");
                } else if let Err(e) = calendar.complete_auth(code).await {
                    println!("Authentication failed: {e}\n");
                } else {
                    println!("Google Calendar connected. Try \"What's on my calendar?\"\n");
                }
            }
            _ => match agent.chat(line).await {
                Ok(answer) => println!("\n{answer}\n"),
                Err(AgentError::MaxRounds(max)) => {
                    warn!(max, "conversation did not converge");
                    println!("I couldn't finish that within {max} steps. Try a simpler request.\n");
                }
                Err(e) => {
                    warn!(error = %e, "agent error");
                    println!("Sorry, I couldn't process that. Make sure Ollama is running.\n");
                }
            },
        }
    }

    Ok(())
}
