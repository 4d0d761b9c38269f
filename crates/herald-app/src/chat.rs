//! Interactive chat REPL.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use herald_ai::{
    GeminiClient, GeminiConfig, GenerationParams, Session, ToolDispatcher, TurnOptions,
    WeatherClient,
};
use herald_common::HeraldError;
use herald_config::HeraldConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::ChatArgs;

/// One line of REPL input, classified.
#[derive(Debug, PartialEq, Eq)]
enum ReplInput<'a> {
    Empty,
    Quit,
    History,
    Clear,
    Usage,
    Message(&'a str),
}

fn classify(line: &str) -> ReplInput<'_> {
    let input = line.trim();
    match input.to_lowercase().as_str() {
        "" => ReplInput::Empty,
        "quit" | "exit" | "bye" => ReplInput::Quit,
        "history" => ReplInput::History,
        "clear" => ReplInput::Clear,
        "usage" => ReplInput::Usage,
        _ => ReplInput::Message(input),
    }
}

fn build_session(config: &HeraldConfig) -> Result<(GeminiClient, Session), HeraldError> {
    let gemini = GeminiConfig::from_env()
        .map_err(|e| HeraldError::Ai(e.to_string()))?
        .with_model(config.assistant.model.clone());
    let client = GeminiClient::new(gemini).map_err(|e| HeraldError::Ai(e.to_string()))?;

    let weather = WeatherClient::new(
        config.weather.base_url.clone(),
        Duration::from_secs(u64::from(config.weather.timeout_secs)),
    )
    .map_err(|e| HeraldError::Ai(e.to_string()))?;

    let session = Session::new("gemini", ToolDispatcher::new(Arc::new(weather)));
    Ok((client, session))
}

fn turn_options(config: &HeraldConfig, args: &ChatArgs) -> TurnOptions {
    let system = args
        .system
        .clone()
        .unwrap_or_else(|| config.assistant.system_prompt.clone());
    TurnOptions::default()
        .with_system_prompt(system)
        .with_generation(GenerationParams {
            max_output_tokens: config.assistant.max_output_tokens,
            temperature: config.assistant.temperature,
        })
}

fn print_banner(model: &str) {
    println!("🤖 Herald chat is ready! (model: {model})");
    println!("{}", "=".repeat(60));
    println!("Available tools: get_weather (try asking about weather!)");
    println!("Type 'quit' or 'exit' to end the conversation");
    println!("Type 'history' to see conversation history");
    println!("Type 'clear' to clear conversation history");
    println!("Type 'usage' to see token usage");
    println!("{}", "=".repeat(60));
}

/// Drive `work` to completion unless `interrupt` resolves first.
async fn unless_interrupted<T>(work: impl Future<Output = T>, interrupt: impl Future) -> Option<T> {
    tokio::select! {
        out = work => Some(out),
        _ = interrupt => None,
    }
}

fn prompt() {
    print!("\n👤 You: ");
    let _ = std::io::stdout().flush();
}

pub async fn run(config: &HeraldConfig, args: ChatArgs) -> Result<(), HeraldError> {
    let (client, mut session) = build_session(config)?;
    let options = turn_options(config, &args);
    tracing::info!(session = %session.id(), model = client.model(), "Chat session started");

    print_banner(client.model());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();
        let Some(line) = unless_interrupted(lines.next_line(), tokio::signal::ctrl_c()).await else {
            println!("\n\n🤖 AI: Conversation interrupted. Goodbye!");
            break;
        };
        let line = line?;
        let Some(line) = line else {
            println!("\n🤖 AI: Goodbye! Thanks for chatting!");
            break;
        };

        match classify(&line) {
            ReplInput::Quit => {
                println!("\n🤖 AI: Goodbye! Thanks for chatting!");
                break;
            }
            ReplInput::History => {
                println!("\n{}", session.render_history());
            }
            ReplInput::Clear => {
                session.clear_history();
                println!("🧹 Conversation history cleared!");
            }
            ReplInput::Usage => {
                println!("{}", session.tracker());
            }
            ReplInput::Empty => {
                println!("Please enter a message.");
            }
            ReplInput::Message(text) => {
                println!("🔄 Processing...");
                let turn = session.send_turn(&client, text, &options);
                match unless_interrupted(turn, tokio::signal::ctrl_c()).await {
                    Some(Ok(answer)) => println!("🤖 AI: {answer}"),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Chat turn failed");
                        println!("❌ Error: {e}");
                    }
                    None => {
                        println!("\n\n🤖 AI: Conversation interrupted. Goodbye!");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(
        messages = session.message_count(),
        calls = session.tracker().call_count(),
        "Chat session ended"
    );
    Ok(())
}
