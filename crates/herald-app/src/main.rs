mod chat;
mod cli;
mod notify;

use std::path::PathBuf;
use std::process::ExitCode;

use herald_common::HeraldError;
use herald_config::HeraldConfig;
use tracing_subscriber::EnvFilter;

use cli::Command;

/// Load environment variables from a .env file (KEY=VALUE lines).
///
/// Variables already set in the environment win.
fn load_dotenv() {
    let mut candidates = vec![PathBuf::from(".env")];
    if let Ok(dir) = herald_config::toml_loader::herald_config_dir() {
        candidates.push(dir.join(".env"));
    }

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for (key, value) in parse_dotenv(&contents) {
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
            return;
        }
    }
}

fn parse_dotenv(contents: &str) -> Vec<(&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!key.is_empty()).then_some((key, value))
        })
        .collect()
}

/// `--log-level`, then `[logging].level`, then `herald=info`.
fn log_directive(cli_level: Option<&str>, config: &HeraldConfig) -> String {
    match cli_level {
        Some(level) if level.contains('=') => level.to_string(),
        Some(level) => format!("herald={level}"),
        None => config.logging.level.directive().to_string(),
    }
}

fn init_logging(directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                directive
                    .parse()
                    .unwrap_or_else(|_| "herald=info".parse().unwrap()),
            ),
        )
        .init();
}

fn main() -> ExitCode {
    // Before the runtime starts any threads.
    load_dotenv();

    let args = cli::parse();

    let (config, config_err) = match herald_config::load_config_from(args.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (HeraldConfig::default(), Some(e)),
    };

    init_logging(&log_directive(args.log_level.as_deref(), &config));
    tracing::info!("Herald v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    if let Some(e) = config_err {
        tracing::warn!("Config load failed, using defaults: {e}");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result: Result<(), HeraldError> = runtime.block_on(async {
        match args.command {
            Command::Chat(chat_args) => chat::run(&config, chat_args).await,
            Command::Notify(command) => notify::run(&config, command).await,
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}
