use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Herald: a weather-aware chat assistant and WhatsApp reminder scheduler.
#[derive(Parser, Debug)]
#[command(name = "herald", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive chat session.
    Chat(ChatArgs),

    /// Send, schedule and manage WhatsApp notifications.
    #[command(subcommand)]
    Notify(NotifyCommand),
}

#[derive(ClapArgs, Debug)]
pub struct ChatArgs {
    /// System prompt override for this session.
    #[arg(long)]
    pub system: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum NotifyCommand {
    /// Send a WhatsApp message now.
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        message: String,
    },

    /// Schedule a WhatsApp message for later.
    Schedule {
        #[arg(long)]
        to: String,
        #[arg(long)]
        message: String,
        /// Delay from now, in hours (fractions allowed).
        #[arg(long, allow_hyphen_values = true)]
        delay_hours: String,
    },

    /// List pending jobs.
    Jobs,

    /// Cancel a pending job.
    Cancel {
        /// Job id as shown by `notify jobs`.
        id: String,
    },

    /// Run the dispatcher until interrupted.
    Serve,
}

pub fn parse() -> Args {
    Args::parse()
}
