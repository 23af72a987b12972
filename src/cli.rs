use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Telegram bot that answers with OpenAI chat completions", long_about = None)]
pub struct Args {
    /// Settings file (defaults to ~/.tg-openai-bot/config.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Keep history in memory instead of MongoDB
    #[arg(long)]
    pub memory_store: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}
