use clap::Parser;
use dotenv::dotenv;
use tg_openai_bot::app::Application;
use tg_openai_bot::cli::Args;
use tg_openai_bot::config::Config;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let dotenv_result = dotenv();
    let args = Args::parse();
    init_tracing(args.verbose);

    if dotenv_result.is_err() {
        warn!(".env file not found, relying on environment variables");
    }

    let config = match Config::load(args.config.as_deref(), !args.memory_store) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let app = match Application::new(config, args.memory_store).await {
        Ok(app) => app,
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app.run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}
