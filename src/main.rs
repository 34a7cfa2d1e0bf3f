// review-authority - main.rs
// Operator runner for impersonation and mentor decisions over roster files

use clap::Parser;
use review_authority::cli::{run, Cli};
use review_authority::config_loader::load_config;
use std::process::exit;

fn init_tracing(level: &str) {
    let level = level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            exit(1);
        }
    };
    init_tracing(&config.log_level);
    tracing::debug!(?config, "config loaded");

    match run(cli.command, &config) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "request failed");
            eprintln!("{}", e.user_message());
            exit(1);
        }
    }
}
