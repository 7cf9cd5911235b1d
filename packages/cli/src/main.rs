// ABOUTME: padcli entry point and argument tree
// ABOUTME: Acquires a delegated token for protected subcommands before dispatching them

use clap::{Parser, Subcommand};
use colored::*;
use std::process;

mod commands;
mod provider;

use commands::auth::AuthCommands;
use commands::termpad::TermpadCommands;

/// Scope required for each protected subcommand, keyed by the audience
/// identifier under which its delegated token is cached.
fn scope_for(identifier: &str) -> Option<&'static str> {
    match identifier {
        "termpad" => Some("api://termpad/access"),
        _ => None,
    }
}

#[derive(Parser)]
#[command(name = "padcli")]
#[command(about = "Post and fetch termpad snippets behind OAuth")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage authentication
    #[command(subcommand)]
    Auth(AuthCommands),
    /// Post or get code from termpad
    #[command(subcommand)]
    Termpad(TermpadCommands),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Auth(cmd) => cmd.execute().await,
        Commands::Termpad(cmd) => {
            let access_token = acquire_token("termpad").await;
            cmd.execute(&access_token).await;
        }
    }
}

/// Get a delegated token for a protected subcommand, or exit. No
/// protected command runs without a valid token.
async fn acquire_token(identifier: &str) -> String {
    let Some(scope) = scope_for(identifier) else {
        eprintln!(
            "{} no scope registered for subcommand '{}'",
            "✗".red().bold(),
            identifier
        );
        process::exit(1);
    };

    let manager = match provider::default_manager() {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            process::exit(1);
        }
    };

    match manager.get_delegated_token(identifier, scope).await {
        Ok(token) => token.access_token,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            process::exit(1);
        }
    }
}
