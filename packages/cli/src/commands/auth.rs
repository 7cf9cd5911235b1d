// ABOUTME: CLI commands for authentication
// ABOUTME: Runs the interactive browser login and stores the resulting session

use clap::Subcommand;
use colored::*;
use std::process;

use crate::provider;

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Login with your user account
    Login,
}

impl AuthCommands {
    pub async fn execute(&self) {
        match self {
            AuthCommands::Login => login_command().await,
        }
    }
}

async fn login_command() {
    let manager = match provider::default_manager() {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            process::exit(1);
        }
    };

    println!(
        "{}",
        "🔐 Opening browser for authentication...".bold().cyan()
    );
    println!();

    match manager.login().await {
        Ok(_) => {
            println!("{} Successfully logged in", "✓".green().bold());
        }
        Err(e) => {
            eprintln!("{} Login failed: {}", "✗".red().bold(), e);
            process::exit(1);
        }
    }
}
