// ABOUTME: CLI commands for the termpad paste service
// ABOUTME: Posts and fetches snippets using the delegated token acquired by the pre-step

use clap::Subcommand;
use colored::*;
use std::env;
use std::process;

use padcli_termpad::{TermpadClient, DEFAULT_BASE_URL};

#[derive(Subcommand)]
pub enum TermpadCommands {
    /// Post code to termpad
    #[command(arg_required_else_help = true)]
    Post {
        /// Text to post
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Get code from termpad
    Get {
        /// Paste identifier, e.g. WorrisomeFriendlyJewellery
        identifier: String,
    },
}

impl TermpadCommands {
    pub async fn execute(&self, access_token: &str) {
        let base_url =
            env::var("PADCLI_TERMPAD_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let client = TermpadClient::new(base_url);

        let result = match self {
            TermpadCommands::Post { text } => client.post(access_token, text.join(" ")).await,
            TermpadCommands::Get { identifier } => client.get(access_token, identifier).await,
        };

        match result {
            Ok(body) => print!("{body}"),
            Err(e) => {
                eprintln!("{} {}", "✗".red().bold(), e);
                process::exit(1);
            }
        }
    }
}
