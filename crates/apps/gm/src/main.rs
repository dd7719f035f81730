//! gm - command-line access to a Gmail mailbox
//!
//! Reads OAuth client credentials and a stored access token from the config
//! directory and runs a single mailbox command.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, warn};
use mailbox::{AccessToken, Credentials, Mailbox};
use std::process::ExitCode;

mod commands;

use commands::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    let credentials = match Credentials::load() {
        Ok(creds) => creds,
        Err(e) => {
            if let Some(path) = Credentials::default_path() {
                warn!(
                    "To configure Gmail access, either:\n\
                     1. Place your Google OAuth credentials at: {}\n\
                     2. Set GM_CLIENT_ID, GM_CLIENT_SECRET and GM_REDIRECT_URI",
                    path.display()
                );
            }
            return Err(e.context("Gmail credentials not found"));
        }
    };

    let token = AccessToken::load().with_context(|| {
        format!(
            "No stored access token at {}",
            AccessToken::default_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unknown config dir>".to_string())
        )
    })?;

    if token.is_expired() {
        warn!("Stored access token has expired; the service will likely reject it");
    }

    let mailbox = Mailbox::gmail();
    let stdout = std::io::stdout();
    commands::execute(&mailbox, &credentials, &token, command, &mut stdout.lock())
}
