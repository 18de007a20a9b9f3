use anyhow::Context;
use clap::Subcommand;
use serde_json::json;
use std::time::Duration;

use crate::auth::{HttpKeySetSource, KeySetSource};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;

#[derive(Subcommand)]
pub enum KeysCommands {
    #[command(about = "Fetch the configured key set and list its key ids")]
    Fetch,
}

pub async fn handle(cmd: KeysCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        KeysCommands::Fetch => fetch(&output_format).await,
    }
}

async fn fetch(output_format: &OutputFormat) -> anyhow::Result<()> {
    let auth = &config().auth;
    let url = auth.key_set_url().context("no key set configured")?;
    let source = HttpKeySetSource::new(url, Duration::from_secs(auth.jwks_timeout_secs))?;

    let set = source.fetch().await?;

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            &format!("Fetched {} keys from {}", set.keys.len(), source.describe()),
            Some(json!({ "keys": set.keys })),
        ),
        OutputFormat::Text => {
            println!("{}", source.describe());
            for key in &set.keys {
                println!(
                    "  {}  {}  {}",
                    key.kid.as_deref().unwrap_or("-"),
                    key.kty,
                    key.alg.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
    }
}
