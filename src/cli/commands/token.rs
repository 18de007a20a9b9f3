use anyhow::Context;
use chrono::Duration;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::auth::{Authenticator, Claims, SelfIssuedTokens};
use crate::cli::utils::{output_success, parse_claim};
use crate::cli::OutputFormat;
use crate::config::{config, AuthMode};

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Mint a self-issued token with the configured shared secret")]
    Issue {
        #[arg(long, help = "Subject (sub claim)")]
        sub: String,
        #[arg(long = "claim", value_parser = parse_claim, help = "Extra claim as key=value (repeatable)")]
        claims: Vec<(String, Value)>,
        #[arg(long, help = "Issue a refresh token instead of an access token")]
        refresh: bool,
        #[arg(long, conflicts_with = "refresh", help = "Access token lifetime override in minutes")]
        ttl_minutes: Option<i64>,
    },

    #[command(about = "Verify a token with the configured strategy and print its claims")]
    Verify {
        #[arg(help = "Bearer token")]
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { sub, claims, refresh, ttl_minutes } => {
            issue(sub, claims, refresh, ttl_minutes, &output_format)
        }
        TokenCommands::Verify { token } => verify(&token, &output_format).await,
    }
}

fn issue(
    sub: String,
    extra: Vec<(String, Value)>,
    refresh: bool,
    ttl_minutes: Option<i64>,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let config = config();
    if config.auth.mode != AuthMode::SelfIssued {
        tracing::warn!(
            "AUTH_MODE is {}; the server will not accept self-issued tokens",
            config.auth.mode
        );
    }

    let tokens = SelfIssuedTokens::from_config(&config.auth);
    let claims = build_claims(sub, extra);

    let token = match (refresh, ttl_minutes) {
        (true, _) => tokens.issue_refresh(claims)?,
        (false, Some(minutes)) => tokens.issue_access_for(claims, Duration::minutes(minutes))?,
        (false, None) => tokens.issue_access(claims)?,
    };
    let token_type = if refresh { "refresh" } else { "access" };

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            Some(json!({ "token": token, "type": token_type })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}

/// `sub` wins over a `--claim sub=...` given alongside it.
fn build_claims(sub: String, extra: Vec<(String, Value)>) -> Claims {
    let mut claims = Claims::new();
    for (key, value) in extra {
        claims.insert(key, value);
    }
    claims.insert("sub", sub);
    claims
}

async fn verify(token: &str, output_format: &OutputFormat) -> anyhow::Result<()> {
    let config = config();
    let auth = Authenticator::from_config(&config.auth, config.environment).context("invalid auth configuration")?;

    let claims = auth
        .authenticate(Some(token))
        .await
        .with_context(|| format!("token rejected by {} verification", auth.mode()))?;

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "Token verified",
            Some(json!({ "mode": auth.mode().as_str(), "claims": claims })),
        ),
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(&claims)?);
            Ok(())
        }
    }
}
