//! Keymint activation-code issuance service.
//!
//! Usage:
//!   keymint-server --port 8080 --key-file private.pem
//!
//! The signing key comes from `KEYMINT_KEY_PEM` (inline PEM content,
//! preferred) or the configured key file, re-resolved on every issuance so
//! rotation needs no restart. Every successful issuance is appended to the
//! history file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use keymint_license::{ExpiryPolicy, Issuer, IssuerConfig, KeySource};
use keymint_server::{AppState, build_router};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "keymint-server")]
#[command(about = "Keymint activation-code issuance service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Authentication token required by the API
    #[arg(long, env = "KEYMINT_TOKEN", default_value = "change-me", hide_env_values = true)]
    token: String,

    /// Inline PEM content of the signing key (takes precedence over --key-file)
    #[arg(long, env = "KEYMINT_KEY_PEM", hide_env_values = true)]
    key_pem: Option<String>,

    /// Path to the PKCS#1 signing key file
    #[arg(long, env = "KEYMINT_KEY_FILE", default_value = "private.pem")]
    key_file: PathBuf,

    /// Path of the issuance history file
    #[arg(long, env = "KEYMINT_LEDGER", default_value = "history.json")]
    ledger_file: PathBuf,

    /// IANA zone expiry dates are interpreted in
    #[arg(long, default_value = ExpiryPolicy::DEFAULT_ZONE)]
    timezone: String,

    /// Reject expiry dates more than this many months ahead
    #[arg(long)]
    max_lead_months: Option<u32>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let has_inline = args
        .key_pem
        .as_deref()
        .is_some_and(|pem| !pem.trim().is_empty());
    if !has_inline && !args.key_file.exists() {
        warn!(
            path = %args.key_file.display(),
            "no signing key configured; issuance will fail until one is provided"
        );
    }

    let issuer = Issuer::new(IssuerConfig {
        key: KeySource {
            inline_pem: args.key_pem,
            pem_file: Some(args.key_file),
        },
        policy: ExpiryPolicy {
            preferred_zone: args.timezone,
            max_lead_months: args.max_lead_months,
        },
        ledger_path: args.ledger_file,
    });

    let state = Arc::new(AppState {
        issuer,
        api_token: args.token,
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("failed to bind port {}", args.port))?;
    info!(port = args.port, "issuance service listening");
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
