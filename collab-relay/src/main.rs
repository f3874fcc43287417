//! Collab chat relay server.
//!
//! An axum server carrying per-pair chat sockets and the chat REST
//! endpoints for the marketplace.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:9000
//! cargo run --bin collab-relay
//!
//! # Run on custom address with a roster file
//! cargo run --bin collab-relay -- --bind 127.0.0.1:8080 --config relay.toml
//!
//! # Print a development token for user 1
//! cargo run --bin collab-relay -- --issue-token 1
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use collab_proto::models::UserId;
use collab_relay::auth;
use collab_relay::config::{RelayCliArgs, RelayConfig};
use collab_relay::relay::{self, RelayState};

/// Lifetime of tokens printed by `--issue-token`.
const DEV_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[tokio::main]
async fn main() {
    let cli = RelayCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match RelayConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Some(user) = cli.issue_token {
        match auth::issue_token(&config.jwt_secret, UserId::new(user), DEV_TOKEN_TTL) {
            Ok(token) => println!("{token}"),
            Err(e) => {
                eprintln!("Error issuing token: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if config.uses_dev_secret() {
        tracing::warn!("using the development JWT secret; set COLLAB_JWT_SECRET in production");
    }
    if config.users.is_empty() {
        tracing::warn!("user roster is empty; every connection will be refused");
    }

    tracing::info!(
        addr = %config.bind_addr,
        users = config.users.len(),
        "starting collab relay server"
    );

    let state = Arc::new(RelayState::with_config(&config));

    match relay::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "relay server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "relay server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start relay server");
            std::process::exit(1);
        }
    }
}
