//! Log in to the ONS integration API and print the reservoir data.
//!
//! Reads `IONS_USERNAME` and `IONS_PASSWORD` (a `.env` file is honoured),
//! plus the optional `IONS_BASE_URL` / `IONS_*_TIMEOUT_SECS` overrides.
//! Use RUST_LOG to control log output (e.g. RUST_LOG=ions_core=debug).

use std::io;

use anyhow::{Context, Result};
use ions_core::{Ions, Session, SessionConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let username = std::env::var("IONS_USERNAME").context("IONS_USERNAME is not set")?;
    let password = std::env::var("IONS_PASSWORD").context("IONS_PASSWORD is not set")?;
    let config = SessionConfig::from_env().context("Invalid session configuration")?;

    let session = Session::builder(config)
        .login(&username, &password)
        .await
        .context("Login failed")?;
    if let Some(credential) = session.credential() {
        info!(%credential, "Logged in");
    }

    let ions = Ions::from_session(session);
    let reservoirs = ions
        .fetch_reservoirs()
        .await
        .context("Failed to fetch reservoirs")?;

    println!("{}", serde_json::to_string_pretty(&reservoirs)?);
    Ok(())
}
