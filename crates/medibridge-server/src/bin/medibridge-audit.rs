//! Directory data-quality audit.
//!
//! Prints every issue found in the doctor directory as JSON and exits
//! non-zero when any exist.
//!
//! # Environment Variables
//! - `MEDIBRIDGE_DB_PATH`: SQLite file (default: "medibridge.db")

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medibridge_core::MediBridgeCore;
use medibridge_server::config::DEFAULT_DB_PATH;
use medibridge_server::AuditReport;

fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medibridge_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db_path = std::env::var("MEDIBRIDGE_DB_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

    let core = MediBridgeCore::open(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    let report = AuditReport::collect(&core)?;
    println!("{}", report.to_json()?);

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}
