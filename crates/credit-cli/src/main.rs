//! Credit Score CLI
//!
//! Reads a lending protocol transaction export, scores every wallet in it and
//! prints the result as JSON on stdout. Logs go to stderr.
//!
//! ```text
//! credit-score [PATH]
//! ```

mod config;

use std::collections::BTreeMap;
use std::fs;

use anyhow::Context;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use credit_core::{build_reports, compute_wallet_aggregates, parse_events};

use crate::config::AppConfig;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(std::env::args().nth(1))
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(path = %config.input.path, "Loading wallet transactions");

    let contents = fs::read_to_string(&config.input.path)
        .with_context(|| format!("Failed to read {}", config.input.path))?;
    let events = parse_events(&contents)
        .with_context(|| format!("Failed to parse events from {}", config.input.path))?;

    let aggregates = compute_wallet_aggregates(&events);

    let rendered = if config.output.detailed {
        render(&build_reports(&aggregates), config.output.pretty)?
    } else {
        let scores: BTreeMap<&str, u16> = aggregates
            .iter()
            .map(|a| (a.wallet.as_str(), a.credit_score))
            .collect();
        render(&scores, config.output.pretty)?
    };

    println!("{}", rendered);

    tracing::info!(wallets = aggregates.len(), "Done");
    Ok(())
}

fn render<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}
