//! Batch simulator entry point.
//!
//! Usage: `simulate <scenario.ron>`. Prints the battle report as JSON on
//! stdout; logs go to stderr.
use std::path::PathBuf;

use anyhow::{Context, Result};
use combat_runtime::{ContentRegistry, Runtime, RuntimeConfig, Scenario};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: simulate <scenario.ron>")?;

    let scenario = Scenario::load_from_file(&path)
        .with_context(|| format!("loading scenario {}", path.display()))?;

    let report = Runtime::builder()
        .config(RuntimeConfig::from_env())
        .scenario(scenario)
        .content(ContentRegistry::new())
        .build()?
        .run()?;

    println!("{}", report.to_json()?);
    Ok(())
}
