// src/cli/commands.rs
use super::Command;
use crate::config::Settings;
use crate::health::HealthChecker;
use crate::registry::{JsonFileStore, RegistryStore};
use crate::report::TerminalReporter;
use anyhow::{bail, Context, Result};
use std::io::Write;
use tokio::sync::watch;
use tracing::info;
use url::Url;

/// Dispatch one command.
pub async fn run<W: Write>(
    command: Command,
    settings: &Settings,
    shutdown: watch::Receiver<bool>,
    out: &mut W,
) -> Result<()> {
    let store = JsonFileStore::new(settings.store_config());
    let reporter = TerminalReporter::new(settings.color);

    match command {
        Command::New { name, url } => run_new(&store, &name, &url).await,
        Command::Remove { name } => run_remove(&store, &name).await,
        Command::List => run_list(&store, &reporter, out).await,
        Command::Check => {
            let checker = HealthChecker::new(settings.check_config())?;
            run_check(&store, &checker, &reporter, shutdown, out).await
        }
    }
}

pub async fn run_new(store: &dyn RegistryStore, name: &str, url: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Server name must not be empty");
    }
    let parsed = Url::parse(url).with_context(|| format!("Invalid server URL '{}'", url))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("Unsupported URL scheme '{}', expected http or https", parsed.scheme());
    }

    let registry = store
        .add(name, url)
        .await
        .context("Failed to add server")?;
    info!("Added {} ({}), {} server(s) listed", name, url, registry.len());
    Ok(())
}

pub async fn run_remove(store: &dyn RegistryStore, name: &str) -> Result<()> {
    let removed = store
        .remove(name)
        .await
        .context("Failed to remove server")?;
    if removed == 0 {
        info!("No server named {}", name);
    } else {
        info!("Removed {} entr{} named {}", removed, if removed == 1 { "y" } else { "ies" }, name);
    }
    Ok(())
}

pub async fn run_list<W: Write>(
    store: &dyn RegistryStore,
    reporter: &TerminalReporter,
    out: &mut W,
) -> Result<()> {
    let registry = store.load().await.context("Config file error")?;
    reporter.list(out, &registry)?;
    Ok(())
}

/// Load the registry and probe it. An empty registry is an error here, not
/// in the checker.
pub async fn run_check<W: Write>(
    store: &dyn RegistryStore,
    checker: &HealthChecker,
    reporter: &TerminalReporter,
    shutdown: watch::Receiver<bool>,
    out: &mut W,
) -> Result<()> {
    let registry = store.load().await.context("Config file error")?;
    if registry.is_empty() {
        bail!("No servers found.");
    }

    match checker.check_all_until(registry.endpoints(), shutdown).await {
        Some(batch) => {
            reporter.report(out, &batch)?;
            Ok(())
        }
        None => bail!("Health check cancelled"),
    }
}
