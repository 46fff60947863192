//! One-shot command line operations

use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{Config, ConfigError, ConfigStore, Paths, Role};
use crate::dispatch::Dispatcher;
use crate::events::Intent;
use crate::health;
use crate::input_method::{InputMethodPort, Macism};

/// Print the available input methods
pub fn list(port: &dyn InputMethodPort, out: &mut impl Write) -> Result<()> {
    let methods = port.list().context("failed to get input methods")?;
    writeln!(out, "Available input methods:")?;
    for method in methods {
        writeln!(out, "{method}")?;
    }
    Ok(())
}

/// Print the active configuration
pub fn show_config(config: &Config, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Current configuration:")?;
    writeln!(out, "Primary input method: {}", config.primary_im)?;
    writeln!(out, "Secondary input method: {}", config.secondary_im)?;
    Ok(())
}

/// Validate `id` against the available input methods, then store it.
///
/// An unknown id leaves both `config` and the stored file untouched.
pub fn set_input_method(
    store: &ConfigStore,
    config: &mut Config,
    port: &dyn InputMethodPort,
    role: Role,
    id: &str,
) -> Result<()> {
    if !port.exists(id).context("failed to get input methods")? {
        return Err(ConfigError::UnknownInputMethod { id: id.to_string() }.into());
    }

    let mut updated = config.clone();
    updated.set(role, id);
    store.save(&updated).context("failed to save config")?;
    *config = updated;

    info!(%role, %id, "input method configured");
    Ok(())
}

/// Dispatch a single intent right away (`esc` / `shift`)
pub fn switch_once(dispatcher: &Dispatcher, intent: Intent) -> Result<()> {
    dispatcher
        .dispatch(intent)
        .with_context(|| format!("{intent} failed"))?;
    Ok(())
}

pub fn version(out: &mut impl Write) -> Result<()> {
    writeln!(out, "mac-vim-switch version {}", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}

pub fn health(paths: &Paths, tool: &Macism, out: &mut impl Write) -> Result<()> {
    health::check(paths, tool).context("health check failed")?;
    writeln!(out, "All systems operational!")?;
    Ok(())
}
