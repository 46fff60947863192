//! mac-vim-switch: input method switching for Vim users on macOS
//!
//! Without arguments this runs as a background daemon that provides:
//! - Global key event capture via CGEventTap
//! - Gesture classification (Escape, quick Shift tap)
//! - Input method switching through the external `macism` tool
//!
//! Subcommands manage the configuration and switch once from scripts.

mod commands;
mod config;
mod daemon;
mod dispatch;
mod events;
mod gesture;
mod health;
mod hotkey;
mod input_method;
mod lifecycle;
mod logging;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{ConfigStore, Paths, Role};
use crate::dispatch::Dispatcher;
use crate::events::Intent;
use crate::input_method::Macism;

#[derive(Parser)]
#[command(name = "mac-vim-switch")]
#[command(about = "Switch input methods with Escape and a quick Shift tap")]
#[command(long_about = None)]
struct Cli {
    /// Print the version
    #[arg(short = 'v', long = "version")]
    print_version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available input methods
    List,

    /// Show the configuration, or set one of the input methods
    Config {
        /// Which input method to set
        #[arg(value_enum, requires = "id")]
        role: Option<Role>,

        /// Input method id (see `mac-vim-switch list`)
        id: Option<String>,
    },

    /// Print the version
    Version,

    /// Check that macism is installed and files are accessible
    #[command(alias = "doctor")]
    Health,

    /// Switch to the primary input method once
    Esc,

    /// Toggle between primary and secondary once
    Shift,
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help is not a failure
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_cli();
    let tool = Macism::new();

    if cli.print_version {
        return commands::version(&mut std::io::stdout().lock());
    }

    // Only the daemon log, `config <role> <id>` and `health` need HOME
    let paths = Paths::from_env();

    let Some(command) = cli.command else {
        let paths = paths?;
        let _guard = logging::init_file(&paths.log_file)?;
        let config = config::load_or_default(Ok(&paths));
        return daemon::run(config, tool).await;
    };

    logging::init_stderr();
    let mut config = config::load_or_default(paths.as_ref());
    let mut out = std::io::stdout().lock();

    match command {
        Commands::List => commands::list(&tool, &mut out),
        Commands::Config { role: None, .. } => commands::show_config(&config, &mut out),
        Commands::Config {
            role: Some(role),
            id: Some(id),
        } => {
            let store = ConfigStore::new(paths?.config_file);
            commands::set_input_method(&store, &mut config, &tool, role, &id)
        }
        Commands::Config { role: Some(_), id: None } => {
            anyhow::bail!(
                "Usage: mac-vim-switch config [primary|secondary] <input-method-id>\n\
                 Use 'mac-vim-switch list' to see available input methods"
            )
        }
        Commands::Version => commands::version(&mut out),
        Commands::Health => commands::health(&paths?, &tool, &mut out),
        Commands::Esc => {
            let dispatcher = Dispatcher::new(Arc::new(tool), config);
            commands::switch_once(&dispatcher, Intent::SwitchToPrimary)
        }
        Commands::Shift => {
            let dispatcher = Dispatcher::new(Arc::new(tool), config);
            commands::switch_once(&dispatcher, Intent::ToggleInputMethod)
        }
    }
}
