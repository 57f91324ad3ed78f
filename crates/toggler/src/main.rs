//! Toggler command-line entry point.
//!
//! A thin front end over [`FlagService`]: each invocation runs exactly one
//! load → mutate → save cycle against the configured store and prints the
//! result as JSON on stdout.  Logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! toggler [OPTIONS] <COMMAND>
//!
//! Commands:
//!   list          Print the flag list
//!   add           Append a flag with the next key
//!   update <KEY>  Set a flag's value (--value <BOOL> or --payload <JSON>)
//!   init-config   Write the effective configuration to the config path
//!
//! Options:
//!   --config <PATH>  Configuration file [default: toggler.toml]
//!   --store <PATH>   Override the store path from the configuration
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable          | Equivalent option |
//! |-------------------|-------------------|
//! | `TOGGLER_CONFIG`  | `--config`        |
//! | `TOGGLER_STORE`   | `--store`         |
//! | `RUST_LOG`        | `[log] level`     |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use toggler::application::manage_flags::{FlagService, UpdateOutcome};
use toggler::application::payload::decode_update_payload;
use toggler::infrastructure::storage::config::{
    load_config, save_config, TogglerConfig, DEFAULT_CONFIG_FILE,
};
use toggler::infrastructure::storage::json_file::JsonFileRepository;
use toggler_core::FlagKey;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Persisted toggle-list manager.
#[derive(Debug, Parser)]
#[command(
    name = "toggler",
    about = "Manage a persisted list of named boolean flags",
    version
)]
struct Cli {
    /// Path of the TOML configuration file.  A missing file means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, env = "TOGGLER_CONFIG")]
    config: PathBuf,

    /// Path of the JSON store, overriding `[store] path`.
    #[arg(long, env = "TOGGLER_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the flag list.
    List,
    /// Append a flag with the next free key and a `false` value.
    Add,
    /// Set the value of the flag with the given key.
    Update {
        key: FlagKey,
        /// New value.
        #[arg(long, conflicts_with = "payload", required_unless_present = "payload")]
        value: Option<bool>,
        /// JSON request body such as `{"Value": true}`.
        #[arg(long)]
        payload: Option<String>,
    },
    /// Write the effective configuration to the config path.
    InitConfig,
}

impl Command {
    /// Resolves the requested value of an `update`, decoding the payload when
    /// no explicit value was given.
    fn update_value(value: Option<bool>, payload: Option<&str>) -> anyhow::Result<bool> {
        match value {
            Some(value) => Ok(value),
            None => Ok(decode_update_payload(payload.unwrap_or_default())?.value),
        }
    }
}

impl Cli {
    /// Loads the config file and applies command-line overrides.
    fn resolve_config(&self) -> anyhow::Result<TogglerConfig> {
        let mut config = load_config(&self.config)
            .with_context(|| format!("failed to load config '{}'", self.config.display()))?;
        if let Some(store) = &self.store {
            config.store.path = store.clone();
        }
        Ok(config)
    }
}

/// Builds the flag service over the configured store.
fn flag_service(config: &TogglerConfig) -> FlagService {
    let repository = JsonFileRepository::new(&config.store.path, config.store.write_mode);
    FlagService::new(Arc::new(repository), config.store.concurrency)
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    debug!(?config, "configuration resolved");

    let store = config.store.path.display();

    match cli.command {
        Command::InitConfig => {
            save_config(&cli.config, &config)
                .with_context(|| format!("failed to write config '{}'", cli.config.display()))?;
            info!("configuration written to {}", cli.config.display());
        }
        Command::List => {
            let state = flag_service(&config)
                .get_state()
                .await
                .with_context(|| format!("failed to read store '{store}'"))?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Add => {
            let flag = flag_service(&config)
                .add_flag()
                .await
                .with_context(|| format!("failed to add flag to '{store}'"))?;
            println!("{}", serde_json::to_string_pretty(&flag)?);
        }
        Command::Update {
            key,
            value,
            payload,
        } => {
            let value = Command::update_value(value, payload.as_deref())?;
            let outcome = flag_service(&config)
                .update_flag(key, value)
                .await
                .with_context(|| format!("failed to update flag {key} in '{store}'"))?;
            match outcome {
                UpdateOutcome::Updated(flags) => {
                    println!("found");
                    println!("{}", serde_json::to_string_pretty(&flags)?);
                }
                UpdateOutcome::NotFound => println!("not found"),
            }
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
