//! ---
//! rpg_section: "05-operator-cli"
//! rpg_subsection: "binary"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Control CLI for discovering and invoking remote processes."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use rpg_client::System;
use rpg_common::config::ClientConfig;
use rpg_common::logging::init_tracing;
use tokio::runtime::Runtime;

mod discover;
mod invoke;

const CONFIG_CANDIDATES: [&str; 2] = ["rpg.toml", "configs/rpg.toml"];

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Remote process graph control utility",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to rpg.toml or configs/rpg.toml when present).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Override the endpoint base url from the configuration.
    #[arg(long, global = true, value_name = "URL", env = "RPG_BASE_URL")]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List containers with their type name and process count.
    Containers,
    /// List the processes of the first container with the given type name.
    Processes(discover::ProcessesArgs),
    /// Print a server-side identifier list.
    List(discover::ListArgs),
    /// Invoke a process once and print its result.
    Call(invoke::CallArgs),
    /// Refresh the system on an interval and print a process result whenever it changes.
    Watch(invoke::WatchArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.base_url)?;
    init_tracing("rpgctl", &config.logging)?;

    let mut system = System::connect(&config.endpoint)?;
    let runtime = Runtime::new()?;
    runtime.block_on(async {
        match cli.command {
            Commands::Containers => discover::containers(&mut system).await,
            Commands::Processes(args) => discover::processes(&mut system, &args).await,
            Commands::List(args) => discover::list(&system, &args).await,
            Commands::Call(args) => invoke::call(&mut system, &args).await,
            Commands::Watch(args) => invoke::watch(&mut system, &config.poll, &args).await,
        }
    })
}

fn load_config(explicit: Option<&Path>, base_url: Option<String>) -> Result<ClientConfig> {
    let mut config = match explicit {
        Some(path) => ClientConfig::from_path(path)?,
        None => ClientConfig::load_or_default(&CONFIG_CANDIDATES)?.config,
    };
    if let Some(base_url) = base_url {
        config.endpoint.base_url = base_url;
        config.validate()?;
    }
    Ok(config)
}
