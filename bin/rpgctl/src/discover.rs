//! ---
//! rpg_section: "05-operator-cli"
//! rpg_subsection: "binary"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Control CLI for discovering and invoking remote processes."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use rpg_client::{Query, System};

#[derive(Debug, Args)]
pub struct ProcessesArgs {
    /// Container type name.
    #[arg(long, value_name = "TYPE")]
    pub container: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListTarget {
    Containers,
    Processes,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(value_enum)]
    pub target: ListTarget,
}

pub async fn containers(system: &mut System) -> Result<()> {
    system.setup().await?;
    for container in system.containers().await? {
        let type_name = container.type_name()?.to_owned();
        let process_count = container.processes().await?.len();
        println!("{}\t{}\t{}", container.identifier(), type_name, process_count);
    }
    Ok(())
}

pub async fn processes(system: &mut System, args: &ProcessesArgs) -> Result<()> {
    system.setup().await?;
    let container = system
        .container(&Query::by_type(args.container.as_str()))
        .await?
        .ok_or_else(|| anyhow!("no container with type name '{}'", args.container))?;
    for process in container.processes().await? {
        println!("{}\t{}", process.identifier(), process.type_name()?);
    }
    Ok(())
}

pub async fn list(system: &System, args: &ListArgs) -> Result<()> {
    let ids = match args.target {
        ListTarget::Containers => system.list_containers().await?,
        ListTarget::Processes => system.list_processes().await?,
    };
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
