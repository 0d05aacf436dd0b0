//! ---
//! rpg_section: "05-operator-cli"
//! rpg_subsection: "binary"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Control CLI for discovering and invoking remote processes."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::Args;
use rpg_client::{ContainerProcess, Payload, Query, RefreshLoop, System, TickHandler};
use rpg_common::config::PollConfig;
use rpg_logging::{rpg_warn, LogContext};
use serde_json::Value;
use tracing::info;

#[derive(Debug, Args)]
pub struct CallArgs {
    /// Container type name.
    #[arg(long, value_name = "TYPE")]
    pub container: String,
    /// Process type name.
    #[arg(long, value_name = "TYPE")]
    pub process: String,
    /// JSON argument object; `{}` when omitted.
    #[arg(long, value_name = "JSON", conflicts_with = "execute")]
    pub args: Option<String>,
    /// Run with the arguments stored on the server instead of sending new ones.
    #[arg(long)]
    pub execute: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Container type name.
    #[arg(long, value_name = "TYPE")]
    pub container: String,
    /// Process type name.
    #[arg(long, value_name = "TYPE")]
    pub process: String,
    /// JSON argument object sent on every tick.
    #[arg(long, value_name = "JSON")]
    pub args: Option<String>,
    /// Override the configured poll interval.
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,
    /// Stop after this many ticks.
    #[arg(long, value_name = "N")]
    pub ticks: Option<u64>,
}

fn parse_args(raw: Option<&str>) -> Result<Option<Value>> {
    raw.map(|raw| {
        let value: Value =
            serde_json::from_str(raw).with_context(|| format!("--args is not valid JSON: {raw}"))?;
        if !value.is_object() {
            return Err(anyhow!("--args must be a JSON object"));
        }
        Ok(value)
    })
    .transpose()
}

async fn resolve(system: &mut System, container: &str, process: &str) -> Result<ContainerProcess> {
    let found = system
        .container(&Query::by_type(container))
        .await?
        .ok_or_else(|| anyhow!("no container with type name '{container}'"))?;
    let process = found
        .process(&Query::by_type(process))
        .await?
        .ok_or_else(|| anyhow!("container '{container}' has no process with type name '{process}'"))?;
    Ok(process.clone())
}

fn render(result: Option<&Payload>) -> String {
    match result {
        Some(Payload::Json(value)) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        Some(Payload::Binary {
            content_type,
            bytes,
        }) => format!(
            "<binary: {} bytes, {}>",
            bytes.len(),
            content_type.as_deref().unwrap_or("unknown content type")
        ),
        None => "no result".to_owned(),
    }
}

pub async fn call(system: &mut System, args: &CallArgs) -> Result<()> {
    let call_args = parse_args(args.args.as_deref())?;
    system.setup().await?;
    let process = resolve(system, &args.container, &args.process).await?;
    let result = if args.execute {
        process.execute().await
    } else {
        process.call(call_args.as_ref()).await
    };
    println!("{}", render(result.as_ref()));
    Ok(())
}

/// Invokes one process per tick and prints only when the result changes.
struct Watcher {
    container: String,
    process: String,
    args: Option<Value>,
    last: Option<Payload>,
    printed: bool,
}

#[async_trait]
impl TickHandler for Watcher {
    async fn on_tick(&mut self, system: &mut System, tick: u64) {
        let process = match resolve(system, &self.container, &self.process).await {
            Ok(process) => process,
            Err(err) => {
                rpg_warn!(
                    context = LogContext::new()
                        .with_container(&self.container)
                        .with_process(&self.process)
                        .with_tick(tick),
                    "unable to resolve process: {err:#}"
                );
                return;
            }
        };
        let result = process.call(self.args.as_ref()).await;
        if !self.printed || result != self.last {
            println!("[{tick}] {}", render(result.as_ref()));
            self.printed = true;
        }
        // A failed call keeps the previous value, like a pose that simply is not updated this tick.
        if result.is_some() {
            self.last = result;
        }
    }
}

pub async fn watch(system: &mut System, poll: &PollConfig, args: &WatchArgs) -> Result<()> {
    let mut watcher = Watcher {
        container: args.container.clone(),
        process: args.process.clone(),
        args: parse_args(args.args.as_deref())?,
        last: None,
        printed: false,
    };
    system.setup().await?;

    let mut refresh = RefreshLoop::from_config(poll);
    if let Some(interval_ms) = args.interval_ms {
        refresh = RefreshLoop::new(Duration::from_millis(interval_ms));
        if let Some(max) = poll.max_ticks {
            refresh = refresh.with_max_ticks(max);
        }
    }
    if let Some(ticks) = args.ticks {
        refresh = refresh.with_max_ticks(ticks);
    }

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping watch");
        }
    };
    let report = refresh.run_until(system, &mut watcher, shutdown).await;
    info!(ticks = report.ticks, failed_refreshes = report.failed_refreshes, "watch finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn args_must_be_an_object() {
        assert_eq!(parse_args(None).unwrap(), None);
        assert_eq!(
            parse_args(Some(r#"{"vx": 0.1}"#)).unwrap(),
            Some(json!({"vx": 0.1}))
        );
        assert!(parse_args(Some("[1, 2]")).is_err());
        assert!(parse_args(Some("{oops")).is_err());
    }

    #[test]
    fn renders_each_outcome() {
        assert_eq!(render(None), "no result");
        assert_eq!(render(Some(&Payload::Json(json!(3)))), "3");
        let binary = Payload::Binary {
            content_type: Some("image/png".into()),
            bytes: vec![0u8; 8].into(),
        };
        assert_eq!(render(Some(&binary)), "<binary: 8 bytes, image/png>");
    }
}
