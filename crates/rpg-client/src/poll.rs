//! ---
//! rpg_section: "02-client-core"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Periodic, non-overlapping system refresh loop."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rpg_common::config::PollConfig;
use rpg_logging::{rpg_warn, LogContext};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::system::System;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Work performed once per tick, after the system profile was refreshed.
///
/// Implementations own whatever last-known values they need between ticks.
#[async_trait]
pub trait TickHandler: Send {
    async fn on_tick(&mut self, system: &mut System, tick: u64);
}

/// Counters returned when a [`RefreshLoop`] stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    pub ticks: u64,
    pub failed_refreshes: u64,
}

/// Drives [`System::refresh`] on a fixed interval.
///
/// Each tick awaits the refresh and the handler before the next one starts,
/// so refreshes never overlap. Late ticks are delayed rather than bunched up.
#[derive(Debug, Clone)]
pub struct RefreshLoop {
    interval: Duration,
    max_ticks: Option<u64>,
}

impl RefreshLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            max_ticks: None,
        }
    }

    pub fn from_config(config: &PollConfig) -> Self {
        Self {
            interval: config.interval.max(MIN_INTERVAL),
            max_ticks: config.max_ticks,
        }
    }

    /// Stop after `ticks` ticks.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until the tick limit, if any, is reached.
    pub async fn run<H>(&self, system: &mut System, handler: &mut H) -> LoopReport
    where
        H: TickHandler + ?Sized,
    {
        self.run_until(system, handler, std::future::pending::<()>())
            .await
    }

    /// Run until the tick limit is reached or `shutdown` resolves.
    ///
    /// A failed refresh is logged and counted; the handler still runs against
    /// the previous profile.
    pub async fn run_until<H, F>(
        &self,
        system: &mut System,
        handler: &mut H,
        shutdown: F,
    ) -> LoopReport
    where
        H: TickHandler + ?Sized,
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut report = LoopReport::default();
        info!(interval_ms = self.interval.as_millis() as u64, max_ticks = ?self.max_ticks, "refresh loop started");
        loop {
            if self.max_ticks.is_some_and(|max| report.ticks >= max) {
                break;
            }
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    debug!("refresh loop shutdown requested");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let tick = report.ticks;
            report.ticks += 1;
            if let Err(err) = system.refresh().await {
                report.failed_refreshes += 1;
                let retry = if err.is_transient() {
                    "retrying next tick"
                } else {
                    "keeping previous profile"
                };
                rpg_warn!(
                    context = LogContext::new().with_tick(tick),
                    "system refresh failed ({retry}): {err}"
                );
            }
            handler.on_tick(system, tick).await;
        }
        info!(ticks = report.ticks, failed_refreshes = report.failed_refreshes, "refresh loop stopped");
        report
    }
}
