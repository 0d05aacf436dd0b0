//! ---
//! rpg_section: "03-logging"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Structured logging context and convenience macros."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
#![warn(missing_docs)]

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

#[doc(hidden)]
pub use tracing as __tracing;

/// Initialize a baseline tracing subscriber suitable for development and tests.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}

/// Entity coordinates attached to log events by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Container type name or identifier.
    pub container: Option<&'a str>,
    /// Process type name.
    pub process: Option<&'a str>,
    /// Remote identifier of the entity the event concerns.
    pub identifier: Option<&'a str>,
    /// Poll tick, when emitted from a refresh loop.
    pub tick: Option<u64>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a container name.
    pub fn with_container(mut self, container: &'a str) -> Self {
        self.container = Some(container);
        self
    }

    /// Attach a process name.
    pub fn with_process(mut self, process: &'a str) -> Self {
        self.process = Some(process);
        self
    }

    /// Attach a remote identifier.
    pub fn with_identifier(mut self, identifier: &'a str) -> Self {
        self.identifier = Some(identifier);
        self
    }

    /// Attach a poll tick.
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }
}

/// Outcome attached to lifecycle events (setup, refresh, loop shutdown).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// The operation completed.
    Success,
    /// The operation failed and the entity kept its previous state.
    Fault,
}

impl LifecycleOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            LifecycleOutcome::Success => "success",
            LifecycleOutcome::Fault => "fault",
        }
    }
}

/// Emit a lifecycle event; faults are logged at WARN because callers always
/// receive the failure as a value as well.
pub fn log_lifecycle_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: LifecycleOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    match outcome {
        LifecycleOutcome::Success => tracing::event!(
            Level::INFO,
            event,
            outcome = outcome.as_str(),
            container = ctx.container.unwrap_or(""),
            process = ctx.process.unwrap_or(""),
            identifier = ctx.identifier.unwrap_or(""),
            tick = ctx.tick.unwrap_or_default(),
            message = %message
        ),
        LifecycleOutcome::Fault => tracing::event!(
            Level::WARN,
            event,
            outcome = outcome.as_str(),
            container = ctx.container.unwrap_or(""),
            process = ctx.process.unwrap_or(""),
            identifier = ctx.identifier.unwrap_or(""),
            tick = ctx.tick.unwrap_or_default(),
            message = %message
        ),
    }
}
