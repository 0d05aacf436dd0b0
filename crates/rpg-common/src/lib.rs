//! ---
//! rpg_section: "01-common"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Shared configuration and tracing primitives."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
//! Shared primitives for the RPG workspace: client configuration loading and
//! tracing subscriber setup.

pub mod config;
pub mod logging;

pub use config::{ClientConfig, EndpointConfig, LoadedClientConfig, LoggingConfig, PollConfig};
pub use logging::{init_tracing, LogFormat};
