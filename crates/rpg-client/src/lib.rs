//! ---
//! rpg_section: "02-client-core"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Discovery and invocation client for remote container/process graphs."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
//! Client for a remote system made of containers that host invokable processes.
//!
//! - [`RemoteProfileFetcher`] speaks the HTTP/JSON API.
//! - [`ContainerProcess`] is one invokable unit.
//! - [`Container`] groups processes and resolves them by type name.
//! - [`System`] is the root handle and resolves containers by type name.
//! - [`poll::RefreshLoop`] re-reads the system profile on a fixed interval.

pub mod container;
pub mod error;
pub mod fetcher;
pub mod poll;
pub mod process;
pub mod profile;
pub mod system;

#[cfg(test)]
mod testing;

pub use container::Container;
pub use error::{ClientError, Result};
pub use fetcher::{ProfileSource, RemoteProfileFetcher};
pub use poll::{LoopReport, RefreshLoop, TickHandler};
pub use process::ContainerProcess;
pub use profile::{
    ContainerProfile, Identifier, Payload, ProcessProfile, ProfileKind, Query, SystemProfile,
};
pub use system::System;
