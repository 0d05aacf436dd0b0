//! ---
//! rpg_section: "04-test-harness"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "In-process fake of the remote system HTTP API."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
//! A fake remote system served over real HTTP on `127.0.0.1:0`.
//!
//! Profiles and call responses are canned per identifier, every invocation
//! request is recorded, and fixtures can be swapped while the server runs.

pub mod fixtures;
pub mod server;

pub use server::{CannedResponse, FakeServer, FakeServerHandle, RecordedCall};
