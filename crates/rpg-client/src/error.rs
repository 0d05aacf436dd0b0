//! ---
//! rpg_section: "02-client-core"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Error taxonomy for profile fetches and entity lifecycle."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failures surfaced by profile fetches and entity lifecycle checks.
///
/// Invocation failures are not represented here: a failed call yields `None`
/// and a warning in the log instead of an error value.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{target} is not a valid profile document: {source}")]
    Decode {
        target: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("request to {url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("{entity} used before setup() completed")]
    Uninitialized { entity: String },
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid default header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("unable to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ClientError {
    pub(crate) fn uninitialized(entity: impl Into<String>) -> Self {
        ClientError::Uninitialized {
            entity: entity.into(),
        }
    }

    /// True for transport and status failures, i.e. anything a later retry by the caller might fix.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Network { .. } | ClientError::Status { .. }
        )
    }
}
