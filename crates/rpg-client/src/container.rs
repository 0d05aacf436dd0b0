//! ---
//! rpg_section: "02-client-core"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "A group of processes resolved by type name."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use rpg_logging::{log_lifecycle_event, LifecycleOutcome, LogContext};

use crate::error::{ClientError, Result};
use crate::fetcher::ProfileSource;
use crate::process::ContainerProcess;
use crate::profile::{ContainerProfile, Identifier, ProfileKind, Query};

/// Handle to one remote container and, once enumerated, its processes.
///
/// The process list is built on the first call to [`processes`](Self::processes)
/// and reused afterwards; [`setup`](Self::setup) discards it.
pub struct Container {
    source: Arc<dyn ProfileSource>,
    identifier: Identifier,
    profile: Option<ContainerProfile>,
    processes: Option<Vec<ContainerProcess>>,
}

impl Container {
    pub fn new(source: Arc<dyn ProfileSource>, identifier: Identifier) -> Self {
        Self {
            source,
            identifier,
            profile: None,
            processes: None,
        }
    }

    /// Create a handle and run `setup` on it.
    pub async fn open(source: Arc<dyn ProfileSource>, identifier: Identifier) -> Result<Self> {
        let mut container = Self::new(source, identifier);
        container.setup().await?;
        Ok(container)
    }

    /// Fetch the container profile and drop any previously enumerated processes.
    pub async fn setup(&mut self) -> Result<&ContainerProfile> {
        let fetched = self
            .source
            .fetch_profile(ProfileKind::Container, Some(&self.identifier))
            .await
            .and_then(|document| {
                serde_json::from_value::<ContainerProfile>(document).map_err(|source| {
                    ClientError::Decode {
                        target: format!("container profile '{}'", self.identifier),
                        source,
                    }
                })
            });

        match fetched {
            Ok(profile) => {
                log_lifecycle_event(
                    Some(
                        &LogContext::new()
                            .with_container(&profile.type_name)
                            .with_identifier(self.identifier.as_str()),
                    ),
                    "container.setup",
                    &format!("{} process(es) declared", profile.processes.len()),
                    LifecycleOutcome::Success,
                );
                self.processes = None;
                Ok(&*self.profile.insert(profile))
            }
            Err(err) => {
                log_lifecycle_event(
                    Some(&LogContext::new().with_identifier(self.identifier.as_str())),
                    "container.setup",
                    &err.to_string(),
                    LifecycleOutcome::Fault,
                );
                Err(err)
            }
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn is_ready(&self) -> bool {
        self.profile.is_some()
    }

    pub fn profile(&self) -> Result<&ContainerProfile> {
        self.profile
            .as_ref()
            .ok_or_else(|| ClientError::uninitialized(format!("container '{}'", self.identifier)))
    }

    pub fn type_name(&self) -> Result<&str> {
        Ok(self.profile()?.type_name.as_str())
    }

    /// Processes in the order the profile declares them, each set up.
    ///
    /// Profiles are fetched concurrently on first use; any failure fails the
    /// whole enumeration and nothing is cached.
    pub async fn processes(&mut self) -> Result<&[ContainerProcess]> {
        if self.processes.is_none() {
            let ids = self.profile()?.processes.clone();
            let source = &self.source;
            let resolved = try_join_all(
                ids.into_iter()
                    .map(|id| ContainerProcess::open(Arc::clone(source), id)),
            )
            .await?;
            self.processes = Some(resolved);
        }
        Ok(self.processes.as_deref().unwrap_or_default())
    }

    /// First process whose type name equals the query's, in declaration order.
    ///
    /// A query without a type name resolves to `None` without touching the network.
    pub async fn process(&mut self, query: &Query) -> Result<Option<&ContainerProcess>> {
        let Some(type_name) = query.type_name.as_deref() else {
            return Ok(None);
        };
        let processes = self.processes().await?;
        Ok(processes
            .iter()
            .find(|p| p.type_name().is_ok_and(|t| t == type_name)))
    }

    /// Every process with the given type name, in declaration order.
    pub async fn processes_by_type(&mut self, type_name: &str) -> Result<Vec<&ContainerProcess>> {
        let processes = self.processes().await?;
        Ok(processes
            .iter()
            .filter(|p| p.type_name().is_ok_and(|t| t == type_name))
            .collect())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("identifier", &self.identifier)
            .field("profile", &self.profile)
            .field("processes", &self.processes)
            .finish()
    }
}
