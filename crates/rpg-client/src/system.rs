//! ---
//! rpg_section: "02-client-core"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Root handle resolving top-level containers."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use rpg_common::config::EndpointConfig;
use rpg_logging::{log_lifecycle_event, LifecycleOutcome};

use crate::container::Container;
use crate::error::{ClientError, Result};
use crate::fetcher::{ProfileSource, RemoteProfileFetcher};
use crate::profile::{Identifier, ProfileKind, Query, SystemProfile};

/// Root entry point to a remote system.
///
/// Containers are enumerated once and memoized. [`refresh`](Self::refresh)
/// swaps in a new profile while keeping already resolved containers whose
/// identifiers survive.
///
/// # Example
///
/// ```rust,no_run
/// use rpg_client::{Query, System};
/// use rpg_common::config::EndpointConfig;
///
/// # async fn example() -> rpg_client::Result<()> {
/// let mut system = System::connect(&EndpointConfig::default())?;
/// system.setup().await?;
///
/// if let Some(turtle) = system.container(&Query::by_type("turtle")).await? {
///     if let Some(get_pose) = turtle.process(&Query::by_type("get_pose")).await? {
///         let pose = get_pose.call(None).await;
///         println!("{pose:?}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct System {
    source: Arc<dyn ProfileSource>,
    profile: Option<SystemProfile>,
    containers: Option<Vec<Container>>,
}

impl System {
    pub fn new(source: Arc<dyn ProfileSource>) -> Self {
        Self {
            source,
            profile: None,
            containers: None,
        }
    }

    /// System backed by a [`RemoteProfileFetcher`] built from `config`.
    pub fn connect(config: &EndpointConfig) -> Result<Self> {
        let fetcher = RemoteProfileFetcher::from_config(config)?;
        Ok(Self::new(Arc::new(fetcher)))
    }

    pub fn source(&self) -> &Arc<dyn ProfileSource> {
        &self.source
    }

    async fn fetch(&self) -> Result<SystemProfile> {
        let document = self
            .source
            .fetch_profile(ProfileKind::System, None)
            .await?;
        SystemProfile::from_document(document).map_err(|source| ClientError::Decode {
            target: "system profile".to_owned(),
            source,
        })
    }

    /// Fetch the system profile. Any previously enumerated containers are dropped.
    pub async fn setup(&mut self) -> Result<&SystemProfile> {
        match self.fetch().await {
            Ok(profile) => {
                log_lifecycle_event(
                    None,
                    "system.setup",
                    &format!("{} container(s) declared", profile.containers.len()),
                    LifecycleOutcome::Success,
                );
                self.containers = None;
                Ok(&*self.profile.insert(profile))
            }
            Err(err) => {
                log_lifecycle_event(
                    None,
                    "system.setup",
                    &err.to_string(),
                    LifecycleOutcome::Fault,
                );
                Err(err)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.profile.is_some()
    }

    pub fn profile(&self) -> Result<&SystemProfile> {
        self.profile
            .as_ref()
            .ok_or_else(|| ClientError::uninitialized("system"))
    }

    pub fn container_ids(&self) -> Result<Vec<&Identifier>> {
        Ok(self.profile()?.container_ids().collect())
    }

    /// Containers in profile order, each set up. Built concurrently on first use.
    pub async fn containers(&mut self) -> Result<&mut [Container]> {
        if self.containers.is_none() {
            let ids: Vec<Identifier> = self.profile()?.container_ids().cloned().collect();
            let source = &self.source;
            let resolved = try_join_all(
                ids.into_iter()
                    .map(|id| Container::open(Arc::clone(source), id)),
            )
            .await?;
            self.containers = Some(resolved);
        }
        Ok(self.containers.as_deref_mut().unwrap_or_default())
    }

    /// First container whose type name equals the query's, in profile order.
    pub async fn container(&mut self, query: &Query) -> Result<Option<&mut Container>> {
        let Some(type_name) = query.type_name.as_deref() else {
            return Ok(None);
        };
        let containers = self.containers().await?;
        Ok(containers
            .iter_mut()
            .find(|c| c.type_name().is_ok_and(|t| t == type_name)))
    }

    /// Every container with the given type name, in profile order.
    pub async fn containers_by_type(&mut self, type_name: &str) -> Result<Vec<&mut Container>> {
        let containers = self.containers().await?;
        Ok(containers
            .iter_mut()
            .filter(|c| c.type_name().is_ok_and(|t| t == type_name))
            .collect())
    }

    /// Re-fetch the system profile and replace it.
    ///
    /// When containers were already enumerated, survivors keep their instance,
    /// newly listed identifiers are set up, and vanished ones are dropped. If
    /// anything fails, profile and containers are left exactly as they were.
    pub async fn refresh(&mut self) -> Result<&SystemProfile> {
        if !self.is_ready() {
            return Err(ClientError::uninitialized("system"));
        }

        let outcome = self.reconcile().await;
        match &outcome {
            Ok(count) => log_lifecycle_event(
                None,
                "system.refresh",
                &format!("{count} container(s) declared"),
                LifecycleOutcome::Success,
            ),
            Err(err) => log_lifecycle_event(
                None,
                "system.refresh",
                &err.to_string(),
                LifecycleOutcome::Fault,
            ),
        }
        outcome?;
        self.profile()
    }

    async fn reconcile(&mut self) -> Result<usize> {
        let profile = self.fetch().await?;
        let count = profile.containers.len();

        if let Some(cached) = self.containers.as_ref() {
            let known: HashSet<&Identifier> = cached.iter().map(Container::identifier).collect();
            let added: Vec<Identifier> = profile
                .container_ids()
                .filter(|id| !known.contains(id))
                .cloned()
                .collect();
            let source = &self.source;
            let fresh = try_join_all(
                added
                    .into_iter()
                    .map(|id| Container::open(Arc::clone(source), id)),
            )
            .await?;

            let mut pool: HashMap<Identifier, Container> = self
                .containers
                .take()
                .unwrap_or_default()
                .into_iter()
                .chain(fresh)
                .map(|c| (c.identifier().clone(), c))
                .collect();
            let ordered = profile
                .container_ids()
                .filter_map(|id| pool.remove(id))
                .collect();
            self.containers = Some(ordered);
        }

        self.profile = Some(profile);
        Ok(count)
    }

    /// Identifiers reported by the server's container list endpoint.
    pub async fn list_containers(&self) -> Result<Vec<Identifier>> {
        self.source.list(ProfileKind::Container).await
    }

    /// Identifiers reported by the server's process list endpoint.
    pub async fn list_processes(&self) -> Result<Vec<Identifier>> {
        self.source.list(ProfileKind::ContainerProcess).await
    }
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("profile", &self.profile)
            .field("containers", &self.containers)
            .finish()
    }
}
