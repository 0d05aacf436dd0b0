//! ---
//! rpg_section: "02-client-core"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "test"
//! rpg_description: "In-memory profile source for unit tests."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::fetcher::ProfileSource;
use crate::profile::{Identifier, Payload, ProfileKind};

type ProfileKey = (ProfileKind, Option<Identifier>);

#[derive(Default)]
pub(crate) struct StubSource {
    profiles: Mutex<HashMap<ProfileKey, Value>>,
    lists: Mutex<HashMap<ProfileKind, Vec<Identifier>>>,
    results: Mutex<HashMap<Identifier, Payload>>,
    delays: HashMap<Identifier, Duration>,
    fetches: AtomicUsize,
    invocations: Mutex<Vec<(Identifier, Value)>>,
}

impl StubSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_system(self, document: Value) -> Self {
        self.set_system(document);
        self
    }

    pub(crate) fn with_container(self, id: &str, document: Value) -> Self {
        self.set_container(id, document);
        self
    }

    pub(crate) fn with_process(self, id: &str, document: Value) -> Self {
        self.set_process(id, document);
        self
    }

    pub(crate) fn with_list(self, kind: ProfileKind, ids: &[&str]) -> Self {
        self.lists
            .lock()
            .insert(kind, ids.iter().map(|id| Identifier::from(*id)).collect());
        self
    }

    pub(crate) fn with_call_result(self, id: &str, payload: Payload) -> Self {
        self.results.lock().insert(id.into(), payload);
        self
    }

    /// Delay profile responses for `id`, to make completion order differ from request order.
    pub(crate) fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.into(), delay);
        self
    }

    pub(crate) fn set_system(&self, document: Value) {
        self.profiles
            .lock()
            .insert((ProfileKind::System, None), document);
    }

    pub(crate) fn set_container(&self, id: &str, document: Value) {
        self.profiles
            .lock()
            .insert((ProfileKind::Container, Some(id.into())), document);
    }

    pub(crate) fn set_process(&self, id: &str, document: Value) {
        self.profiles
            .lock()
            .insert((ProfileKind::ContainerProcess, Some(id.into())), document);
    }

    pub(crate) fn remove_system(&self) {
        self.profiles.lock().remove(&(ProfileKind::System, None));
    }

    pub(crate) fn profile_fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn invocations(&self) -> Vec<(Identifier, Value)> {
        self.invocations.lock().clone()
    }
}

#[async_trait]
impl ProfileSource for StubSource {
    async fn fetch_profile(
        &self,
        kind: ProfileKind,
        identifier: Option<&Identifier>,
    ) -> Result<Value> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = identifier.and_then(|id| self.delays.get(id)) {
            tokio::time::sleep(*delay).await;
        }
        let key = (kind, identifier.cloned());
        let document = self.profiles.lock().get(&key).cloned();
        document.ok_or_else(|| ClientError::Status {
            url: format!(
                "stub://{}/{}",
                kind,
                identifier.map(Identifier::as_str).unwrap_or("")
            ),
            status: StatusCode::NOT_FOUND,
        })
    }

    async fn list(&self, kind: ProfileKind) -> Result<Vec<Identifier>> {
        Ok(self.lists.lock().get(&kind).cloned().unwrap_or_default())
    }

    async fn invoke(&self, identifier: &Identifier, args: &Value) -> Option<Payload> {
        self.invocations
            .lock()
            .push((identifier.clone(), args.clone()));
        self.results.lock().get(identifier).cloned()
    }

    async fn execute(&self, identifier: &Identifier) -> Option<Payload> {
        self.invoke(identifier, &Value::Object(Default::default()))
            .await
    }
}
