//! ---
//! rpg_section: "02-client-core"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "A single remotely invokable process."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use std::fmt;
use std::sync::Arc;

use rpg_logging::{rpg_debug, LogContext};
use serde_json::{Map, Value};

use crate::error::{ClientError, Result};
use crate::fetcher::ProfileSource;
use crate::profile::{Identifier, Payload, ProcessProfile, ProfileKind};

/// Handle to one remote process.
///
/// Cloning is cheap and clones share the transport. Results of calls are
/// never cached here; callers that need a last-known value keep it themselves.
#[derive(Clone)]
pub struct ContainerProcess {
    source: Arc<dyn ProfileSource>,
    identifier: Identifier,
    profile: Option<ProcessProfile>,
}

impl ContainerProcess {
    /// Create a handle in the uninitialized state. Call [`setup`](Self::setup) before use.
    pub fn new(source: Arc<dyn ProfileSource>, identifier: Identifier) -> Self {
        Self {
            source,
            identifier,
            profile: None,
        }
    }

    /// Create a handle and run `setup` on it.
    pub async fn open(source: Arc<dyn ProfileSource>, identifier: Identifier) -> Result<Self> {
        let mut process = Self::new(source, identifier);
        process.setup().await?;
        Ok(process)
    }

    /// Fetch the process profile, replacing any previous one.
    ///
    /// On failure the previously fetched profile, if any, stays in place.
    pub async fn setup(&mut self) -> Result<&ProcessProfile> {
        let document = self
            .source
            .fetch_profile(ProfileKind::ContainerProcess, Some(&self.identifier))
            .await?;
        let profile: ProcessProfile =
            serde_json::from_value(document).map_err(|source| ClientError::Decode {
                target: format!("container_process profile '{}'", self.identifier),
                source,
            })?;
        rpg_debug!(
            context = LogContext::new()
                .with_process(&profile.type_name)
                .with_identifier(self.identifier.as_str()),
            "process profile fetched"
        );
        Ok(&*self.profile.insert(profile))
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn is_ready(&self) -> bool {
        self.profile.is_some()
    }

    pub fn profile(&self) -> Result<&ProcessProfile> {
        self.profile.as_ref().ok_or_else(|| {
            ClientError::uninitialized(format!("container process '{}'", self.identifier))
        })
    }

    pub fn type_name(&self) -> Result<&str> {
        Ok(self.profile()?.type_name.as_str())
    }

    /// Invoke the process with `args`, or with `{}` when none are given.
    ///
    /// Exactly one request is sent. `None` means the call failed; the reason
    /// has already been logged by the transport.
    pub async fn call(&self, args: Option<&Value>) -> Option<Payload> {
        let empty = Value::Object(Map::new());
        let args = args.unwrap_or(&empty);
        let result = self.source.invoke(&self.identifier, args).await;
        if result.is_none() {
            let process = self.profile.as_ref().map(|p| p.type_name.as_str()).unwrap_or("");
            rpg_debug!(
                context = LogContext::new()
                    .with_process(process)
                    .with_identifier(self.identifier.as_str()),
                "call produced no result"
            );
        }
        result
    }

    /// Run the process with the arguments it already holds on the server.
    pub async fn execute(&self) -> Option<Payload> {
        self.source.execute(&self.identifier).await
    }
}

impl fmt::Debug for ContainerProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerProcess")
            .field("identifier", &self.identifier)
            .field("profile", &self.profile)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubSource;
    use serde_json::json;

    fn stub() -> Arc<StubSource> {
        Arc::new(
            StubSource::new()
                .with_process("p1", json!({"type_name": "get_pose"}))
                .with_call_result("p1", Payload::Json(json!([12, [1.0, 2.0, 0.5]]))),
        )
    }

    #[tokio::test]
    async fn type_name_requires_setup() {
        let process = ContainerProcess::new(stub(), "p1".into());
        assert!(!process.is_ready());
        assert!(matches!(
            process.type_name(),
            Err(ClientError::Uninitialized { .. })
        ));
    }

    #[tokio::test]
    async fn setup_caches_profile() {
        let process = ContainerProcess::open(stub(), "p1".into()).await.unwrap();
        assert!(process.is_ready());
        assert_eq!(process.type_name().unwrap(), "get_pose");
    }

    #[tokio::test]
    async fn setup_twice_keeps_latest_profile() {
        let source = stub();
        let mut process = ContainerProcess::open(source.clone(), "p1".into())
            .await
            .unwrap();
        source.set_process("p1", json!({"type_name": "get_pose_v2"}));
        process.setup().await.unwrap();
        assert_eq!(process.type_name().unwrap(), "get_pose_v2");
        assert_eq!(source.profile_fetches(), 2);
    }

    #[tokio::test]
    async fn failed_setup_keeps_previous_profile() {
        let source = stub();
        let mut process = ContainerProcess::open(source.clone(), "p1".into())
            .await
            .unwrap();
        source.set_process("p1", json!({"no_type_name": true}));
        let err = process.setup().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
        assert_eq!(process.type_name().unwrap(), "get_pose");
    }

    #[tokio::test]
    async fn call_defaults_to_empty_object() {
        let source = stub();
        let process = ContainerProcess::open(source.clone(), "p1".into())
            .await
            .unwrap();
        let result = process.call(None).await;
        assert_eq!(result, Some(Payload::Json(json!([12, [1.0, 2.0, 0.5]]))));
        assert_eq!(source.invocations(), vec![(Identifier::from("p1"), json!({}))]);
    }

    #[tokio::test]
    async fn call_forwards_arguments_untouched() {
        let source = stub();
        let process = ContainerProcess::open(source.clone(), "p1".into())
            .await
            .unwrap();
        let args = json!({"target_velocity": {"vx": 0.1, "vy": 0.0, "wz": 0.05}});
        process.call(Some(&args)).await;
        process.call(Some(&args)).await;
        let sent = source.invocations();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(_, body)| body == &args));
    }

    #[tokio::test]
    async fn call_without_result_is_none() {
        let source = Arc::new(StubSource::new().with_process("p2", json!({"type_name": "x"})));
        let process = ContainerProcess::open(source, "p2".into()).await.unwrap();
        assert_eq!(process.call(None).await, None);
    }
}
