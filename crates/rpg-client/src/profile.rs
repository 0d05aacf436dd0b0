//! ---
//! rpg_section: "02-client-core"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Profile documents, identifiers, lookup queries and invocation payloads."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use std::fmt;

use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque key addressing a container or process on the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The three profile-bearing entity kinds exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    System,
    Container,
    ContainerProcess,
}

impl ProfileKind {
    /// Route segment used by the server for this kind.
    pub fn class_name(&self) -> &'static str {
        match self {
            ProfileKind::System => "system",
            ProfileKind::Container => "container",
            ProfileKind::ContainerProcess => "container_process",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Lookup criterion used to pick one container or process among siblings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub type_name: Option<String>,
}

impl Query {
    /// Match on an exact type name.
    pub fn by_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
        }
    }

    /// A query without criteria. Lookups with it always resolve to nothing.
    pub fn any() -> Self {
        Self::default()
    }
}

/// Root profile. Only the container mapping is interpreted; the rest of the
/// document is kept verbatim in `document`.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemProfile {
    /// Container identifiers in the order the server listed them.
    pub containers: IndexMap<Identifier, Value>,
    pub document: Value,
}

impl SystemProfile {
    /// Interpret a raw system document.
    ///
    /// The mapping is read from `containers`, falling back to
    /// `core_store.containers`. A document carrying neither yields no containers.
    pub fn from_document(document: Value) -> Result<Self, serde_json::Error> {
        let mapping = document
            .get("containers")
            .or_else(|| document.get("core_store").and_then(|s| s.get("containers")));
        let containers = match mapping {
            None | Some(Value::Null) => IndexMap::new(),
            Some(mapping) => IndexMap::<Identifier, Value>::deserialize(mapping)?,
        };
        Ok(Self {
            containers,
            document,
        })
    }

    pub fn container_ids(&self) -> impl Iterator<Item = &Identifier> {
        self.containers.keys()
    }
}

/// Profile of a single container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerProfile {
    pub type_name: String,
    #[serde(default)]
    pub processes: Vec<Identifier>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Profile of a single container process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessProfile {
    pub type_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decoded body of a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Binary {
        content_type: Option<String>,
        bytes: Bytes,
    },
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Binary { .. } => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Binary { .. } => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Payload::Json(_) => None,
            Payload::Binary { bytes, .. } => Some(bytes),
        }
    }
}
