//! ---
//! rpg_section: "02-client-core"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "HTTP transport for profile reads and process invocation."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use rpg_common::config::EndpointConfig;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, Result};
use crate::profile::{Identifier, Payload, ProfileKind};

const PROFILE_FUNCTION: &str = "profile_full";
const LIST_FUNCTION: &str = "list";
const CALL_FUNCTION: &str = "call";
const EXECUTE_FUNCTION: &str = "execute";

/// Network operations the entity layer depends on.
///
/// Profile reads fail loudly. Invocations never fail: a call that did not
/// produce a 200 response resolves to `None`.
#[async_trait]
pub trait ProfileSource: Send + Sync + 'static {
    /// Read the profile document for `kind`, addressed by `identifier` when given.
    async fn fetch_profile(
        &self,
        kind: ProfileKind,
        identifier: Option<&Identifier>,
    ) -> Result<Value>;

    /// Read the server-side identifier list for `kind`.
    async fn list(&self, kind: ProfileKind) -> Result<Vec<Identifier>>;

    /// Call the process addressed by `identifier` with a JSON argument object.
    async fn invoke(&self, identifier: &Identifier, args: &Value) -> Option<Payload>;

    /// Run the process addressed by `identifier` with its stored arguments.
    async fn execute(&self, identifier: &Identifier) -> Option<Payload>;
}

/// [`ProfileSource`] speaking the HTTP/JSON API of the remote system.
#[derive(Debug, Clone)]
pub struct RemoteProfileFetcher {
    client: Client,
    api_root: String,
}

impl RemoteProfileFetcher {
    /// Fetcher for `base_url` with every other endpoint setting at its default.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(&EndpointConfig {
            base_url: base_url.into(),
            ..EndpointConfig::default()
        })
    }

    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)?;
        let api_root = format!(
            "{}{}",
            base.as_str().trim_end_matches('/'),
            config.api_prefix.trim_end_matches('/')
        );
        // Surface a malformed prefix now rather than on the first request.
        Url::parse(&api_root)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|err| ClientError::InvalidHeader {
                    name: name.clone(),
                    reason: err.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|err| ClientError::InvalidHeader {
                    name: name.clone(),
                    reason: err.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(ClientError::Client)?;

        debug!(api_root = %api_root, "remote profile fetcher configured");
        Ok(Self { client, api_root })
    }

    /// Root every route hangs off, e.g. `http://localhost:8080/api`.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub(crate) fn route(
        &self,
        kind: ProfileKind,
        function: &str,
        identifier: Option<&Identifier>,
    ) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/{}/{}",
            self.api_root,
            kind.class_name(),
            function
        ))?;
        if let Some(identifier) = identifier {
            url.query_pairs_mut()
                .append_pair("identifier", identifier.as_str());
        }
        Ok(url)
    }

    async fn read(&self, url: Url) -> Result<Value> {
        let target = url.to_string();
        debug!(url = %target, "reading remote document");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Network {
                url: target.clone(),
                source,
            })?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::Status {
                url: target,
                status,
            });
        }
        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Network {
                url: target.clone(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
            target,
            source,
        })
    }

    async fn patch(&self, function: &str, identifier: &Identifier, args: &Value) -> Option<Payload> {
        let url = match self.route(ProfileKind::ContainerProcess, function, Some(identifier)) {
            Ok(url) => url,
            Err(err) => {
                warn!(identifier = %identifier, error = %err, "unable to compose invocation url");
                return None;
            }
        };
        debug!(url = %url, "invoking remote process");

        let response = match self
            .client
            .patch(url)
            .header(ACCEPT, "*/*")
            .json(args)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(identifier = %identifier, function, error = %err, "invocation transport failure");
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!(identifier = %identifier, function, status = %status, "invocation rejected by server");
            return None;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(identifier = %identifier, function, error = %err, "invocation body could not be read");
                return None;
            }
        };

        if content_type.as_deref().is_some_and(is_json_media_type) {
            match serde_json::from_slice(&bytes) {
                Ok(value) => Some(Payload::Json(value)),
                Err(err) => {
                    warn!(identifier = %identifier, function, error = %err, "invocation returned malformed json");
                    None
                }
            }
        } else {
            Some(Payload::Binary {
                content_type,
                bytes,
            })
        }
    }
}

#[async_trait]
impl ProfileSource for RemoteProfileFetcher {
    async fn fetch_profile(
        &self,
        kind: ProfileKind,
        identifier: Option<&Identifier>,
    ) -> Result<Value> {
        let url = self.route(kind, PROFILE_FUNCTION, identifier)?;
        self.read(url).await
    }

    async fn list(&self, kind: ProfileKind) -> Result<Vec<Identifier>> {
        let url = self.route(kind, LIST_FUNCTION, None)?;
        let target = url.to_string();
        let document = self.read(url).await?;
        serde_json::from_value(document).map_err(|source| ClientError::Decode {
            target,
            source,
        })
    }

    async fn invoke(&self, identifier: &Identifier, args: &Value) -> Option<Payload> {
        self.patch(CALL_FUNCTION, identifier, args).await
    }

    async fn execute(&self, identifier: &Identifier) -> Option<Payload> {
        self.patch(EXECUTE_FUNCTION, identifier, &Value::Object(Default::default()))
            .await
    }
}

/// Compare on the media-type essence so `application/json; charset=utf-8` counts as JSON.
fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn json_media_type_ignores_parameters() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/json; charset=utf-8"));
        assert!(is_json_media_type("Application/JSON"));
        assert!(!is_json_media_type("text/plain"));
        assert!(!is_json_media_type("application/octet-stream"));
    }

    #[test]
    fn routes_include_prefix_and_encoded_identifier() {
        let fetcher = RemoteProfileFetcher::new("http://localhost:8080/").unwrap();
        assert_eq!(fetcher.api_root(), "http://localhost:8080/api");

        let url = fetcher
            .route(
                ProfileKind::ContainerProcess,
                PROFILE_FUNCTION,
                Some(&Identifier::from("core://core/ContainerProcess/get pose::turtle")),
            )
            .unwrap();
        assert_eq!(url.path(), "/api/container_process/profile_full");
        let pairs: Vec<_> = url.query_pairs().collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "identifier");
        assert_eq!(pairs[0].1, "core://core/ContainerProcess/get pose::turtle");
    }

    #[test]
    fn system_route_has_no_query() {
        let fetcher = RemoteProfileFetcher::new("http://127.0.0.1:3000").unwrap();
        let url = fetcher
            .route(ProfileKind::System, PROFILE_FUNCTION, None)
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/api/system/profile_full");
    }

    #[test]
    fn custom_prefix_is_respected() {
        let config = EndpointConfig {
            base_url: "http://10.0.0.5:8000".into(),
            api_prefix: "/juiz/api/".into(),
            ..EndpointConfig::default()
        };
        let fetcher = RemoteProfileFetcher::from_config(&config).unwrap();
        let url = fetcher
            .route(ProfileKind::Container, LIST_FUNCTION, None)
            .unwrap();
        assert_eq!(url.path(), "/juiz/api/container/list");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = RemoteProfileFetcher::new("not a url").unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn invalid_header_is_rejected() {
        let mut headers = IndexMap::new();
        headers.insert("bad header".to_string(), "value".to_string());
        let config = EndpointConfig {
            headers,
            ..EndpointConfig::default()
        };
        let err = RemoteProfileFetcher::from_config(&config).unwrap_err();
        assert!(matches!(err, ClientError::InvalidHeader { .. }));
    }
}
