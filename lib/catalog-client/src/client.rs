use std::time::Duration;

use http::Method;
use reqwest::blocking::RequestBuilder;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use software_catalog::entity::DEFAULT_NAMESPACE;
use software_catalog::{Entity, Kind, UNKNOWN};
use tracing::{debug, error};
use url::Url;

use crate::auth::TokenProvider;
use crate::errors::{CatalogError, CatalogResult, RequestFailure};
use crate::support;

const DEFAULT_CLIENT_AGENT: &str = "resource-collector";

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct Response<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: T,
}

impl<T> Response<T> {
    pub fn new(status: StatusCode, headers: HeaderMap, body: T) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }
}

/// Write side of the catalog. Both operations are keyed on the entity's
/// namespace, kind and name so repeating them is safe.
pub trait Catalog {
    /// Create or replace `entity`.
    fn upsert(&self, entity: &Entity) -> CatalogResult<()>;

    fn delete(&self, entity: &Entity) -> CatalogResult<()>;
}

impl<T: Catalog + ?Sized> Catalog for &T {
    fn upsert(&self, entity: &Entity) -> CatalogResult<()> {
        (**self).upsert(entity)
    }

    fn delete(&self, entity: &Entity) -> CatalogResult<()> {
        (**self).delete(entity)
    }
}

/// The subset of a catalog `System` entity needed to find its owner.
#[derive(Debug, Default, Deserialize)]
pub struct SystemRecord {
    #[serde(default)]
    pub spec: SystemSpec,
}

#[derive(Debug, Default, Deserialize)]
pub struct SystemSpec {
    #[serde(default)]
    pub owner: Option<String>,
}

impl SystemRecord {
    pub fn owner(&self) -> &str {
        self.spec.owner.as_deref().unwrap_or(UNKNOWN)
    }
}

/// Entrypoint for interacting with the catalog API.
#[derive(Clone, Debug)]
pub struct Client {
    host: String,
    agent: String,
    http: reqwest::blocking::Client,
    tokens: TokenProvider,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl Client {
    pub fn builder<H: Into<String>>(host: H, tokens: TokenProvider) -> CatalogResult<ClientBuilder> {
        ClientBuilder::new(host, tokens)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    pub fn url(&self, segments: &[&str]) -> String {
        let path = segments
            .iter()
            .map(|s| support::encode_path(s))
            .collect::<Vec<_>>()
            .join("/");

        format!("{}/{}", self.host, path)
    }

    pub fn entity_url(&self, entity: &Entity) -> String {
        let [namespace, kind, name] = entity.path_segments();
        self.url(&[&namespace, &kind, &name])
    }

    /// `GET {catalog}/default/system/{system}`
    pub fn get_system(&self, system: &str) -> CatalogResult<SystemRecord> {
        let url = self.url(&[DEFAULT_NAMESPACE, &Kind::System.path_segment(), system]);
        let request = self.make_request(Method::GET, &url, self.read_timeout)?;

        let lookup_failed = |failure: RequestFailure| {
            error!(
                system,
                status = ?failure.status,
                response = %failure.body,
                "Failed to get system owner"
            );
            CatalogError::SystemOwnerLookup {
                system: system.to_string(),
                status: failure.status,
                body: failure.body,
            }
        };

        let response = self.execute(request).map_err(lookup_failed)?;
        serde_json::from_str(&response.body).map_err(|e| {
            lookup_failed(RequestFailure {
                status: Some(response.status),
                body: format!("{e}: {}", response.body),
            })
        })
    }

    /// `PUT {catalog}/{namespace}/{kind}/{name}` with the entity as the JSON body.
    pub fn put_entity(&self, entity: &Entity) -> CatalogResult<Response<String>> {
        let url = self.entity_url(entity);
        let request = self
            .make_request(Method::PUT, &url, self.write_timeout)?
            .header(http::header::CONTENT_TYPE, "application/json")
            .json(entity);

        let response = self.execute(request).map_err(|failure| {
            error!(
                entity = %entity.title(),
                status = ?failure.status,
                response = %failure.body,
                "Failed to add entity to catalog"
            );
            CatalogError::Write {
                title: entity.title().to_string(),
                status: failure.status,
                body: failure.body,
            }
        })?;

        debug!(entity = %entity.name(), status = %response.status, "Entity written to catalog");
        Ok(response)
    }

    /// `DELETE {catalog}/{namespace}/{kind}/{name}`
    pub fn delete_entity(&self, entity: &Entity) -> CatalogResult<Response<String>> {
        let url = self.entity_url(entity);
        let request = self.make_request(Method::DELETE, &url, self.write_timeout)?;

        let response = self.execute(request).map_err(|failure| {
            error!(
                entity = %entity.title(),
                status = ?failure.status,
                response = %failure.body,
                "Failed to remove entity from catalog"
            );
            CatalogError::Delete {
                title: entity.title().to_string(),
                status: failure.status,
                body: failure.body,
            }
        })?;

        debug!(entity = %entity.name(), status = %response.status, "Entity removed from catalog");
        Ok(response)
    }

    fn make_request(
        &self,
        method: Method,
        uri: &str,
        timeout: Duration,
    ) -> CatalogResult<RequestBuilder> {
        let url = Url::parse(uri)?;

        let request = self
            .http
            .request(method, url)
            .header(http::header::USER_AGENT, &*self.agent)
            .header(http::header::ACCEPT, "application/json")
            .timeout(timeout);

        self.tokens.authorize(request)
    }

    fn execute(&self, request: RequestBuilder) -> Result<Response<String>, RequestFailure> {
        let response = request.send()?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text()?;

        if status.is_success() {
            debug!(%status, "Received successful response");
            Ok(Response::new(status, headers, body))
        } else {
            let body = if body.is_empty() {
                "empty response".to_string()
            } else {
                body
            };

            Err(RequestFailure {
                status: Some(status),
                body,
            })
        }
    }
}

impl Catalog for Client {
    fn upsert(&self, entity: &Entity) -> CatalogResult<()> {
        self.put_entity(entity).map(|_| ())
    }

    fn delete(&self, entity: &Entity) -> CatalogResult<()> {
        self.delete_entity(entity).map(|_| ())
    }
}

pub struct ClientBuilder {
    host: String,
    agent: String,
    http: reqwest::blocking::Client,
    tokens: TokenProvider,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl ClientBuilder {
    pub fn new<H: Into<String>>(host: H, tokens: TokenProvider) -> CatalogResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            host: host.into().trim_end_matches('/').to_string(),
            agent: format!("{}/{}", DEFAULT_CLIENT_AGENT, env!("CARGO_PKG_VERSION")),
            http,
            tokens,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        })
    }

    pub fn with_agent(mut self, agent: &str) -> Self {
        self.agent = agent.to_string();
        self
    }

    pub fn with_http(mut self, http: reqwest::blocking::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn build(self) -> CatalogResult<Client> {
        Url::parse(&self.host)?;

        Ok(Client {
            host: self.host,
            agent: self.agent,
            http: self.http,
            tokens: self.tokens,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use software_catalog::{Entity, EntitySpec, Metadata};

    use crate::auth::{ClientCredentials, TokenProvider};
    use crate::client::{Client, SystemRecord};
    use crate::CatalogError;

    fn client(host: &str) -> Client {
        let tokens = TokenProvider::new(ClientCredentials::new("id", "secret")).unwrap();
        Client::builder(host, tokens).unwrap().build().unwrap()
    }

    #[test]
    fn entity_url() {
        let entity = Entity::new(
            Metadata {
                namespace: "123456789012".to_string(),
                name: "ecs-cluster-api".to_string(),
                title: "api".to_string(),
                description: String::new(),
                annotations: BTreeMap::new(),
                links: None,
                extra: BTreeMap::new(),
            },
            EntitySpec::default(),
        );

        assert_eq!(
            "https://catalog.example.com/api/catalog/123456789012/resource/ecs-cluster-api",
            client("https://catalog.example.com/api/catalog/").entity_url(&entity)
        );
    }

    #[test]
    fn invalid_host() {
        let tokens = TokenProvider::new(ClientCredentials::new("id", "secret")).unwrap();
        let result = Client::builder("MUST_SET_CATALOG_ENDPOINT", tokens)
            .unwrap()
            .build();

        assert!(matches!(result, Err(CatalogError::UrlParserError(_))));
    }

    #[test]
    fn system_owner_defaults_to_unknown() {
        let record: SystemRecord = serde_json::from_str(r#"{"kind": "System"}"#).unwrap();
        assert_eq!("UNKNOWN", record.owner());

        let record: SystemRecord =
            serde_json::from_str(r#"{"spec": {"owner": "team-payments"}}"#).unwrap();
        assert_eq!("team-payments", record.owner());
    }
}
