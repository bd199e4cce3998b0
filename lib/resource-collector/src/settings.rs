use std::path::Path;
use std::time::Duration;

use catalog_client::auth::AUTH_ENDPOINT;
use catalog_client::client::DEFAULT_WRITE_TIMEOUT;
use catalog_client::{Client, ClientCredentials, TokenProvider};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::errors::{SyncError, SyncResult};

/// Prefix of the defaults that signal a setting was never provided.
pub const PLACEHOLDER_PREFIX: &str = "MUST_SET_";

const ENV_KEYS: [&str; 9] = [
    "AUTH_ENDPOINT",
    "CATALOG_ENDPOINT",
    "CATALOG_TIMEOUT_SECS",
    "CLIENT_ID",
    "CLIENT_SECRET",
    "CROSS_ACCOUNT_IAM_ROLE_NAME",
    "EVENT_BUS_NAME",
    "SERVICE_NAME",
    "SQS_QUEUE_URL",
];

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Settings {
    pub catalog_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_endpoint: String,
    pub catalog_timeout_secs: u64,
    pub cross_account_iam_role_name: String,
    pub sqs_queue_url: String,
    pub event_bus_name: String,
    pub service_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_endpoint: "MUST_SET_CATALOG_ENDPOINT".to_string(),
            client_id: "MUST_SET_CLIENT_ID".to_string(),
            client_secret: "MUST_SET_CLIENT_SECRET".to_string(),
            auth_endpoint: AUTH_ENDPOINT.to_string(),
            catalog_timeout_secs: DEFAULT_WRITE_TIMEOUT.as_secs(),
            cross_account_iam_role_name: String::new(),
            sqs_queue_url: "MUST_SET_SQS_QUEUE_URL".to_string(),
            event_bus_name: "MUST_SET_EVENT_BUS_NAME".to_string(),
            service_name: "MUST_SET_SERVICE_NAME".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then the optional TOML file, then the process environment.
    pub fn figment(config: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = config {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::raw().only(&ENV_KEYS))
    }

    pub fn load(config: Option<&Path>) -> SyncResult<Self> {
        Ok(Self::figment(config).extract()?)
    }

    /// Settings needed to talk to the catalog.
    pub fn validate(&self) -> SyncResult<()> {
        require("CATALOG_ENDPOINT", &self.catalog_endpoint)?;
        require("CLIENT_ID", &self.client_id)?;
        require("CLIENT_SECRET", &self.client_secret)?;
        require("AUTH_ENDPOINT", &self.auth_endpoint)
    }

    pub fn validate_entity_queue(&self) -> SyncResult<()> {
        require("SQS_QUEUE_URL", &self.sqs_queue_url)
    }

    pub fn validate_event_bus(&self) -> SyncResult<()> {
        require("EVENT_BUS_NAME", &self.event_bus_name)?;
        require("SERVICE_NAME", &self.service_name)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials::new(&self.client_id, &self.client_secret)
    }

    pub fn token_provider(&self) -> SyncResult<TokenProvider> {
        let tokens = TokenProvider::new(self.credentials())?
            .with_endpoint(&self.auth_endpoint)
            .with_timeout(self.catalog_timeout())?;

        Ok(tokens)
    }

    pub fn catalog_client(&self) -> SyncResult<Client> {
        let client = Client::builder(&self.catalog_endpoint, self.token_provider()?)?
            .with_read_timeout(self.catalog_timeout())
            .with_write_timeout(self.catalog_timeout())
            .build()?;

        Ok(client)
    }
}

fn require(key: &'static str, value: &str) -> SyncResult<()> {
    if value.trim().is_empty() || value.starts_with(PLACEHOLDER_PREFIX) {
        return Err(SyncError::MissingSetting { key });
    }

    Ok(())
}
