use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::blocking::RequestBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::client::DEFAULT_READ_TIMEOUT;
use crate::errors::{CatalogError, CatalogResult};

pub const AUTH_ENDPOINT: &str = "https://auth.serverlessops.io/oauth2/token";

/// Seconds subtracted from the `expires_in` returned by the token endpoint so
/// the token is refreshed before it actually expires.
pub const GRACE_PERIOD_SECS: i64 = 120;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// OAuth2 client credentials used for the `client_credentials` grant.
#[derive(Clone, PartialEq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new<I: Into<String>, S: Into<String>>(client_id: I, client_secret: S) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"*".repeat(self.client_secret.len()))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,

    #[serde(default)]
    pub token_type: String,

    #[serde(default)]
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct BearerToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    /// A token issued at `issued_at`. When `expires_in` is shorter than the grace
    /// period the token is stale immediately and will be refetched on every use.
    pub fn new(access_token: AccessToken, issued_at: DateTime<Utc>) -> Self {
        let lifetime = access_token.expires_in.saturating_sub(GRACE_PERIOD_SECS);
        let expires_at = if lifetime <= 0 {
            issued_at
        } else {
            TimeDelta::try_seconds(lifetime)
                .and_then(|d| issued_at.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        };

        Self {
            token: access_token.access_token,
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("token", &"*".repeat(self.token.len()))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Client credentials token exchange, performed lazily and cached until shortly
/// before the token expires.
///
/// The catalog client methods are all `&self` while the token changes over time,
/// so the cache sits behind a `Mutex` for interior mutability. Clones share the
/// same cache.
#[derive(Clone)]
pub struct TokenProvider {
    endpoint: String,
    credentials: ClientCredentials,
    http: reqwest::blocking::Client,
    clock: Arc<dyn Clock>,
    cache: Arc<Mutex<Option<BearerToken>>>,
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl TokenProvider {
    pub fn new(credentials: ClientCredentials) -> CatalogResult<Self> {
        let http = http_client(DEFAULT_READ_TIMEOUT)?;

        Ok(Self {
            endpoint: AUTH_ENDPOINT.to_string(),
            credentials,
            http,
            clock: Arc::new(SystemClock),
            cache: Arc::new(Mutex::new(None)),
        })
    }

    pub fn with_endpoint<E: Into<String>>(mut self, endpoint: E) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_http(mut self, http: reqwest::blocking::Client) -> Self {
        self.http = http;
        self
    }

    /// Bound each token exchange by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> CatalogResult<Self> {
        self.http = http_client(timeout)?;
        Ok(self)
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Attach `Authorization: Bearer <token>` to `request`, refreshing the token first if needed.
    pub fn authorize(&self, request: RequestBuilder) -> CatalogResult<RequestBuilder> {
        let token = self.ensure_valid()?;
        Ok(request.bearer_auth(token))
    }

    /// Return a valid token, fetching a new one only when none is cached or the
    /// cached one is within the grace period of expiring.
    pub fn ensure_valid(&self) -> CatalogResult<String> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(token) = cache.as_ref() {
            if !token.is_stale_at(self.clock.now()) {
                return Ok(token.token.clone());
            }
            debug!(expires_at = %token.expires_at, "Catalog access token is stale");
        }

        let token = self.fetch()?;
        let value = token.token.clone();
        *cache = Some(token);

        Ok(value)
    }

    /// Drop the cached token so the next call performs a new exchange.
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn fetch(&self) -> CatalogResult<BearerToken> {
        debug!(endpoint = %self.endpoint, "Requesting catalog access token");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.endpoint)
            .header(http::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .map_err(|e| {
                error!(error = %e, "Failed to request JWT token");
                CatalogError::Authentication {
                    status: e.status(),
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            error!(%status, response = %body, "Failed to request JWT token");
            return Err(CatalogError::Authentication {
                status: Some(status),
                reason: format!("token endpoint returned {status}"),
            });
        }

        let access_token: AccessToken = response.json().map_err(|e| {
            error!(error = %e, "Failed to read JWT token response");
            CatalogError::Authentication {
                status: Some(status),
                reason: e.to_string(),
            }
        })?;

        let token = BearerToken::new(access_token, self.clock.now());
        debug!(expires_at = %token.expires_at, "Received catalog access token");

        Ok(token)
    }
}

fn http_client(timeout: Duration) -> CatalogResult<reqwest::blocking::Client> {
    let http = reqwest::blocking::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .build()?;

    Ok(http)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use test_case::test_case;
    use tracing_test::traced_test;

    use crate::auth::{AccessToken, BearerToken, ClientCredentials, TokenProvider};
    use crate::CatalogError;

    fn access_token(expires_in: i64) -> AccessToken {
        AccessToken {
            access_token: "abc".to_string(),
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }

    #[test_case(600, 479 => false; "before grace adjusted expiry")]
    #[test_case(600, 480 => true; "at grace adjusted expiry")]
    #[test_case(600, 600 => true; "at nominal expiry")]
    #[test_case(60, 0 => true; "shorter than grace period")]
    #[test_case(0, 0 => true; "missing expires_in")]
    #[test_case(i64::MIN, 0 => true; "negative expires_in")]
    fn stale(expires_in: i64, elapsed_secs: i64) -> bool {
        let issued_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let token = BearerToken::new(access_token(expires_in), issued_at);
        token.is_stale_at(issued_at + chrono::TimeDelta::seconds(elapsed_secs))
    }

    #[test]
    fn huge_expires_in_does_not_overflow() {
        let issued_at = Utc::now();
        let token = BearerToken::new(access_token(i64::MAX), issued_at);
        assert!(!token.is_stale_at(issued_at));
    }

    #[test]
    fn debug_redacts_secrets() {
        let credentials = ClientCredentials::new("client-1", "s3cr3t");
        let output = format!("{credentials:?}");
        assert!(output.contains("client-1"));
        assert!(!output.contains("s3cr3t"));

        let token = BearerToken::new(access_token(600), Utc::now());
        assert!(!format!("{token:?}").contains("abc"));
    }

    #[test]
    #[traced_test]
    fn unreachable_token_endpoint() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let tokens = TokenProvider::new(ClientCredentials::new("client-1", "s3cr3t"))
            .unwrap()
            .with_endpoint(format!("http://{addr}/oauth2/token"));

        let result = tokens.ensure_valid();

        assert!(matches!(
            result,
            Err(CatalogError::Authentication { status: None, .. })
        ));
        assert!(logs_contain("Failed to request JWT token"));
    }
}
