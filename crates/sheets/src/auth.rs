//! Bearer tokens for the Sheets API.
//!
//! A service account key is exchanged for an access token with the OAuth
//! JWT bearer grant: an RS256-signed assertion is posted to the key's
//! `token_uri`. Tokens are cached until shortly before they expire.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::client::SheetsError;

/// OAuth scope granting read/write access to spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before their reported expiry.
const REFRESH_MARGIN_SECS: i64 = 60;

/// The fields of a service account JSON key file that the grant needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, SheetsError> {
        serde_json::from_str(json)
            .map_err(|e| SheetsError::Auth(format!("invalid service account key: {e}")))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SheetsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SheetsError::Auth(format!(
                "cannot read service account key {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }
}

/// JWT claims of the bearer-grant assertion.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct GrantClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl GrantClaims {
    pub fn new(key: &ServiceAccountKey, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iss: key.client_email.clone(),
            scope: SHEETS_SCOPE.to_string(),
            aud: key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_after: DateTime<Utc>,
}

/// Token source backed by a service account key.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cache: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for ServiceAccountAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountAuth")
            .field("client_email", &self.key.client_email)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey) -> Result<Self, SheetsError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SheetsError::Auth(format!("invalid service account private key: {e}")))?;
        Ok(Self {
            key,
            encoding_key,
            cache: Mutex::new(None),
        })
    }

    /// Return a cached token or run the bearer grant for a fresh one.
    ///
    /// The cache lock is held across the grant so concurrent callers wait for
    /// one exchange instead of each starting their own.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String, SheetsError> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now();
        if let Some(token) = cache.as_ref().filter(|t| now < t.refresh_after) {
            return Ok(token.value.clone());
        }

        let assertion = encode(
            &Header::new(Algorithm::RS256),
            &GrantClaims::new(&self.key, now),
            &self.encoding_key,
        )
        .map_err(|e| SheetsError::Auth(format!("failed to sign token assertion: {e}")))?;

        let response = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SheetsError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        let granted: TokenResponse = response.json().await?;

        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = granted.expires_in,
            "Obtained spreadsheet access token"
        );

        let refresh_after =
            now + Duration::seconds((granted.expires_in - REFRESH_MARGIN_SECS).max(0));
        *cache = Some(CachedToken {
            value: granted.access_token.clone(),
            refresh_after,
        });
        Ok(granted.access_token)
    }
}

/// How requests to the Sheets API are authorised.
#[derive(Debug)]
pub enum SheetsAuth {
    /// A pre-issued OAuth access token, used as is.
    Static(String),
    /// Tokens minted from a service account key.
    ServiceAccount(Box<ServiceAccountAuth>),
}

impl SheetsAuth {
    pub fn service_account_file(path: impl AsRef<Path>) -> Result<Self, SheetsError> {
        let key = ServiceAccountKey::from_file(path)?;
        Ok(SheetsAuth::ServiceAccount(Box::new(ServiceAccountAuth::new(key)?)))
    }

    pub async fn bearer(&self, client: &reqwest::Client) -> Result<String, SheetsError> {
        match self {
            SheetsAuth::Static(token) => Ok(token.clone()),
            SheetsAuth::ServiceAccount(auth) => auth.access_token(client).await,
        }
    }
}
