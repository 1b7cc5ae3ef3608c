//! OAuth2 access tokens for a service account, via the JWT bearer grant.

use crate::domain::model::ServiceAccount;
use crate::utils::error::{Result, SyncError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are renewed this long before the server-side expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    error_description: Option<String>,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Mints and caches bearer tokens for one service account.
pub struct TokenSource {
    client: Client,
    account: ServiceAccount,
    signing_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    /// Fails when the private key is not an RSA PEM.
    pub fn new(client: Client, account: ServiceAccount) -> Result<Self> {
        let signing_key =
            EncodingKey::from_rsa_pem(account.private_key.as_bytes()).map_err(|e| {
                SyncError::AuthError {
                    message: format!("private key for {} is unusable: {}", account.client_email, e),
                }
            })?;

        Ok(Self {
            client,
            account,
            signing_key,
            cached: Mutex::new(None),
        })
    }

    /// A valid access token, fetched again only once the cached one is close to expiry.
    pub async fn token(&self) -> Result<String> {
        // Held across the fetch so concurrent callers share one exchange.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            iss: self.account.client_email.clone(),
            scope: DATASTORE_SCOPE.to_string(),
            aud: self.account.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.account.private_key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.signing_key).map_err(|e| {
            SyncError::AuthError {
                message: format!("cannot sign token request: {}", e),
            }
        })
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;
        tracing::debug!(
            "Requesting access token for {} from {}",
            self.account.client_email,
            self.account.token_uri
        );

        let response = self
            .client
            .post(&self.account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenError>(&body) {
                Ok(TokenError {
                    error,
                    error_description: Some(description),
                }) => format!("{}: {}", error, description),
                Ok(TokenError { error, .. }) => error,
                Err(_) => format!("token endpoint returned HTTP {}: {}", status.as_u16(), body),
            };
            return Err(SyncError::AuthError { message });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        tracing::debug!("🔑 Access token obtained, valid for {}s", lifetime);

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(lifetime - EXPIRY_MARGIN_SECS),
        })
    }
}
