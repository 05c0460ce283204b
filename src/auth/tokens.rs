//! OneDrive access token acquisition
//!
//! The stored access token is used until its TTL lapses; after that the
//! refresh token is traded for a new pair at the OAuth token endpoint.

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Args;
use crate::graph::error_for_status;
use crate::store::TokenStore;
use crate::types::Result;

/// Access token lifetime assumed when the grant omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// OAuth application settings
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub token_api: String,
    pub authorize_api: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
}

impl OAuthConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            token_api: args.auth_api.clone(),
            authorize_api: args.authorize_api.clone(),
            client_id: args.client_id.clone(),
            client_secret: args.client_secret.clone().unwrap_or_default(),
            redirect_uri: args.redirect_uri.clone(),
            scope: args.scope.clone(),
        }
    }

    /// URL the operator opens once to grant access and obtain a code
    pub fn authorize_url(&self) -> String {
        let query = serde_urlencoded::to_string([
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", self.scope.as_str()),
        ])
        .unwrap_or_default();
        format!("{}?{}", self.authorize_api, query)
    }
}

/// Token endpoint reply; fields are optional because error replies and
/// partial grants omit them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub expires_in: Option<u64>,
}

/// `expires_in` arrives as a number from Microsoft but as a string from some proxies
fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(u64),
        Str(String),
    }

    Ok(match Option::<NumOrString>::deserialize(deserializer)? {
        Some(NumOrString::Num(n)) => Some(n),
        Some(NumOrString::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Hands out access tokens, refreshing through the OAuth endpoint when needed
#[derive(Clone)]
pub struct TokenManager {
    store: TokenStore,
    http: reqwest::Client,
    oauth: OAuthConfig,
}

impl TokenManager {
    pub fn new(store: TokenStore, oauth: OAuthConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { store, http, oauth })
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn oauth(&self) -> &OAuthConfig {
        &self.oauth
    }

    /// Current access token, or `None` when the store holds nothing usable
    pub async fn access_token(&self) -> Result<Option<String>> {
        let tokens = self.store.get_tokens().await?;

        if let Some(access_token) = tokens.access_token {
            return Ok(Some(access_token));
        }

        let Some(refresh_token) = tokens.refresh_token else {
            debug!("No refresh token stored");
            return Ok(None);
        };

        info!("Access token expired, refreshing");
        let response = self
            .request_tokens(&[
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        self.persist(response).await
    }

    /// Exchange an authorization code for the initial token pair
    pub async fn exchange_code(&self, code: &str) -> Result<Option<String>> {
        let response = self
            .request_tokens(&[("code", code), ("grant_type", "authorization_code")])
            .await?;
        self.persist(response).await
    }

    async fn request_tokens(&self, grant: &[(&str, &str)]) -> Result<TokenResponse> {
        let mut form = vec![
            ("client_id", self.oauth.client_id.as_str()),
            ("redirect_uri", self.oauth.redirect_uri.as_str()),
            ("client_secret", self.oauth.client_secret.as_str()),
        ];
        form.extend_from_slice(grant);

        let response = self.http.post(&self.oauth.token_api).form(&form).send().await?;
        let response = error_for_status(response).await?;
        Ok(response.json::<TokenResponse>().await?)
    }

    /// Store a complete grant and return its access token
    async fn persist(&self, response: TokenResponse) -> Result<Option<String>> {
        match (response.access_token, response.refresh_token) {
            (Some(access_token), Some(refresh_token)) => {
                let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
                self.store
                    .store_tokens(&access_token, expires_in, &refresh_token)
                    .await?;
                info!(expires_in, "Stored refreshed OneDrive tokens");
                Ok(Some(access_token))
            }
            _ => {
                warn!("Token endpoint reply lacked access or refresh token");
                Ok(None)
            }
        }
    }
}
