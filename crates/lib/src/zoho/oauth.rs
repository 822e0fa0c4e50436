//! Zoho OAuth: exchange the long-lived refresh token for a short-lived access token.
//!
//! No caching: every caller gets a freshly refreshed token. That costs one extra round trip
//! per operation; the token lifetime is left entirely to the accounts server.

use super::ZohoError;
use serde::Deserialize;

const ZOHO_ACCOUNTS_BASE: &str = "https://accounts.zoho.com";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct ZohoOAuth {
    accounts_base: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    client: reqwest::Client,
}

impl ZohoOAuth {
    pub fn new(
        client: reqwest::Client,
        client_id: String,
        client_secret: String,
        refresh_token: String,
        accounts_base: Option<String>,
    ) -> Self {
        let accounts_base = accounts_base
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| ZOHO_ACCOUNTS_BASE.to_string());
        Self {
            accounts_base,
            client_id,
            client_secret,
            refresh_token,
            client,
        }
    }

    /// POST /oauth/v2/token with grant_type=refresh_token. Returns the bearer access token.
    pub async fn access_token(&self) -> Result<String, ZohoError> {
        let url = format!("{}/oauth/v2/token", self.accounts_base);
        let form = [
            ("refresh_token", self.refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let res = self.client.post(&url).form(&form).send().await?;
        let data: TokenResponse = res.json().await?;
        if let Some(error) = data.error {
            return Err(ZohoError::Auth(error));
        }
        data.access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ZohoError::Auth("no access_token in response".to_string()))
    }
}
