// ABOUTME: OAuth2 client implementation for identity-provider authentication
// ABOUTME: Builds authorization URLs and exchanges or refreshes tokens at the authority
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Provider connection settings, derived from [`crate::config::ServerConfig`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Config {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token endpoint
    pub token_url: String,
    /// Absolute redirect URI; the token request must carry the exact value
    /// used when building the authorization URL
    pub redirect_uri: String,
    /// Requested scopes
    pub scopes: Vec<String>,
}

/// A token set issued by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Token {
    /// Bearer access token for downstream API calls
    pub access_token: String,
    /// Token type, normally `Bearer`
    pub token_type: String,
    /// Expiry instant, if the provider reported one
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token for silent renewal
    pub refresh_token: Option<String>,
    /// Granted scope string
    pub scope: Option<String>,
    /// Raw OIDC id token carrying the identity claims
    pub id_token: Option<String>,
}

impl OAuth2Token {
    /// Whether the access token has already expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now())
    }

    /// Whether the access token expires within the next five minutes
    #[must_use]
    pub fn will_expire_soon(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now() + Duration::minutes(5))
    }
}

/// HTTP client for the identity provider
pub struct OAuth2Client {
    config: OAuth2Config,
    client: reqwest::Client,
}

impl OAuth2Client {
    /// Create a client over the given provider settings, reusing the shared
    /// HTTP connection pool
    #[must_use]
    pub fn new(config: OAuth2Config) -> Self {
        Self {
            config,
            client: crate::utils::http_client::shared_client().clone(),
        }
    }

    /// Provider settings this client was built with
    #[must_use]
    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    /// Build the authorization URL the browser is sent to
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization endpoint is not a
    /// valid URL.
    pub fn get_authorization_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&self.config.auth_url).context("Invalid auth URL")?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the token request fails, the provider rejects the
    /// code (the provider's `error`/`error_description` are surfaced
    /// unchanged), or the response is not a valid token payload.
    pub async fn exchange_code(&self, code: &str) -> Result<OAuth2Token> {
        let scope = self.config.scopes.join(" ");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        Self::token_from_http_response(response).await
    }

    /// Redeem a refresh token for a new token set
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh request fails or the provider rejects
    /// the refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<OAuth2Token> {
        let scope = self.config.scopes.join(" ");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
            ("scope", scope.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        Self::token_from_http_response(response).await
    }

    async fn token_from_http_response(response: reqwest::Response) -> Result<OAuth2Token> {
        if response.status().is_success() {
            let token: TokenResponse = response.json().await?;
            return Ok(Self::token_from_response(token));
        }

        // Provider error bodies carry `error` and `error_description`;
        // both are surfaced to the caller unchanged.
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ProviderErrorBody>(&body) {
            Ok(err) => Err(anyhow::anyhow!(
                "{}: {}",
                err.error,
                err.error_description.unwrap_or_default()
            )),
            Err(_) => Err(anyhow::anyhow!("token endpoint returned {status}: {body}")),
        }
    }

    fn token_from_response(response: TokenResponse) -> OAuth2Token {
        let expires_at = response
            .expires_in
            .map(|seconds| Utc::now() + Duration::seconds(i64::try_from(seconds).unwrap_or(3600)));

        OAuth2Token {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at,
            refresh_token: response.refresh_token,
            scope: response.scope,
            id_token: response.id_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    scope: Option<String>,
    id_token: Option<String>,
}

/// Error body returned by the token endpoint on a rejected request
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Decode the claims segment of an OIDC id token without signature
/// verification.
///
/// The token was just received from the token endpoint over TLS, so its
/// origin is already established; claims are treated as an opaque JSON
/// object.
///
/// # Errors
///
/// Returns an error if the token is not a three-part JWT or its payload is
/// not base64url-encoded JSON.
pub fn decode_id_token_claims(id_token: &str) -> Result<serde_json::Value> {
    let mut parts = id_token.split('.');
    let payload = parts
        .next()
        .and_then(|_header| parts.next())
        .context("malformed id token")?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .context("id token payload is not base64url")?;
    serde_json::from_slice(&bytes).context("id token claims are not valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> OAuth2Config {
        OAuth2Config {
            client_id: "client-123".into(),
            client_secret: "hunter2".into(),
            auth_url: "https://login.example.com/common/oauth2/v2.0/authorize".into(),
            token_url: "https://login.example.com/common/oauth2/v2.0/token".into(),
            redirect_uri: "http://localhost:5000/authorized".into(),
            scopes: vec!["https://org.example.com/user_impersonation".into()],
        }
    }

    #[test]
    fn authorization_url_carries_all_parameters() {
        let client = OAuth2Client::new(test_config());
        let url = client.get_authorization_url("nonce-abc").unwrap();
        let parsed = Url::parse(&url).unwrap();

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(url.starts_with("https://login.example.com/common/oauth2/v2.0/authorize?"));
        assert!(pairs.contains(&("client_id".into(), "client-123".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:5000/authorized".into()
        )));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("state".into(), "nonce-abc".into())));
        assert!(pairs.contains(&(
            "scope".into(),
            "https://org.example.com/user_impersonation".into()
        )));
    }

    #[test]
    fn token_expiry_helpers() {
        let mut token = OAuth2Token {
            access_token: "at".into(),
            token_type: "Bearer".into(),
            expires_at: Some(Utc::now() + Duration::hours(1)),
            refresh_token: None,
            scope: None,
            id_token: None,
        };
        assert!(!token.is_expired());
        assert!(!token.will_expire_soon());

        token.expires_at = Some(Utc::now() + Duration::minutes(2));
        assert!(!token.is_expired());
        assert!(token.will_expire_soon());

        token.expires_at = Some(Utc::now() - Duration::minutes(2));
        assert!(token.is_expired());

        token.expires_at = None;
        assert!(!token.is_expired());
    }

    #[test]
    fn id_token_claims_decode() {
        let claims = serde_json::json!({
            "oid": "11111111-2222-3333-4444-555555555555",
            "tid": "66666666-7777-8888-9999-000000000000",
            "preferred_username": "user@example.com",
            "name": "Example User"
        });
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let id_token = format!("eyJhbGciOiJub25lIn0.{payload}.sig");

        let decoded = decode_id_token_claims(&id_token).unwrap();
        assert_eq!(decoded["preferred_username"], "user@example.com");
        assert_eq!(decoded["name"], "Example User");
    }

    #[test]
    fn id_token_claims_reject_garbage() {
        assert!(decode_id_token_claims("not-a-jwt").is_err());
        assert!(decode_id_token_claims("a.!!!.c").is_err());
    }
}
