// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Loads identity-provider credentials, API endpoints, and session policy at startup
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Environment-based configuration, loaded once at startup into an immutable
//! struct and shared by reference with every handler.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use tracing::{info, warn};

/// Default HTTP port when `HTTP_PORT` is not set
const DEFAULT_HTTP_PORT: u16 = 5000;

/// Default OAuth callback path when `REDIRECT_PATH` is not set
const DEFAULT_REDIRECT_PATH: &str = "/authorized";

/// Default maximum number of live browser sessions
const DEFAULT_SESSION_CAPACITY: usize = 1000;

/// Default session time-to-live in seconds (24 hours)
const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Externally visible base URL of this application, used to build the
    /// absolute redirect URI and the post-logout return address
    pub external_base_url: String,
    /// Identity provider configuration
    pub oauth: OAuthProviderConfig,
    /// Downstream guides API configuration
    pub api: GuidesApiConfig,
    /// Session store policy
    pub session: SessionConfig,
}

/// Identity provider (OAuth2/OIDC authority) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthProviderConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Authority base URL, e.g. `https://login.microsoftonline.com/common`
    pub authority: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// Callback path registered with the provider (must start with `/`)
    pub redirect_path: String,
}

/// Downstream guides API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidesApiConfig {
    /// Base URL of the Dataverse-style web API, e.g.
    /// `https://org.api.crm.dynamics.com/api/data/v9.1`
    pub base_url: String,
}

/// Session store policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of live sessions before LRU eviction
    pub capacity: usize,
    /// Session time-to-live in seconds
    pub ttl_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a numeric
    /// variable fails to parse.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let http_port: u16 = env_var_or("HTTP_PORT", &DEFAULT_HTTP_PORT.to_string())?
            .parse()
            .context("Invalid HTTP_PORT value")?;

        let config = Self {
            http_port,
            external_base_url: env_var_or(
                "EXTERNAL_BASE_URL",
                &format!("http://localhost:{http_port}"),
            )?,
            oauth: OAuthProviderConfig {
                client_id: env::var("CLIENT_ID").context("CLIENT_ID is not set")?,
                client_secret: env::var("CLIENT_SECRET").context("CLIENT_SECRET is not set")?,
                authority: env::var("AUTHORITY").context("AUTHORITY is not set")?,
                scopes: parse_scopes(&env::var("SCOPE").context("SCOPE is not set")?),
                redirect_path: env_var_or("REDIRECT_PATH", DEFAULT_REDIRECT_PATH)?,
            },
            api: GuidesApiConfig {
                base_url: env::var("CDS_API_URL").context("CDS_API_URL is not set")?,
            },
            session: SessionConfig {
                capacity: env_var_or("SESSION_CAPACITY", &DEFAULT_SESSION_CAPACITY.to_string())?
                    .parse()
                    .context("Invalid SESSION_CAPACITY value")?,
                ttl_secs: env_var_or("SESSION_TTL_SECS", &DEFAULT_SESSION_TTL_SECS.to_string())?
                    .parse()
                    .context("Invalid SESSION_TTL_SECS value")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints that `from_env` cannot express
    ///
    /// # Errors
    ///
    /// Returns an error on an empty credential, a malformed authority or API
    /// URL, or a redirect path that does not start with `/`.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.oauth.client_id.is_empty(), "CLIENT_ID is empty");
        anyhow::ensure!(
            !self.oauth.client_secret.is_empty(),
            "CLIENT_SECRET is empty"
        );
        anyhow::ensure!(
            self.oauth.authority.starts_with("http"),
            "AUTHORITY must be an absolute URL"
        );
        anyhow::ensure!(
            self.oauth.redirect_path.starts_with('/'),
            "REDIRECT_PATH must start with '/'"
        );
        anyhow::ensure!(!self.oauth.scopes.is_empty(), "SCOPE is empty");
        anyhow::ensure!(
            self.api.base_url.starts_with("http"),
            "CDS_API_URL must be an absolute URL"
        );
        anyhow::ensure!(self.session.capacity > 0, "SESSION_CAPACITY must be > 0");
        Ok(())
    }

    /// Absolute redirect URI sent to the provider; must match the app
    /// registration exactly
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!(
            "{}{}",
            self.external_base_url.trim_end_matches('/'),
            self.oauth.redirect_path
        )
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Guides Portal Configuration:\n\
             - HTTP Port: {}\n\
             - External Base URL: {}\n\
             - Authority: {}\n\
             - Client ID: {}\n\
             - Client Secret: {}\n\
             - Scopes: {}\n\
             - Redirect URI: {}\n\
             - Guides API: {}\n\
             - Sessions: {} max, {}s TTL",
            self.http_port,
            self.external_base_url,
            self.oauth.authority,
            self.oauth.client_id,
            self.oauth
                .secret_fingerprint()
                .map_or_else(|| "unset".into(), |f| format!("sha256:{f}")),
            self.oauth.scopes.join(" "),
            self.redirect_uri(),
            self.api.base_url,
            self.session.capacity,
            self.session.ttl_secs,
        )
    }
}

impl OAuthProviderConfig {
    /// Authorization endpoint under the authority
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/oauth2/v2.0/authorize",
            self.authority.trim_end_matches('/')
        )
    }

    /// Token endpoint under the authority
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority.trim_end_matches('/'))
    }

    /// Logout endpoint under the authority
    #[must_use]
    pub fn logout_url(&self) -> String {
        format!(
            "{}/oauth2/v2.0/logout",
            self.authority.trim_end_matches('/')
        )
    }

    /// Compute SHA256 fingerprint of the client secret for diagnostics
    /// (first 8 hex chars). Allows comparing secrets without logging values.
    #[must_use]
    pub fn secret_fingerprint(&self) -> Option<String> {
        if self.client_secret.is_empty() {
            return None;
        }
        let mut hasher = Sha256::new();
        hasher.update(self.client_secret.as_bytes());
        let result = hasher.finalize();
        Some(format!("{result:x}").chars().take(8).collect())
    }
}

fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_owned()))
}

/// Parse whitespace- or comma-separated scopes
fn parse_scopes(scopes_str: &str) -> Vec<String> {
    scopes_str
        .split([' ', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
