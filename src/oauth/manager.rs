// ABOUTME: Login flow manager tying the OAuth2 client to browser sessions
// ABOUTME: Handles authorization URLs, callback validation, code exchange, and silent renewal
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # OAuth Manager
//!
//! Orchestrates the complete login flow against the configured authority:
//! authorization-URL construction, fail-closed callback validation, the
//! code-for-tokens exchange, silent (non-interactive) token acquisition,
//! and provider logout.

use super::{CallbackOutcome, CallbackParams};
use crate::config::ServerConfig;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::oauth2_client::{decode_id_token_claims, OAuth2Client, OAuth2Config, OAuth2Token};
use crate::session::SessionData;
use crate::token_cache::{CachedAccount, TokenCache};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Login flow manager
pub struct OAuthManager {
    config: Arc<ServerConfig>,
    client: OAuth2Client,
}

impl OAuthManager {
    /// Build a manager for the configured authority
    #[must_use]
    pub fn new(config: Arc<ServerConfig>) -> Self {
        let client = OAuth2Client::new(OAuth2Config {
            client_id: config.oauth.client_id.clone(),
            client_secret: config.oauth.client_secret.clone(),
            auth_url: config.oauth.authorize_url(),
            token_url: config.oauth.token_url(),
            redirect_uri: config.redirect_uri(),
            scopes: config.oauth.scopes.clone(),
        });
        Self { config, client }
    }

    /// Begin a login attempt: store a fresh state nonce in the session and
    /// return the authorization URL the browser should follow.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization URL cannot be constructed.
    pub fn begin_login(&self, session: &mut SessionData) -> AppResult<String> {
        let state = Uuid::new_v4().to_string();
        let auth_url = self
            .client
            .get_authorization_url(&state)
            .map_err(|e| AppError::config(e.to_string()))?;
        session.state = Some(state);
        debug!("issued login state nonce");
        Ok(auth_url)
    }

    /// Process the provider's redirect callback.
    ///
    /// Fails closed: a state mismatch aborts the flow without a token
    /// exchange. A provider-reported error is surfaced unchanged. With a
    /// valid code, exchanges it for tokens, stores the decoded identity
    /// claims in the session, and persists the token cache back to the
    /// session iff the cache reports a change.
    ///
    /// # Errors
    ///
    /// Returns an error when the token exchange itself fails; the message
    /// carries the provider's error text verbatim.
    pub async fn handle_callback(
        &self,
        session: &mut SessionData,
        params: &CallbackParams,
    ) -> AppResult<CallbackOutcome> {
        if session.state.is_none() || params.state != session.state {
            warn!("callback state does not match session nonce, aborting flow");
            return Ok(CallbackOutcome::StateMismatch);
        }

        if let Some(error) = &params.error {
            warn!(error = %error, "provider reported an authorization error");
            return Ok(CallbackOutcome::ProviderError {
                error: error.clone(),
                error_description: params.error_description.clone(),
            });
        }

        let Some(code) = &params.code else {
            return Ok(CallbackOutcome::NoCode);
        };

        let mut cache = Self::load_cache(session);
        let token = self
            .client
            .exchange_code(code)
            .await
            .map_err(|e| AppError::new(ErrorCode::ExternalAuthFailed, e.to_string()))?;

        let claims = match token.id_token.as_deref() {
            Some(id_token) => Some(
                decode_id_token_claims(id_token)
                    .map_err(|e| AppError::new(ErrorCode::ExternalAuthFailed, e.to_string()))?,
            ),
            None => None,
        };

        cache.upsert_account(account_from_claims(claims.as_ref(), &token));
        session.user = claims;
        Self::save_cache(session, &cache)?;

        info!(
            user = %session
                .user
                .as_ref()
                .and_then(|c| c.get("preferred_username"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown"),
            "code exchange completed, session authenticated"
        );
        Ok(CallbackOutcome::SignedIn)
    }

    /// Attempt silent (non-interactive) token acquisition for the first
    /// cached account.
    ///
    /// Returns `Ok(None)` when no account is cached, when the cached token
    /// set has no refresh capability, or when the refresh is rejected —
    /// callers must send the user back through interactive login. Persists
    /// cache mutations back to the session iff the cache reports a change.
    ///
    /// # Errors
    ///
    /// Returns an error only when the mutated cache cannot be re-serialized.
    pub async fn acquire_token_silent(
        &self,
        session: &mut SessionData,
    ) -> AppResult<Option<OAuth2Token>> {
        let mut cache = Self::load_cache(session);
        let Some(account) = cache.first_account().cloned() else {
            return Ok(None);
        };

        let token = if account.token.will_expire_soon() {
            let Some(refresh_token) = account.token.refresh_token.clone() else {
                warn!("cached token expired and no refresh token is available");
                return Ok(None);
            };
            match self.client.refresh_token(&refresh_token).await {
                Ok(mut renewed) => {
                    // providers may omit the refresh token on renewal
                    if renewed.refresh_token.is_none() {
                        renewed.refresh_token = Some(refresh_token);
                    }
                    cache.update_token(&account.home_account_id, renewed.clone());
                    debug!("silently renewed access token");
                    renewed
                }
                Err(e) => {
                    warn!("silent token renewal failed, re-authentication required: {e}");
                    return Ok(None);
                }
            }
        } else {
            account.token
        };

        Self::save_cache(session, &cache)?;
        Ok(Some(token))
    }

    /// Clear the session and return the provider logout URL with the
    /// post-logout redirect pointing back at the application home
    #[must_use]
    pub fn logout(&self, session: &mut SessionData) -> String {
        *session = SessionData::default();
        let home = format!(
            "{}/",
            self.config.external_base_url.trim_end_matches('/')
        );
        format!(
            "{}?post_logout_redirect_uri={}",
            self.config.oauth.logout_url(),
            urlencoding::encode(&home)
        )
    }

    fn load_cache(session: &SessionData) -> TokenCache {
        session.token_cache.as_deref().map_or_else(
            TokenCache::default,
            |blob| match TokenCache::deserialize(blob) {
                Ok(cache) => cache,
                Err(e) => {
                    warn!("discarding unreadable token cache: {e}");
                    TokenCache::default()
                }
            },
        )
    }

    fn save_cache(session: &mut SessionData, cache: &TokenCache) -> AppResult<()> {
        if cache.has_state_changed() {
            session.token_cache = Some(cache.serialize()?);
        }
        Ok(())
    }
}

/// Derive the cached account identity from the id-token claims.
///
/// AAD accounts are keyed `{oid}.{tid}`; other providers fall back to the
/// `sub` claim, and a random id keeps the cache usable when no identity
/// claim is present at all.
fn account_from_claims(claims: Option<&Value>, token: &OAuth2Token) -> CachedAccount {
    let home_account_id = claims
        .and_then(|c| {
            match (
                c.get("oid").and_then(Value::as_str),
                c.get("tid").and_then(Value::as_str),
            ) {
                (Some(oid), Some(tid)) => Some(format!("{oid}.{tid}")),
                _ => c.get("sub").and_then(Value::as_str).map(str::to_owned),
            }
        })
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let username = claims
        .and_then(|c| c.get("preferred_username"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    CachedAccount {
        home_account_id,
        username,
        token: token.clone(),
    }
}
