// ABOUTME: Serializable per-session token cache with explicit dirty tracking
// ABOUTME: Stores cached accounts and their token sets between requests
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Session-scoped token cache.
//!
//! The cache is deserialized from the session blob before each use and
//! written back only when a mutating call has marked it changed, so
//! requests that merely read a valid cached token never touch the session.

use crate::oauth2_client::OAuth2Token;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// An account known to the cache, paired with its token set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAccount {
    /// Stable account identifier (`{oid}.{tid}` for AAD accounts, else `sub`)
    pub home_account_id: String,
    /// Display identifier, normally the `preferred_username` claim
    pub username: Option<String>,
    /// The account's current token set
    pub token: OAuth2Token,
}

/// Serializable collection of cached accounts.
///
/// `changed` is an explicit dirty flag: every mutating call sets it, and
/// callers persist the cache back to the session iff it is set.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokenCache {
    accounts: Vec<CachedAccount>,
    #[serde(skip)]
    changed: bool,
}

impl TokenCache {
    /// Rehydrate a cache from its serialized session blob.
    ///
    /// A freshly deserialized cache always reports `changed == false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not a valid cache serialization.
    pub fn deserialize(blob: &str) -> Result<Self> {
        serde_json::from_str(blob).context("invalid token cache blob")
    }

    /// Serialize the cache for storage in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialize token cache")
    }

    /// Whether a mutating call has touched the cache since rehydration
    #[must_use]
    pub fn has_state_changed(&self) -> bool {
        self.changed
    }

    /// All cached accounts, in insertion order
    #[must_use]
    pub fn accounts(&self) -> &[CachedAccount] {
        &self.accounts
    }

    /// The first cached account, if any
    #[must_use]
    pub fn first_account(&self) -> Option<&CachedAccount> {
        self.accounts.first()
    }

    /// Insert an account, replacing any existing entry with the same
    /// `home_account_id`. Marks the cache changed.
    pub fn upsert_account(&mut self, account: CachedAccount) {
        self.accounts
            .retain(|a| a.home_account_id != account.home_account_id);
        self.accounts.push(account);
        self.changed = true;
    }

    /// Replace the token set of an existing account. Marks the cache changed
    /// only when the account exists.
    pub fn update_token(&mut self, home_account_id: &str, token: OAuth2Token) {
        if let Some(account) = self
            .accounts
            .iter_mut()
            .find(|a| a.home_account_id == home_account_id)
        {
            account.token = token;
            self.changed = true;
        }
    }
}
