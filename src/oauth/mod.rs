// ABOUTME: OAuth module organizing the browser login flow
// ABOUTME: Centralizes authorization, callback validation, and silent token acquisition
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # OAuth Login Flow
//!
//! The login flow controller for the portal. A session moves
//! `Anonymous → AwaitingCallback` when a login is begun (state nonce
//! issued), `→ Authenticated` when the callback's code exchange succeeds
//! (claims stored), and back to `Anonymous` on logout. A state mismatch or
//! provider error returns the flow to `Anonymous` without persisting
//! partial state.

pub mod manager;

pub use manager::OAuthManager;

use serde::Deserialize;

/// Query parameters the provider sends to the redirect endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Round-tripped CSRF state nonce
    pub state: Option<String>,
    /// Authorization code, present on success
    pub code: Option<String>,
    /// Provider error code, present on failure
    pub error: Option<String>,
    /// Provider error description accompanying `error`
    pub error_description: Option<String>,
}

/// Result of processing a redirect callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The returned state did not match the session nonce; the flow is
    /// aborted without a token exchange and without a user-visible error
    StateMismatch,
    /// The provider reported an authorization error, surfaced unchanged
    ProviderError {
        /// Provider error code
        error: String,
        /// Provider error description
        error_description: Option<String>,
    },
    /// The code exchange succeeded and the session is now authenticated
    SignedIn,
    /// The callback carried neither a code nor an error
    NoCode,
}
