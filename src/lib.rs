// ABOUTME: Main library entry point for the guides portal web front-end
// ABOUTME: Wires OAuth2 login, session-cached tokens, and the Dataverse guides client
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![deny(unsafe_code)]

//! # Guides Portal
//!
//! A small web front-end that signs a browser user in against an OAuth2/OIDC
//! authority using the authorization-code flow, caches the resulting tokens in
//! the user's server-side session, and calls a downstream Dataverse-style API
//! to list and create guide records.
//!
//! ## Architecture
//!
//! - **`oauth2_client`**: HTTP client for the identity provider (authorization
//!   URL, code exchange, refresh)
//! - **`oauth`**: the login flow controller tying the client to sessions
//! - **`token_cache`**: serializable per-session token cache with explicit
//!   dirty tracking
//! - **`session`**: bounded in-memory session store keyed by a browser cookie
//! - **`dataverse`**: authenticated calls against the guides entity set
//! - **`routes`**: axum HTTP surface
//! - **`config`**: immutable environment-driven configuration

/// Environment-based configuration loaded once at startup
pub mod config;

/// Resource client for the downstream guides entity set
pub mod dataverse;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// Logging configuration and tracing subscriber setup
pub mod logging;

/// OAuth2 login flow controller (authorization, callback, silent tokens)
pub mod oauth;

/// OAuth2 HTTP client for the identity provider
pub mod oauth2_client;

/// Shared per-process resources handed to request handlers
pub mod resources;

/// HTTP routes for the browser-facing surface
pub mod routes;

/// Session records and the bounded in-memory session store
pub mod session;

/// Serializable token cache with explicit dirty tracking
pub mod token_cache;

/// Shared utilities (HTML escaping, HTTP client)
pub mod utils;
