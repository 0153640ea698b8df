// ABOUTME: Shared HTTP client with connection pooling for outbound calls
// ABOUTME: Provides a process-wide reqwest client for provider and API requests
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use reqwest::Client;
use std::sync::OnceLock;

/// Global shared HTTP client
static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Get or create the shared HTTP client.
///
/// One pooled client serves both the identity provider and the downstream
/// guides API. No request timeout is configured: a hang in either dependency
/// stalls the request that triggered it.
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(Client::new)
}
