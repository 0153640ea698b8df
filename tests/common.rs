// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides test configuration, resources, and id-token builders
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use guides_portal::config::{
    GuidesApiConfig, OAuthProviderConfig, ServerConfig, SessionConfig,
};
use guides_portal::resources::ServerResources;
use std::sync::Arc;

/// Test configuration pointed at the given authority and API base URLs
pub fn test_config(authority: &str, api_base: &str) -> ServerConfig {
    ServerConfig {
        http_port: 5000,
        external_base_url: "http://localhost:5000".into(),
        oauth: OAuthProviderConfig {
            client_id: "client-123".into(),
            client_secret: "hunter2".into(),
            authority: authority.into(),
            scopes: vec!["https://org.example.com/user_impersonation".into()],
            redirect_path: "/authorized".into(),
        },
        api: GuidesApiConfig {
            base_url: api_base.into(),
        },
        session: SessionConfig {
            capacity: 100,
            ttl_secs: 3600,
        },
    }
}

/// Resources over [`test_config`]
pub fn test_resources(authority: &str, api_base: &str) -> Arc<ServerResources> {
    Arc::new(ServerResources::new(test_config(authority, api_base)))
}

/// Build an unsigned id token carrying the given claims.
///
/// The portal decodes claims without signature verification, so a
/// `none`-algorithm token with an empty signature segment is sufficient.
pub fn unsigned_id_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{payload}.")
}
