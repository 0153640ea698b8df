// ABOUTME: Shared per-process resources handed to request handlers
// ABOUTME: Bundles config, session store, login flow manager, and guides client
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::config::ServerConfig;
use crate::dataverse::GuidesClient;
use crate::oauth::OAuthManager;
use crate::session::SessionStore;
use std::sync::Arc;
use std::time::Duration;

/// Everything a request handler needs, shared as `Arc<ServerResources>`
/// through axum state
pub struct ServerResources {
    /// Immutable startup configuration
    pub config: Arc<ServerConfig>,
    /// Bounded in-memory session store
    pub sessions: SessionStore,
    /// Login flow manager
    pub oauth: OAuthManager,
    /// Downstream guides API client
    pub guides: GuidesClient,
}

impl ServerResources {
    /// Assemble resources from loaded configuration
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let config = Arc::new(config);
        Self {
            sessions: SessionStore::new(
                config.session.capacity,
                Duration::from_secs(config.session.ttl_secs),
            ),
            oauth: OAuthManager::new(Arc::clone(&config)),
            guides: GuidesClient::new(&config.api),
            config,
        }
    }
}
