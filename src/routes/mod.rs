// ABOUTME: Route module organization for the guides portal HTTP endpoints
// ABOUTME: Assembles domain routers into the application router with tracing
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Route module for the guides portal.
//!
//! Each domain module contains route definitions and thin handler functions
//! that delegate to the flow manager and the guides client.

/// Authentication and login-flow routes
pub mod auth;
/// Guide listing and creation routes
pub mod guides;
/// Health check routes
pub mod health;
/// Inline HTML page rendering
pub mod pages;

use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Assemble the full application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(auth::AuthRoutes::routes(Arc::clone(&resources)))
        .merge(guides::GuideRoutes::routes(resources))
        .merge(health::HealthRoutes::routes())
        .layer(TraceLayer::new_for_http())
}
