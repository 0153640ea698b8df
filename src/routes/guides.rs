// ABOUTME: Guide listing and creation routes backed by the Dataverse client
// ABOUTME: Requires a silently acquired token, redirecting to login when absent
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Guide routes.
//!
//! Both handlers share the same precondition: a token must be available
//! through silent acquisition, otherwise the browser is redirected to
//! `/login`. `/graphcall` is a thin alias for the listing endpoint kept for
//! clients of the older entry point.

use super::pages;
use crate::dataverse::DEFAULT_GUIDE_NAME;
use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

/// Guide listing and creation routes
pub struct GuideRoutes;

impl GuideRoutes {
    /// Create the guide routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/getguide", get(Self::handle_get_guides))
            .route("/graphcall", get(Self::handle_get_guides))
            .route("/postguide", get(Self::handle_post_guide))
            .with_state(resources)
    }

    /// List guides and render the parsed response
    async fn handle_get_guides(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let mut session = resources.sessions.resolve(&headers).await;
        let Some(token) = resources.oauth.acquire_token_silent(&mut session.data).await? else {
            return Ok(Redirect::to("/login").into_response());
        };
        resources.sessions.save(&session.id, session.data).await;

        let guides = resources
            .guides
            .list_guides(&token.access_token)
            .await
            .map_err(|e| AppError::external_service("guides API", e.to_string()))?;

        info!("rendered guide listing");
        let rendered = serde_json::to_string_pretty(&guides)?;
        Ok(Html(pages::display_page(&rendered)).into_response())
    }

    /// Create a guide and render the raw outcome
    async fn handle_post_guide(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let mut session = resources.sessions.resolve(&headers).await;
        let Some(token) = resources.oauth.acquire_token_silent(&mut session.data).await? else {
            return Ok(Redirect::to("/login").into_response());
        };
        resources.sessions.save(&session.id, session.data).await;

        let result = resources
            .guides
            .create_guide(&token.access_token, DEFAULT_GUIDE_NAME)
            .await
            .map_err(|e| AppError::external_service("guides API", e.to_string()))?;

        info!("rendered guide creation result");
        Ok(Html(pages::display_page(&result)).into_response())
    }
}
