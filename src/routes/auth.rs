// ABOUTME: Browser-facing authentication routes for login, callback, and logout
// ABOUTME: Drives the OAuth login flow and keeps the session record current
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Authentication routes.
//!
//! Handlers are thin wrappers over [`crate::oauth::OAuthManager`]: they
//! resolve the request's session, delegate, persist the session, and map the
//! outcome to a redirect or a page.

use super::pages;
use crate::errors::{AppError, ErrorCode};
use crate::oauth::{CallbackOutcome, CallbackParams};
use crate::resources::ServerResources;
use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create the authentication routes; the callback path comes from
    /// configuration and must match the provider app registration
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        let redirect_path = resources.config.oauth.redirect_path.clone();
        Router::new()
            .route("/", get(Self::handle_index))
            .route("/login", get(Self::handle_login))
            .route(&redirect_path, get(Self::handle_authorized))
            .route("/logout", get(Self::handle_logout))
            .with_state(resources)
    }

    /// Home: requires an authenticated session, otherwise sends the browser
    /// to `/login`
    async fn handle_index(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Response {
        let session = resources.sessions.resolve(&headers).await;
        match &session.data.user {
            Some(user) => Html(pages::index_page(user)).into_response(),
            None => Redirect::to("/login").into_response(),
        }
    }

    /// Issue a fresh state nonce and render the login page with the
    /// authorization URL
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let mut session = resources.sessions.resolve(&headers).await;
        let auth_url = resources.oauth.begin_login(&mut session.data)?;
        resources.sessions.save(&session.id, session.data).await;

        let mut response = Html(pages::login_page(&auth_url)).into_response();
        if session.is_new {
            let cookie = resources.sessions.cookie_for(&session.id);
            response.headers_mut().insert(
                SET_COOKIE,
                HeaderValue::from_str(&cookie)
                    .map_err(|e| AppError::internal(e.to_string()))?,
            );
        }
        Ok(response)
    }

    /// OAuth callback: validate the state nonce, surface provider errors,
    /// exchange the code, then return home
    async fn handle_authorized(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(params): Query<CallbackParams>,
    ) -> Result<Response, AppError> {
        let mut session = resources.sessions.resolve(&headers).await;

        match resources
            .oauth
            .handle_callback(&mut session.data, &params)
            .await
        {
            Ok(CallbackOutcome::SignedIn) => {
                resources.sessions.save(&session.id, session.data).await;
                Ok(Redirect::to("/").into_response())
            }
            // an invalid callback is not surfaced to the user
            Ok(CallbackOutcome::StateMismatch | CallbackOutcome::NoCode) => {
                Ok(Redirect::to("/").into_response())
            }
            Ok(CallbackOutcome::ProviderError {
                error,
                error_description,
            }) => Ok(Html(pages::auth_error_page(
                &error,
                error_description.as_deref(),
            ))
            .into_response()),
            Err(e) if e.code == ErrorCode::ExternalAuthFailed => {
                Ok(Html(pages::auth_error_page("token_exchange_failed", Some(&e.message)))
                    .into_response())
            }
            Err(e) => Err(e),
        }
    }

    /// Clear the session and send the browser to the provider logout
    /// endpoint
    async fn handle_logout(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Response {
        let mut session = resources.sessions.resolve(&headers).await;
        let logout_url = resources.oauth.logout(&mut session.data);
        resources.sessions.remove(&session.id).await;
        Redirect::to(&logout_url).into_response()
    }
}
