// ABOUTME: Browser session records and the bounded in-memory session store
// ABOUTME: Keys sessions by an HttpOnly cookie with LRU eviction and TTL expiry
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Session layer.
//!
//! Each browser session is one [`SessionData`] record with typed fields for
//! the login state nonce, the serialized token cache, and the signed-in
//! user's claims. Records live in a bounded LRU store keyed by a session-id
//! cookie; eviction and TTL expiry stand in for a session backend's own
//! lifetime policy.
//!
//! Requests load a clone of their record, mutate it, and write it back.
//! Concurrent requests from the same browser race last-write-wins; the store
//! provides no per-session locking.

use axum::http::{header, HeaderMap};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the session-id cookie
pub const SESSION_COOKIE: &str = "guides_session";

/// Per-browser-session mutable record
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    /// CSRF state nonce, regenerated on each login attempt
    pub state: Option<String>,
    /// Serialized token cache blob
    pub token_cache: Option<String>,
    /// Decoded identity claims once login has succeeded
    pub user: Option<serde_json::Value>,
}

impl SessionData {
    /// Whether this session has a signed-in user
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

struct SessionEntry {
    data: SessionData,
    expires_at: Instant,
}

impl SessionEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Bounded in-memory session store with LRU eviction and TTL expiry.
///
/// Uses `Arc<RwLock<LruCache>>` so the store can be shared across handlers;
/// `LruCache` provides O(1) eviction of the least-recently-used session when
/// the capacity bound is hit.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<RwLock<LruCache<String, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Default capacity when configuration specifies zero entries
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create a store holding at most `capacity` sessions, each living for
    /// `ttl` after its last write
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(Self::DEFAULT_CAPACITY);
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
            ttl,
        }
    }

    /// Session TTL this store was configured with
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Load a session record, dropping it if it has expired.
    ///
    /// Takes the write lock: an LRU lookup reorders entries.
    pub async fn load(&self, session_id: &str) -> Option<SessionData> {
        let mut store = self.store.write().await;
        let hit = store
            .get(session_id)
            .map(|entry| (entry.is_expired(), entry.data.clone()));
        match hit {
            Some((false, data)) => Some(data),
            Some((true, _)) => {
                store.pop(session_id);
                None
            }
            None => None,
        }
    }

    /// Write a session record back, refreshing its expiry
    pub async fn save(&self, session_id: &str, data: SessionData) {
        let entry = SessionEntry {
            data,
            expires_at: Instant::now() + self.ttl,
        };
        self.store.write().await.put(session_id.to_owned(), entry);
    }

    /// Drop a session record entirely
    pub async fn remove(&self, session_id: &str) {
        self.store.write().await.pop(session_id);
    }

    /// Resolve the request's session from its cookie header.
    ///
    /// An unknown, expired, or absent session id yields a fresh anonymous
    /// record under a new id; the caller is responsible for emitting the
    /// `Set-Cookie` header when `is_new` is set.
    pub async fn resolve(&self, headers: &HeaderMap) -> ResolvedSession {
        if let Some(id) = get_cookie_value(headers, SESSION_COOKIE) {
            if let Some(data) = self.load(&id).await {
                return ResolvedSession {
                    id,
                    data,
                    is_new: false,
                };
            }
        }

        ResolvedSession {
            id: Uuid::new_v4().to_string(),
            data: SessionData::default(),
            is_new: true,
        }
    }

    /// `Set-Cookie` value for a session id under this store's TTL
    #[must_use]
    pub fn cookie_for(&self, session_id: &str) -> String {
        format!(
            "{SESSION_COOKIE}={session_id}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
            self.ttl.as_secs()
        )
    }
}

/// A session resolved for one request
pub struct ResolvedSession {
    /// Session id (cookie value)
    pub id: String,
    /// The session record, cloned for this request
    pub data: SessionData,
    /// Whether the id was freshly generated and the cookie must be set
    pub is_new: bool,
}

/// Extract a cookie value from the request headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_owned())
        })
        .next()
}
