// ABOUTME: Local stub HTTP servers for exercising outbound calls in tests
// ABOUTME: Binds an ephemeral port and serves a provided router in the background
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use axum::Router;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral localhost port and return its base URL
pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub server");
    let addr = listener.local_addr().expect("stub server has no address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("stub server failed");
    });

    format!("http://{addr}")
}
