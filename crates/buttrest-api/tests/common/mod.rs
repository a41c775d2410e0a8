//! Test utilities for the REST API
//!
//! Starts the router on an ephemeral port and talks to it over HTTP.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use buttrest_api::{create_router, ApiSettings, AppState};
use buttrest_core::MockClient;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tokio::net::TcpListener;

/// Settings with a negligible scan window so tests start quickly
pub fn fast_settings() -> ApiSettings {
    ApiSettings {
        scan_window: Duration::from_millis(1),
        read_timeout: Duration::from_secs(1),
    }
}

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub http: reqwest::Client,
    pub client: Arc<MockClient>,
    pub state: AppState,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Start a server over the demo client, after the startup lifecycle
    pub async fn start() -> Self {
        Self::start_with(MockClient::demo("buttrest-test"), fast_settings()).await
    }

    /// Start a server over a given client and settings
    pub async fn start_with(client: MockClient, settings: ApiSettings) -> Self {
        let client = Arc::new(client);
        let state = AppState::with_settings(client.clone(), settings);
        state.startup().await.expect("startup failed");
        Self::serve(client, state).await
    }

    /// Start a server without running the startup lifecycle
    pub async fn start_unready(client: MockClient) -> Self {
        let client = Arc::new(client);
        let state = AppState::with_settings(client.clone(), fast_settings());
        Self::serve(client, state).await
    }

    async fn serve(client: Arc<MockClient>, state: AppState) -> Self {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let router = create_router(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        Self {
            addr,
            http,
            client,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.http.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post(&self, path: &str, body: Value) -> Response {
        self.http.post(self.url(path)).json(&body).send().await.unwrap()
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> Response {
        self.http
            .post(self.url(path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap()
    }

    /// GET a path, assert 200, and return the parsed body
    pub async fn get_json(&self, path: &str) -> Value {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", path);
        response.json().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Assert a problem response and return its body
pub async fn expect_problem(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    assert_eq!(
        response.headers()["content-type"],
        "application/problem+json"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], status.as_u16());
    body
}
