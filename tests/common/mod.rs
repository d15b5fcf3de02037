//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use reactivities::config::Environment;
use reactivities::lifecycle::startup::{bind_listener, initialize};
use reactivities::auth::SessionStore;
use reactivities::lifecycle::Shutdown;
use reactivities::persistence::IN_MEMORY;
use reactivities::{AppConfig, HttpServer};
use reactivities_sdk::models::{ActivityInput, RegisterRequest};
use reactivities_sdk::ActivitiesClient;
use tokio::task::JoinHandle;

pub const PASSWORD: &str = "Pa$$w0rd";

/// A server on an ephemeral port, stopped when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    /// The server's live session store.
    pub sessions: SessionStore,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Raw HTTP client with its own cookie jar and no system proxy.
    pub fn http(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .no_proxy()
            .build()
            .unwrap()
    }

    /// SDK client with no credentials.
    pub fn client(&self) -> ActivitiesClient {
        ActivitiesClient::with_http_client(self.http(), &self.url())
    }

    /// Register `email` and return a client holding its bearer token.
    pub async fn signed_in(&self, display_name: &str, email: &str) -> ActivitiesClient {
        let mut client = self.client();
        client
            .register(&RegisterRequest {
                display_name: display_name.to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("register");
        client.login(email, PASSWORD).await.expect("login");
        client
    }

    /// Signal shutdown and report whether the server stopped within `limit`.
    pub async fn stop_within(&mut self, limit: StdDuration) -> bool {
        self.shutdown.trigger();
        tokio::time::timeout(limit, &mut self.task).await.is_ok()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Development config over a private in-memory database, unseeded and
/// without rate limiting.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.environment = Environment::Development;
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.database.path = IN_MEMORY.to_string();
    config.seed.enabled = false;
    config.rate_limit.enabled = false;
    config
}

pub async fn spawn_server(config: AppConfig) -> TestServer {
    let services = initialize(&config).await.expect("startup");
    let listener = bind_listener(&config).await.expect("bind");
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let sessions = services.sessions.clone();
    let server = HttpServer::new(config, services.db, services.sessions);
    let task = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        sessions,
        shutdown,
        task,
    }
}

pub async fn spawn_default() -> TestServer {
    spawn_server(test_config()).await
}

pub fn future_activity(title: &str) -> ActivityInput {
    ActivityInput {
        title: title.to_string(),
        date: Utc::now() + Duration::days(30),
        description: "Drinks after work".to_string(),
        category: "drinks".to_string(),
        city: "London".to_string(),
        venue: "The Lamb".to_string(),
        latitude: 51.52,
        longitude: -0.12,
    }
}
