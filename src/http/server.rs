//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, request ids, limits, CORS, headers)
//! - Bind the router to a plain or TLS listener
//! - Drain in-flight requests on shutdown

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use axum_server::Handle;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::SessionStore;
use crate::config::schema::CorsConfig;
use crate::config::AppConfig;
use crate::http::handlers::{account, activities, buggy, health, profiles};
use crate::http::response::{panic_fault, render_faults};
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::persistence::Database;
use crate::security::headers::apply_security_headers;
use crate::security::rate_limit::{rate_limit_middleware, run_prune_loop, RateLimiterState};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionStore,
    pub config: Arc<AppConfig>,
}

/// HTTP server for the activities API.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
    rate_limiter: Arc<RateLimiterState>,
}

impl HttpServer {
    /// Create a new HTTP server over an opened database and session store.
    pub fn new(config: AppConfig, db: Database, sessions: SessionStore) -> Self {
        let config = Arc::new(config);
        let rate_limiter = Arc::new(RateLimiterState::new(&config.rate_limit));
        let state = AppState {
            db,
            sessions,
            config: config.clone(),
        };

        let router = Self::build_router(&config, state, rate_limiter.clone());
        Self {
            router,
            config,
            rate_limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState, rate_limiter: Arc<RateLimiterState>) -> Router {
        let credentials = Router::new()
            .route("/api/login", post(account::login))
            .route("/api/account/register", post(account::register))
            .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

        let mut api = Router::new()
            .route("/api/account/user-info", get(account::user_info))
            .route("/api/account/logout", post(account::logout))
            .route("/api/activities", get(activities::list).post(activities::create))
            .route(
                "/api/activities/{id}",
                get(activities::details)
                    .put(activities::edit)
                    .delete(activities::delete),
            )
            .route("/api/activities/{id}/attend", post(activities::attend))
            .route("/api/profiles/{id}", get(profiles::profile))
            .route("/health", get(health::health))
            .merge(credentials);

        if config.environment.is_development() {
            api = api
                .route("/api/buggy/not-found", get(buggy::not_found))
                .route("/api/buggy/bad-request", get(buggy::bad_request))
                .route("/api/buggy/server-error", get(buggy::server_error))
                .route("/api/buggy/unauthorised", get(buggy::unauthorised))
                .route("/api/buggy/validation-error", get(buggy::validation_error));
        }

        let mut router = api
            .route_layer(middleware::from_fn(metrics::track_requests))
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_fault))
            .layer(middleware::from_fn_with_state(config.environment, render_faults))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(cors_layer(&config.cors));

        if config.security.enable_headers {
            router = apply_security_headers(router);
        }

        #[allow(deprecated)]
        let timeout = TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs));

        router
            .layer(timeout)
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_concurrent_requests))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let prune_interval = Duration::from_secs(self.config.rate_limit.prune_interval_secs.max(1));
        tokio::spawn(run_prune_loop(
            self.rate_limiter.clone(),
            prune_interval,
            shutdown.resubscribe(),
        ));

        match self.config.listener.tls.clone() {
            Some(tls) => self.serve_tls(listener, addr, &tls.cert_path, &tls.key_path, shutdown).await,
            None => self.serve_plain(listener, addr, shutdown).await,
        }
    }

    async fn serve_plain(
        self,
        listener: TcpListener,
        addr: SocketAddr,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTP server starting");

        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        let (draining_tx, draining_rx) = oneshot::channel();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
                let _ = draining_tx.send(());
            })
            .into_future();

        // Connections still open once the grace period is over are dropped.
        tokio::select! {
            result = serve => result?,
            _ = drain_deadline(draining_rx, grace) => {
                tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed, dropping open connections");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    async fn serve_tls(
        self,
        listener: TcpListener,
        addr: SocketAddr,
        cert_path: &str,
        key_path: &str,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let tls = load_tls_config(Path::new(cert_path), Path::new(key_path)).await?;
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = Handle::new();
        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTPS server draining");
            drain.graceful_shutdown(Some(grace));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::from_tcp_rustls(listener.into_std()?, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Completes `grace` after draining starts. Never completes if it does not.
async fn drain_deadline(draining: oneshot::Receiver<()>, grace: Duration) {
    if draining.await.is_ok() {
        tokio::time::sleep(grace).await;
    } else {
        std::future::pending::<()>().await;
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}
