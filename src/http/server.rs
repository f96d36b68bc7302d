//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Build the upstream HTTP client
//! - Inject the response cache into handler state
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::cache::{MemoryCache, ResponseCache};
use crate::config::{ProxyConfig, UpstreamConfig};
use crate::error::{ProxyError, ProxyResult};
use crate::http::proxy::proxy_handler;
use crate::net::InboundConnection;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn ResponseCache>,
    pub client: reqwest::Client,
    pub max_body_bytes: usize,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    cache: Arc<dyn ResponseCache>,
}

impl HttpServer {
    /// Create a server with a fresh in-memory cache.
    pub fn new(config: ProxyConfig) -> ProxyResult<Self> {
        Self::with_cache(config, Arc::new(MemoryCache::new()))
    }

    /// Create a server that stores responses in `cache`.
    pub fn with_cache(config: ProxyConfig, cache: Arc<dyn ResponseCache>) -> ProxyResult<Self> {
        let client = build_client(&config.upstream)?;

        let state = AppState {
            cache: cache.clone(),
            client,
            max_body_bytes: config.upstream.max_body_bytes,
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            cache,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream_timeout_secs = self.config.upstream.timeout_secs,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<InboundConnection>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(cached_entries = self.cache.len(), "HTTP server stopped");
        Ok(())
    }

    /// A clone of the router, for driving the proxy without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The cache this server reads and writes.
    pub fn cache(&self) -> Arc<dyn ResponseCache> {
        self.cache.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

fn build_client(config: &UpstreamConfig) -> ProxyResult<reqwest::Client> {
    let redirect = if config.follow_redirects {
        reqwest::redirect::Policy::limited(config.max_redirects)
    } else {
        reqwest::redirect::Policy::none()
    };

    reqwest::Client::builder()
        .timeout(config.timeout())
        .connect_timeout(config.timeout().min(Duration::from_secs(10)))
        .pool_idle_timeout(config.pool_idle_timeout())
        .redirect(redirect)
        .no_proxy()
        .build()
        .map_err(ProxyError::Client)
}
