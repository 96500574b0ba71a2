use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{delete, get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use airpower_auth::{
    AuthState, IdentityCache, JwtService, LocalIdentityCache, NoopIdentityCache,
    TokenAuthenticator, UserStorage,
};
use airpower_storage::DynDocumentStorage;

use crate::{
    config::AppConfig,
    handlers,
    middleware as app_middleware,
    middleware::{ApiRateLimiter, SharedRateLimiter},
    storage_adapter::{DocumentActivityLog, DocumentUserStore},
};

/// How often the identity cache sweeper runs.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct AppState {
    pub storage: DynDocumentStorage,
    pub auth: AuthState,
    pub users: Arc<dyn UserStorage>,
    pub jwt: Arc<JwtService>,
    pub cache: Arc<dyn IdentityCache>,
    pub limiter: SharedRateLimiter,
    pub config: Arc<AppConfig>,
    /// Serializes the duplicate-email check during registration. The
    /// storage layer has no unique index on email, so the check and the
    /// insert must not interleave.
    pub registration: Arc<tokio::sync::Mutex<()>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Wires storage, auth and the limiter together from configuration.
pub fn build_state(cfg: AppConfig) -> AppState {
    let storage = airpower_db_memory::create_storage();
    let users: Arc<dyn UserStorage> = Arc::new(DocumentUserStore::new(storage.clone()));

    let cache: Arc<dyn IdentityCache> = if cfg.auth.cache_enabled {
        Arc::new(LocalIdentityCache::new())
    } else {
        Arc::new(NoopIdentityCache)
    };
    let jwt = Arc::new(JwtService::new(cfg.auth.secret.as_bytes()));
    let authenticator = Arc::new(TokenAuthenticator::new(
        jwt.clone(),
        users.clone(),
        cache.clone(),
        cfg.auth.cache_ttl(),
    ));
    let activity = Arc::new(DocumentActivityLog::new(storage.clone()));
    let auth = AuthState::new(authenticator, activity);

    let limiter = Arc::new(ApiRateLimiter::new(&cfg.rate_limit));

    AppState {
        storage,
        auth,
        users,
        jwt,
        cache,
        limiter,
        config: Arc::new(cfg),
        registration: Arc::new(tokio::sync::Mutex::new(())),
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/budgets",
            get(handlers::budgets::list).post(handlers::budgets::create),
        )
        .route(
            "/budgets/{id}",
            get(handlers::budgets::get)
                .put(handlers::budgets::update)
                .delete(handlers::budgets::delete),
        )
        .route(
            "/budgets/category/{category}",
            get(handlers::budgets::by_category),
        )
        .route("/budgets/{id}/archive", post(handlers::budgets::archive))
        .route(
            "/readings",
            get(handlers::readings::list).post(handlers::readings::create),
        )
        .route(
            "/readings/{id}",
            get(handlers::readings::get)
                .put(handlers::readings::update)
                .delete(handlers::readings::delete),
        )
        .route(
            "/readings/{id}/anomaly",
            post(handlers::readings::flag_anomaly),
        )
        .route(
            "/recommendations",
            get(handlers::recommendations::generate).post(handlers::recommendations::save),
        )
        .route(
            "/recommendations/saved",
            get(handlers::recommendations::saved),
        )
        .route(
            "/recommendations/{id}",
            delete(handlers::recommendations::delete),
        )
        .route("/admin/users", get(handlers::admin::list_users))
        .route(
            "/admin/users/{id}/suspend",
            post(handlers::admin::suspend_user),
        )
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let frontend = state.config.frontend.clone();

    let mut app = Router::new()
        .route("/", get(handlers::health::root))
        .route("/healthz", get(handlers::health::healthz))
        .route("/readyz", get(handlers::health::readyz))
        .nest("/api", api_routes());

    // Serve the built frontend with an SPA fallback for non-API paths.
    if frontend.enabled {
        let index = format!("{}/index.html", frontend.dist_dir);
        let assets = ServeDir::new(&frontend.dist_dir).fallback(ServeFile::new(index));
        app = app.fallback_service(assets);
    }

    // Layers added later run earlier. Execution order: request id ->
    // trace -> compression -> cors -> rate limit -> security headers.
    // The request id layer must sit outside the trace layer: the span
    // reads the id from request extensions when it is created.
    app.layer(middleware::from_fn(app_middleware::security_headers))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::rate_limit,
        ))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %method,
                        http.target = %uri,
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub struct AirpowerServer {
    addr: SocketAddr,
    app: Router,
    cache: Arc<dyn IdentityCache>,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> AirpowerServer {
        let state = build_state(self.config);
        let cache = state.cache.clone();
        let app = build_app(state);

        AirpowerServer {
            addr: self.addr,
            app,
            cache,
        }
    }
}

impl AirpowerServer {
    pub async fn run(self) -> anyhow::Result<()> {
        spawn_cache_sweeper(self.cache.clone());

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    }
}

/// Periodically drops expired identities so an idle cache does not hold
/// stale entries forever.
fn spawn_cache_sweeper(cache: Arc<dyn IdentityCache>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.cleanup_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "expired cached identities removed");
            }
        }
    });
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
