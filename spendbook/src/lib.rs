//! Spendbook: a personal expense tracker with cookie-based JWT authentication.
//!
//! The HTTP surface is small:
//! - `/api/auth/*` — register, login, logout, refresh-token
//! - `/api/expenses` — paginated, filterable CRUD scoped to the authenticated user
//! - `/healthz` — liveness probe
//! - `/docs` — interactive API documentation
//!
//! Authentication uses two JWTs carried in HttpOnly cookies: a short-lived
//! access token and a longer-lived refresh token, each signed with its own
//! secret. There is no server-side session store and no token revocation;
//! logout clears the access cookie and issued tokens remain valid until they
//! expire.

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod telemetry;
#[cfg(test)]
pub mod test_utils;
pub mod types;

pub use config::Config;

/// Embedded database migrations, applied at startup
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Shared application state available to all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

/// Create CORS layer for the configured client origin.
///
/// Credentials are allowed because authentication rides on cookies, which also
/// rules out a wildcard origin.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origin = config.client_origin.parse::<HeaderValue>()?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Build the application router with all endpoints and middleware
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;

    let auth_routes = Router::new()
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        .route("/logout", post(api::handlers::auth::logout))
        .route("/refresh-token", post(api::handlers::auth::refresh_token));

    let expense_routes = Router::new()
        .route(
            "/",
            get(api::handlers::expenses::list_expenses).post(api::handlers::expenses::create_expense),
        )
        .route(
            "/{id}",
            put(api::handlers::expenses::update_expense).delete(api::handlers::expenses::delete_expense),
        );

    Ok(Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/expenses", expense_routes)
        .merge(Scalar::with_url("/docs", openapi::ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .with_state(state))
}

/// The running application: a configured router plus its database pool.
///
/// Lifecycle: [`Application::new`] connects to the database and runs
/// migrations; [`Application::serve`] binds the listener and handles requests
/// until the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with migrations applied
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await?;

        MIGRATOR.run(&pool).await?;

        let state = AppState {
            db: pool.clone(),
            config: config.clone(),
        };
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Serve the application until the shutdown future resolves
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Spendbook listening on http://{bind_addr}");

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
