use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};
use service::customer::{
    password::PasswordAlgorithm,
    repo::seaorm::SeaOrmCustomerRepository,
    repository::CustomerRepository,
    service::{AuthConfig, CustomerService},
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Translate the validated file/env auth section into service settings.
pub fn auth_config(cfg: &configs::AuthConfig) -> Result<AuthConfig, StartupError> {
    let password_algorithm = cfg
        .password_algorithm
        .parse::<PasswordAlgorithm>()
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    Ok(AuthConfig {
        jwt_secret: cfg.jwt_secret.clone(),
        token_ttl_secs: cfg.token_ttl_secs,
        bcrypt_cost: cfg.bcrypt_cost,
        password_algorithm,
    })
}

/// Wire a customer service over any repository; tests pass the in-memory one.
pub fn state_with_repository(
    repo: Arc<dyn CustomerRepository>,
    auth: AuthConfig,
    secure_cookie: bool,
) -> Result<ServerState, StartupError> {
    let customers = CustomerService::new(repo, auth).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    Ok(ServerState { customers: Arc::new(customers), secure_cookie })
}

pub fn build_state(db: DatabaseConnection, cfg: &configs::AuthConfig) -> Result<ServerState, StartupError> {
    let repo: Arc<dyn CustomerRepository> = Arc::new(SeaOrmCustomerRepository::new(db));
    state_with_repository(repo, auth_config(cfg)?, cfg.cookie_secure)
}

/// Router with the default CORS policy.
pub fn app(state: ServerState) -> Router {
    routes::build_router(build_cors(), state)
}

/// Public entry: load config, migrate, build the app and serve until the
/// future is dropped.
pub async fn run() -> Result<(), StartupError> {
    dotenv().ok();

    // 缺少 JWT_SECRET 时直接失败
    let cfg = configs::AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    models::db::migrate(&db).await?;
    info!("migrations applied");

    let state = build_state(db, &cfg.auth)?;
    let app = app(state);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address: {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(anyhow::Error::from)?;
    info!(%addr, algorithm = cfg.auth.password_algorithm.as_str(), "starting customer accounts server");
    axum::serve(listener, app).await.map_err(anyhow::Error::from)?;
    Ok(())
}
