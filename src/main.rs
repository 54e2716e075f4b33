mod api;
mod app_env;
mod auth;
mod domain;
mod dto;
mod external_connections;
mod logging;
mod persistence;
mod routing_utils;

use crate::auth::jwt::{TokenAuthority, TokenConfig};
use axum::extract::State;
use axum::routing::get;
use axum::{middleware, Json, Router};
use chrono::Duration;
use dotenv::dotenv;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Application state shared by every route
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
    pub tokens: TokenAuthority,
}

/// Extractor alias for the app's shared state
pub type AppState = State<Arc<SharedData>>;

#[derive(Serialize)]
struct ServiceInfo {
    message: &'static str,
    docs: &'static str,
    version: &'static str,
}

/// Greets API visitors at the root and points them at the interactive docs
async fn describe_service() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Welcome to the Multi-User Todo API",
        docs: "/swagger-ui",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Assembles the application's routes. The todo routes sit behind the bearer token
/// gate, registration and login do not.
pub fn application_routes(shared_data: Arc<SharedData>) -> Router {
    let authenticated_todo_routes = api::todo::todo_routes().route_layer(
        middleware::from_fn_with_state(shared_data.clone(), auth::require_bearer_user),
    );

    Router::new()
        .route("/", get(describe_service))
        .nest(
            "/api",
            api::user::user_routes().merge(authenticated_todo_routes),
        )
        .merge(api::swagger_main::build_documentation())
        .layer(CorsLayer::permissive())
        .with_state(shared_data)
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    logging::setup_logging(logging::init_env_filter());

    let db_url = env::var(app_env::DB_URL).expect("Could not get database URL from environment");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await
        .expect("Could not connect to the database");
    sqlx::migrate!()
        .run(&db_pool)
        .await
        .expect("Failed to apply database migrations");

    let jwt_secret = env::var(app_env::JWT_SECRET)
        .expect("Could not get the token signing secret from environment");
    let token_config = match env::var(app_env::TOKEN_TTL_MINUTES) {
        Ok(raw_minutes) => {
            let ttl_minutes: i64 = raw_minutes
                .parse()
                .expect("Token lifetime must be a whole number of minutes");
            TokenConfig::with_ttl(jwt_secret, Duration::minutes(ttl_minutes))
        }
        Err(_) => TokenConfig::new(jwt_secret),
    };

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
        tokens: TokenAuthority::new(token_config),
    });
    let app = logging::attach_tracing_http(application_routes(shared_data));

    let listener = TcpListener::bind("0.0.0.0:8000")
        .await
        .expect("Could not bind to port 8000");
    info!("Starting server.");
    axum::serve(listener, app)
        .await
        .expect("Could not start server.");
}
