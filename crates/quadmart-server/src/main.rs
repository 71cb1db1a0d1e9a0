use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use quadmart_api::auth::{self, AppState, AppStateInner};
use quadmart_api::middleware::require_auth;
use quadmart_api::{cart, items, messages, orders, uploads};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quadmart=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("QUADMART_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("QUADMART_DB_PATH").unwrap_or_else(|_| "quadmart.db".into());
    let upload_dir = std::env::var("QUADMART_UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into());
    let host = std::env::var("QUADMART_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("QUADMART_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = quadmart_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        upload_dir: PathBuf::from(upload_dir),
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/external", post(auth::external))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/items", get(items::list_items))
        .route("/items", post(items::create_item))
        .route("/items/{item_id}", get(items::get_item))
        .route("/items/{item_id}", put(items::update_item))
        .route("/items/{item_id}", delete(items::delete_item))
        .route("/items/{item_id}/messages", get(messages::get_item_messages))
        .route("/messages", get(messages::get_user_messages))
        .route("/messages", post(messages::send_message))
        .route("/cart", get(cart::list_cart))
        .route("/cart", post(cart::add_to_cart))
        .route("/cart/{item_id}", delete(cart::remove_from_cart))
        .route("/wishlist", get(cart::list_wishlist))
        .route("/wishlist", post(cart::add_to_wishlist))
        .route("/wishlist/{item_id}", delete(cart::remove_from_wishlist))
        .route("/checkout", post(orders::checkout))
        .route("/uploads", post(uploads::upload))
        .route("/uploads/{file_id}", get(uploads::download))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Quadmart server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
