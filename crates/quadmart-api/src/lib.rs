pub mod auth;
pub mod cart;
pub mod error;
pub mod items;
pub mod messages;
pub mod middleware;
pub mod orders;
pub mod uploads;

pub use error::ApiError;

use quadmart_db::StoreError;

/// Run a blocking store operation off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("spawn_blocking join error: {}", e)))?
        .map_err(ApiError::from)
}
