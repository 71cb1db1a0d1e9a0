use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use quadmart_db::checkout::Receipt;
use quadmart_db::models::parse_created_at;
use quadmart_types::api::{Claims, OrderLineResponse, OrderResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::items::parse_id;

/// POST /checkout — converts the caller's cart into an order in one store
/// transaction. Precondition failures (empty cart, nothing sellable) come
/// back as 500 with the error text in the body.
pub async fn checkout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let receipt = blocking(move || db.db.checkout(&uid)).await?;
    Ok((StatusCode::CREATED, Json(order_response(receipt)?)))
}

fn order_response(receipt: Receipt) -> Result<OrderResponse, ApiError> {
    let items = receipt
        .lines
        .into_iter()
        .map(|line| {
            Ok(OrderLineResponse {
                item_id: parse_id(&line.item_id, "item")?,
                title: line.title,
                price: line.price,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(OrderResponse {
        id: parse_id(&receipt.order_id, "order")?,
        total: receipt.total,
        items,
        created_at: parse_created_at(&receipt.created_at),
    })
}
