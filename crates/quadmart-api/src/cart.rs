use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use quadmart_db::models::{EntryRow, parse_created_at};
use quadmart_types::api::{AddEntryRequest, Claims, EntryResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::items::{item_response, parse_id};

// No sold-check here: a sold or barter item can sit in a cart; checkout is
// the sole gatekeeper and silently excludes it.
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = Uuid::new_v4().to_string();
    let uid = claims.sub.to_string();
    let row = blocking(move || db.db.add_cart_entry(&id, &uid, &req.item_id.to_string())).await?;
    Ok((StatusCode::CREATED, Json(entry_response(row)?)))
}

pub async fn list_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = blocking(move || db.db.list_cart(&uid)).await?;
    Ok(Json(entries_response(rows)?))
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    blocking(move || db.db.remove_cart_entry(&uid, &item_id.to_string())).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = Uuid::new_v4().to_string();
    let uid = claims.sub.to_string();
    let row =
        blocking(move || db.db.add_wishlist_entry(&id, &uid, &req.item_id.to_string())).await?;
    Ok((StatusCode::CREATED, Json(entry_response(row)?)))
}

pub async fn list_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = blocking(move || db.db.list_wishlist(&uid)).await?;
    Ok(Json(entries_response(rows)?))
}

pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    blocking(move || db.db.remove_wishlist_entry(&uid, &item_id.to_string())).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn entry_response(row: EntryRow) -> Result<EntryResponse, ApiError> {
    Ok(EntryResponse {
        id: parse_id(&row.id, "entry")?,
        created_at: parse_created_at(&row.created_at),
        item: item_response(row.item)?,
    })
}

fn entries_response(rows: Vec<EntryRow>) -> Result<Vec<EntryResponse>, ApiError> {
    rows.into_iter().map(entry_response).collect()
}
