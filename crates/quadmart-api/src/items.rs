use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use quadmart_db::items::ItemInput;
use quadmart_db::models::{ItemRow, parse_created_at};
use quadmart_types::api::{Claims, CreateItemRequest, ItemResponse, ItemSummary, UserSummary};
use quadmart_types::models::ItemType;

use crate::blocking;
use crate::error::ApiError;
use crate::auth::AppState;

pub async fn list_items(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_items()).await?;
    let items = rows
        .into_iter()
        .map(item_response)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_item(&item_id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("item"))?;
    Ok(Json(item_response(row)?))
}

pub async fn create_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = ValidatedFields::try_from(&req)?;

    let item_id = Uuid::new_v4();
    let db = state.clone();
    let id = item_id.to_string();
    let owner = claims.sub.to_string();
    let row = blocking(move || {
        db.db.create_item(&id, &owner, &fields.as_input(&req))?;
        db.db
            .get_item(&id)?
            .ok_or_else(|| quadmart_db::StoreError::Integrity(format!("item {} vanished after insert", id)))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(item_response(row)?)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = ValidatedFields::try_from(&req)?;

    let db = state.clone();
    let id = item_id.to_string();
    let caller = claims.sub.to_string();
    let row = blocking(move || db.db.update_item(&id, &caller, &fields.as_input(&req))).await?;

    Ok(Json(item_response(row)?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = item_id.to_string();
    let caller = claims.sub.to_string();
    blocking(move || db.db.delete_item(&id, &caller)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sellability invariant: price is present iff the item is for sale,
/// expected exchange iff it is for barter. The irrelevant field is dropped
/// rather than rejected, so clients can reuse one form for both kinds.
struct ValidatedFields {
    price: Option<String>,
    keep_exchange: bool,
}

impl ValidatedFields {
    fn try_from(req: &CreateItemRequest) -> Result<Self, ApiError> {
        if req.title.trim().is_empty() {
            return Err(ApiError::Validation("title must not be empty".into()));
        }
        if req.description.trim().is_empty() {
            return Err(ApiError::Validation("description must not be empty".into()));
        }
        if req.category.trim().is_empty() {
            return Err(ApiError::Validation("category must not be empty".into()));
        }

        match req.item_type {
            ItemType::Sell => {
                let price = req
                    .price
                    .ok_or_else(|| ApiError::Validation("price is required for sale items".into()))?;
                if price < Decimal::ZERO {
                    return Err(ApiError::Validation("price must not be negative".into()));
                }
                Ok(Self {
                    price: Some(price.to_string()),
                    keep_exchange: false,
                })
            }
            ItemType::Barter => {
                let exchange_ok = req
                    .expected_exchange
                    .as_deref()
                    .is_some_and(|s| !s.trim().is_empty());
                if !exchange_ok {
                    return Err(ApiError::Validation(
                        "expected exchange is required for barter items".into(),
                    ));
                }
                Ok(Self {
                    price: None,
                    keep_exchange: true,
                })
            }
        }
    }

    fn as_input<'a>(&'a self, req: &'a CreateItemRequest) -> ItemInput<'a> {
        ItemInput {
            title: &req.title,
            description: &req.description,
            category: &req.category,
            image_url: req.image_url.as_deref(),
            item_type: req.item_type.as_str(),
            price: self.price.as_deref(),
            expected_exchange: if self.keep_exchange {
                req.expected_exchange.as_deref()
            } else {
                None
            },
        }
    }
}

// -- row → response conversions shared across handlers --

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::Internal(format!("corrupt {} id '{}': {}", what, raw, e)))
}

pub(crate) fn parse_price(raw: Option<&str>) -> Result<Option<Decimal>, ApiError> {
    raw.map(|s| {
        s.parse()
            .map_err(|e| ApiError::Internal(format!("corrupt price '{}': {}", s, e)))
    })
    .transpose()
}

pub(crate) fn parse_item_type(raw: &str) -> Result<ItemType, ApiError> {
    ItemType::parse(raw).ok_or_else(|| ApiError::Internal(format!("corrupt item type '{}'", raw)))
}

pub(crate) fn item_response(row: ItemRow) -> Result<ItemResponse, ApiError> {
    Ok(ItemResponse {
        id: parse_id(&row.id, "item")?,
        owner: UserSummary {
            id: parse_id(&row.owner_id, "user")?,
            display_name: row.owner_name,
            college: row.owner_college,
        },
        title: row.title,
        description: row.description,
        category: row.category,
        image_url: row.image_url,
        item_type: parse_item_type(&row.item_type)?,
        price: parse_price(row.price.as_deref())?,
        expected_exchange: row.expected_exchange,
        is_sold: row.is_sold,
        created_at: parse_created_at(&row.created_at),
    })
}

pub(crate) fn item_summary(
    id: &str,
    title: String,
    item_type: &str,
    price: Option<&str>,
    is_sold: bool,
) -> Result<ItemSummary, ApiError> {
    Ok(ItemSummary {
        id: parse_id(id, "item")?,
        title,
        item_type: parse_item_type(item_type)?,
        price: parse_price(price)?,
        is_sold,
    })
}
