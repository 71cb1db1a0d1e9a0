use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ItemType;

// -- JWT Claims --

/// JWT claims shared between quadmart-api (handlers) and quadmart-server
/// (middleware wiring). Canonical definition lives here in quadmart-types
/// to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub display_name: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub college: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Identity payload handed over by the external verifier (OAuth callback
/// terminates outside the core; by the time this arrives the identity is
/// already proven).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalLoginRequest {
    pub external_id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub college: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub display_name: String,
    pub token: String,
}

// -- Users --

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub display_name: String,
    pub college: String,
}

// -- Items --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub item_type: ItemType,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub expected_exchange: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: Uuid,
    pub owner: UserSummary,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub item_type: ItemType,
    pub price: Option<Decimal>,
    pub expected_exchange: Option<String>,
    pub is_sold: bool,
    pub created_at: DateTime<Utc>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub item_id: Uuid,
    pub receiver_id: Uuid,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub file: Option<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    pub file_type: String,
    pub file_name: String,
}

/// One message in an item thread, as seen by a participant.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub sender: UserSummary,
    pub receiver: UserSummary,
    pub body: Option<String>,
    pub file: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

/// Inbox view: every message the user sent or received, with the listing
/// it concerns attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxMessageResponse {
    pub id: Uuid,
    pub item: ItemSummary,
    pub sender: UserSummary,
    pub receiver: UserSummary,
    pub body: Option<String>,
    pub file: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: Uuid,
    pub title: String,
    pub item_type: ItemType,
    pub price: Option<Decimal>,
    pub is_sold: bool,
}

// -- Cart & wishlist --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct AddEntryRequest {
    pub item_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: Uuid,
    pub item: ItemResponse,
    pub created_at: DateTime<Utc>,
}

// -- Orders --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub item_id: Uuid,
    pub title: String,
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub total: Decimal,
    pub items: Vec<OrderLineResponse>,
    pub created_at: DateTime<Utc>,
}

// -- Uploads --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub file_type: String,
    pub file_name: String,
    pub size: u64,
}
