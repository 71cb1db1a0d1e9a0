use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use quadmart_db::models::{FileRef, InboxRow, MessageRow, parse_created_at};
use quadmart_types::api::{
    Attachment, Claims, InboxMessageResponse, MessageResponse, SendMessageRequest, UserSummary,
};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::items::{item_summary, parse_id};

/// POST /messages — authorization is decided in the store, against current
/// message history, before anything is written.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let body = req.body.as_deref().map(str::trim).filter(|b| !b.is_empty());
    if body.is_none() && req.file.is_none() {
        return Err(ApiError::Validation(
            "a message needs text or a file".into(),
        ));
    }

    let message_id = Uuid::new_v4();
    let db = state.clone();
    let mid = message_id.to_string();
    let sender = claims.sub.to_string();
    let body = body.map(str::to_string);
    let row = blocking(move || {
        let file = req.file.map(|f| FileRef {
            url: f.url,
            file_type: f.file_type,
            file_name: f.file_name,
        });
        db.db.send_message(
            &mid,
            &req.item_id.to_string(),
            &sender,
            &req.receiver_id.to_string(),
            body.as_deref(),
            file.as_ref(),
        )
    })
    .await?;

    Ok((StatusCode::CREATED, Json(message_response(row)?)))
}

/// GET /items/{id}/messages — the requesting user's thread on one listing,
/// oldest first.
pub async fn get_item_messages(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = blocking(move || db.db.get_item_messages(&item_id.to_string(), &uid)).await?;
    let messages = rows
        .into_iter()
        .map(message_response)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(messages))
}

/// GET /messages — everything the user sent or received, newest first.
pub async fn get_user_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = blocking(move || db.db.get_user_messages(&uid)).await?;
    let messages = rows
        .into_iter()
        .map(inbox_response)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(messages))
}

fn attachment(file: Option<FileRef>) -> Option<Attachment> {
    file.map(|f| Attachment {
        url: f.url,
        file_type: f.file_type,
        file_name: f.file_name,
    })
}

fn message_response(row: MessageRow) -> Result<MessageResponse, ApiError> {
    Ok(MessageResponse {
        id: parse_id(&row.id, "message")?,
        item_id: parse_id(&row.item_id, "item")?,
        sender: UserSummary {
            id: parse_id(&row.sender_id, "user")?,
            display_name: row.sender_name,
            college: row.sender_college,
        },
        receiver: UserSummary {
            id: parse_id(&row.receiver_id, "user")?,
            display_name: row.receiver_name,
            college: row.receiver_college,
        },
        body: row.body,
        file: attachment(row.file),
        created_at: parse_created_at(&row.created_at),
    })
}

fn inbox_response(row: InboxRow) -> Result<InboxMessageResponse, ApiError> {
    let item = item_summary(
        &row.message.item_id,
        row.item_title,
        &row.item_type,
        row.item_price.as_deref(),
        row.item_sold,
    )?;
    let msg = message_response(row.message)?;
    Ok(InboxMessageResponse {
        id: msg.id,
        item,
        sender: msg.sender,
        receiver: msg.receiver,
        body: msg.body,
        file: msg.file,
        created_at: msg.created_at,
    })
}
