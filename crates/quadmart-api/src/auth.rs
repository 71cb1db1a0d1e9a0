use std::path::PathBuf;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use quadmart_db::Database;
use quadmart_types::api::{
    AuthResponse, Claims, ExternalLoginRequest, LoginRequest, RegisterRequest,
};

use crate::blocking;
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.display_name.trim().is_empty() || req.display_name.len() > 64 {
        return Err(ApiError::Validation("display name must be 1-64 characters".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("email is not valid".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation("password must be at least 8 characters".into()));
    }

    let db = state.clone();
    let email = req.email.clone();
    if blocking(move || db.db.get_user_by_email(&email)).await?.is_some() {
        return Err(ApiError::Conflict("account"));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hash failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();

    let db = state.clone();
    let uid = user_id.to_string();
    let display_name = req.display_name.clone();
    blocking(move || {
        db.db
            .create_user(&uid, &req.display_name, &req.email, &password_hash, &req.college)
    })
    .await?;

    let token = create_token(&state.jwt_secret, user_id, &display_name)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            display_name,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let email = req.email.clone();
    let user = blocking(move || db.db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // External-identity accounts have no password to verify against.
    let stored_hash = user.password.as_deref().ok_or(ApiError::Unauthorized)?;
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(format!("stored hash unparseable: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(format!("corrupt user id '{}': {}", user.id, e)))?;

    let token = create_token(&state.jwt_secret, user_id, &user.display_name)?;

    Ok(Json(AuthResponse {
        user_id,
        display_name: user.display_name,
        token,
    }))
}

/// Login with an identity already verified by the external provider. Links
/// the external id onto an existing account with a matching email, or
/// creates a passwordless account on first sight.
pub async fn external(
    State(state): State<AppState>,
    Json(req): Json<ExternalLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.external_id.is_empty() || !req.email.contains('@') {
        return Err(ApiError::Validation("external identity is incomplete".into()));
    }

    let db = state.clone();
    let user = blocking(move || {
        db.db.find_or_create_external_user(
            &req.external_id,
            &req.email,
            &req.display_name,
            req.college.as_deref().unwrap_or(""),
        )
    })
    .await?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(format!("corrupt user id '{}': {}", user.id, e)))?;

    let token = create_token(&state.jwt_secret, user_id, &user.display_name)?;

    Ok(Json(AuthResponse {
        user_id,
        display_name: user.display_name,
        token,
    }))
}

fn create_token(secret: &str, user_id: Uuid, display_name: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        display_name: display_name.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token encode failed: {}", e)))
}
