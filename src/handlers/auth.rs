use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::middleware::AuthUser;

/// GET /api/auth/verify - confirm the token and echo the subject
pub async fn verify(Extension(user): Extension<AuthUser>) -> Json<Value> {
    Json(json!({
        "user": {
            "id": user.id,
            "email": user.email,
            "user_metadata": user.user_metadata
        }
    }))
}

/// GET /api/auth/me - current user profile from token claims
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<Value> {
    let full_name = user
        .user_metadata
        .get("full_name")
        .and_then(Value::as_str)
        .unwrap_or("");
    let avatar_url = user
        .user_metadata
        .get("avatar_url")
        .and_then(Value::as_str)
        .unwrap_or("");
    let provider = user
        .app_metadata
        .get("provider")
        .and_then(Value::as_str)
        .unwrap_or("email");

    Json(json!({
        "id": user.id,
        "email": user.email,
        "full_name": full_name,
        "avatar_url": avatar_url,
        "provider": provider
    }))
}
