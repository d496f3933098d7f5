use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::user_service::UserService;

/// GET /api/auth/whoami - Identity and role behind the presented token.
pub async fn whoami(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    let users = UserService::new().await?;
    let user = users.get(auth.user_id).await?;

    Ok(ApiResponse::success(json!({
        "id": user.id,
        "username": user.username,
        "display_name": user.display_name,
        "role": user.role,
        "status": user.status,
        "last_login_at": user.last_login_at,
    })))
}
