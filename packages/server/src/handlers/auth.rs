use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::user::UserResponse;
use crate::services::user::UserService;
use crate::state::AppState;

/// Return the directory entry behind the caller's token.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Current user",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account deactivated (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Token subject has no account (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::new(&state).get(auth_user.user_id).await?;
    if !user.is_active {
        return Err(AppError::PermissionDenied);
    }
    Ok(Json(user.into()))
}
