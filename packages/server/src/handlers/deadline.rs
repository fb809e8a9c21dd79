use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use common::{DocumentType, Role};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::deadline::{DeadlineResponse, ReminderRunResponse, SaveDeadlineRequest};
use crate::services::deadline::DeadlineService;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Deadlines",
    operation_id = "saveDeadline",
    summary = "Create or update a deadline",
    description = "Keyed by `deadline_type`: saving an existing key replaces its date, document \
        type and description. Every student is notified. FYP committee only.",
    request_body = SaveDeadlineRequest,
    responses(
        (status = 200, description = "Saved deadline", body = DeadlineResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(deadline_type = %payload.deadline_type))]
pub async fn save_deadline(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SaveDeadlineRequest>,
) -> Result<Json<DeadlineResponse>, AppError> {
    let saved = DeadlineService::new(&state)
        .create_or_update(auth_user.user_id, payload.into())
        .await?;
    Ok(Json(saved.into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Deadlines",
    operation_id = "listDeadlines",
    summary = "Every deadline, soonest first",
    responses(
        (status = 200, description = "Deadlines", body = Vec<DeadlineResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_deadlines(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<DeadlineResponse>>, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    let deadlines = DeadlineService::new(&state).list_all().await?;
    Ok(Json(deadlines.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/active",
    tag = "Deadlines",
    operation_id = "listActiveDeadlines",
    summary = "Active deadlines",
    description = "Includes active deadlines that have already passed; see `is_expired`.",
    responses(
        (status = 200, description = "Deadlines", body = Vec<DeadlineResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_active_deadlines(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<DeadlineResponse>>, AppError> {
    let deadlines = DeadlineService::new(&state).list_active().await?;
    Ok(Json(deadlines.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Deadlines",
    operation_id = "getDeadline",
    summary = "Get a deadline",
    params(("id" = i32, Path, description = "Deadline ID")),
    responses(
        (status = 200, description = "Deadline", body = DeadlineResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Deadline not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(deadline_id = id))]
pub async fn get_deadline(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeadlineResponse>, AppError> {
    let deadline = DeadlineService::new(&state).get(id).await?;
    Ok(Json(deadline.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Deadlines",
    operation_id = "deleteDeadline",
    summary = "Delete a deadline",
    description = "When the deadline names a document type, every document of that type is deleted \
        with it, files included. Students are notified. FYP committee only.",
    params(("id" = i32, Path, description = "Deadline ID")),
    responses(
        (status = 204, description = "Deadline deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Deadline not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(deadline_id = id))]
pub async fn delete_deadline(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    DeadlineService::new(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/{id}/deactivate",
    tag = "Deadlines",
    operation_id = "deactivateDeadline",
    summary = "Deactivate a deadline",
    params(("id" = i32, Path, description = "Deadline ID")),
    responses(
        (status = 200, description = "Deactivated deadline", body = DeadlineResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Deadline not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(deadline_id = id))]
pub async fn deactivate_deadline(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeadlineResponse>, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    let deadline = DeadlineService::new(&state).deactivate(id).await?;
    Ok(Json(deadline.into()))
}

#[utoipa::path(
    get,
    path = "/type/{document_type}",
    tag = "Deadlines",
    operation_id = "getDeadlineByDocumentType",
    summary = "Deadline of a built-in document type",
    params(("document_type" = DocumentType, Path, description = "Document type")),
    responses(
        (status = 200, description = "Deadline", body = DeadlineResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No deadline for this type (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(%document_type))]
pub async fn get_deadline_by_document_type(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(document_type): Path<DocumentType>,
) -> Result<Json<DeadlineResponse>, AppError> {
    let deadline = DeadlineService::new(&state)
        .by_document_type(document_type)
        .await?;
    Ok(Json(deadline.into()))
}

#[utoipa::path(
    get,
    path = "/name/{deadline_type}",
    tag = "Deadlines",
    operation_id = "getDeadlineByName",
    summary = "Deadline by its key",
    params(("deadline_type" = String, Path, description = "Deadline key")),
    responses(
        (status = 200, description = "Deadline", body = DeadlineResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Deadline not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(%deadline_type))]
pub async fn get_deadline_by_name(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(deadline_type): Path<String>,
) -> Result<Json<DeadlineResponse>, AppError> {
    let deadline = DeadlineService::new(&state)
        .by_deadline_type(&deadline_type)
        .await?;
    Ok(Json(deadline.into()))
}

#[utoipa::path(
    post,
    path = "/reminders",
    tag = "Deadlines",
    operation_id = "sendDeadlineReminders",
    summary = "Remind students of approaching deadlines",
    description = "Runs one reminder pass now, using the configured window. Students who already \
        uploaded a matching document are skipped. Reminders are not de-duplicated.",
    responses(
        (status = 200, description = "Reminders written", body = ReminderRunResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn send_reminders(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ReminderRunResponse>, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    let sent = DeadlineService::new(&state)
        .notify_approaching(Utc::now(), state.config.reminders.window_days)
        .await?;
    Ok(Json(ReminderRunResponse { sent }))
}
