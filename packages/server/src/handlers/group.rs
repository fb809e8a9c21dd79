use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::Role;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::chat::{ChatMessageResponse, SendMessageRequest};
use crate::models::group::{
    CreateGroupRequest, GroupDetailResponse, GroupListQuery, GroupResponse, validate_create_group,
};
use crate::services::chat::ChatService;
use crate::services::group::{GroupService, NewGroup};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Groups",
    operation_id = "createGroup",
    summary = "Create a project group",
    description = "FYP committee only. Listed students are enrolled and take the group's supervisor \
        as their own. A student may belong to one group.",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Supervisor or student not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name taken or student already grouped (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_group(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    validate_create_group(&payload)?;

    let detail = GroupService::new(&state)
        .create(NewGroup {
            name: payload.name,
            description: payload.description,
            supervisor_id: payload.supervisor_id,
            student_ids: payload.student_ids,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(GroupDetailResponse::from(detail))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Groups",
    operation_id = "listGroups",
    summary = "List project groups",
    params(GroupListQuery),
    responses(
        (status = 200, description = "Groups", body = Vec<GroupResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_groups(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<GroupListQuery>,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    if !auth_user.role.is_staff() {
        return Err(AppError::PermissionDenied);
    }
    let service = GroupService::new(&state);
    let groups = match query.supervisor_id {
        Some(supervisor_id) => service.list_by_supervisor(supervisor_id).await?,
        None => service.list().await?,
    };
    Ok(Json(groups.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Groups",
    operation_id = "getGroup",
    summary = "Get a group with its members",
    params(("id" = i32, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group", body = GroupDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(group_id = id))]
pub async fn get_group(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GroupDetailResponse>, AppError> {
    let detail = GroupService::new(&state).get(id).await?;
    let is_member = detail.members.iter().any(|m| m.id == auth_user.user_id);
    if !is_member && !auth_user.role.is_staff() {
        return Err(AppError::PermissionDenied);
    }
    Ok(Json(detail.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/students/{student_id}",
    tag = "Groups",
    operation_id = "addGroupStudent",
    summary = "Enrol a student in a group",
    params(
        ("id" = i32, Path, description = "Group ID"),
        ("student_id" = i32, Path, description = "Student ID"),
    ),
    responses(
        (status = 200, description = "Group with members", body = GroupDetailResponse),
        (status = 400, description = "User is not a student (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Group or student not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Student already grouped (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(group_id = id, student_id))]
pub async fn add_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, student_id)): Path<(i32, i32)>,
) -> Result<Json<GroupDetailResponse>, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    let detail = GroupService::new(&state).add_student(id, student_id).await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/messages",
    tag = "Groups",
    operation_id = "sendGroupMessage",
    summary = "Post to the group chat",
    description = "Members and the group's supervisor only.",
    params(("id" = i32, Path, description = "Group ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = ChatMessageResponse),
        (status = 400, description = "Empty message (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a participant (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(group_id = id, sender_id = auth_user.user_id))]
pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = ChatService::new(&state)
        .send(id, auth_user.user_id, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(ChatMessageResponse::from(message))))
}

#[utoipa::path(
    get,
    path = "/{id}/messages",
    tag = "Groups",
    operation_id = "listGroupMessages",
    summary = "Group chat history, oldest first",
    params(("id" = i32, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Messages", body = Vec<ChatMessageResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a participant (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(group_id = id))]
pub async fn list_messages(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ChatMessageResponse>>, AppError> {
    let messages = ChatService::new(&state)
        .messages(id, auth_user.user_id)
        .await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}
