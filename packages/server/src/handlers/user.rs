use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::Role;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::document::DocumentResponse;
use crate::models::group::GroupDetailResponse;
use crate::models::user::{
    AssignSupervisorRequest, AssignedCountResponse, CreateUserRequest, UpdateProfileRequest,
    UserListQuery, UserResponse,
};
use crate::services::document::DocumentService;
use crate::services::grade::{GradeService, Transcript};
use crate::services::group::GroupService;
use crate::services::user::UserService;
use crate::state::AppState;

/// The caller is the user, or any staff role.
fn require_self_or_staff(auth_user: &AuthUser, user_id: i32) -> Result<(), AppError> {
    if auth_user.user_id == user_id || auth_user.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a directory entry",
    description = "FYP committee only. Email and registration number must be unique.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Email or registration number taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(role = %payload.role))]
pub async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    let user = UserService::new(&state).create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users, optionally by role",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    auth_user.require_any_role(&[Role::Supervisor, Role::FypCommittee])?;
    let users = UserService::new(&state).list(query.role).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = id))]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    require_self_or_staff(&auth_user, id)?;
    let user = UserService::new(&state).get(id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateProfile",
    summary = "Update profile fields",
    description = "Absent fields are left untouched. Users edit their own profile; the committee may edit anyone's.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = id))]
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_self_or_committee(id)?;
    let user = UserService::new(&state)
        .update_profile(id, payload.into())
        .await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}/deactivate",
    tag = "Users",
    operation_id = "deactivateUser",
    summary = "Deactivate an account",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deactivated user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = id))]
pub async fn deactivate_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    let user = UserService::new(&state).deactivate(id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}/supervisor",
    tag = "Users",
    operation_id = "assignStudentSupervisor",
    summary = "Assign a supervisor to a student",
    params(("id" = i32, Path, description = "Student ID")),
    request_body = AssignSupervisorRequest,
    responses(
        (status = 200, description = "Updated student", body = UserResponse),
        (status = 400, description = "Role mismatch (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(student_id = id, supervisor_id = payload.supervisor_id))]
pub async fn assign_supervisor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AssignSupervisorRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    let student = UserService::new(&state)
        .assign_supervisor_to_student(id, payload.supervisor_id)
        .await?;
    Ok(Json(student.into()))
}

#[utoipa::path(
    patch,
    path = "/assign-supervisor-all",
    tag = "Users",
    operation_id = "assignSupervisorToAllStudents",
    summary = "Assign one supervisor to every student",
    request_body = AssignSupervisorRequest,
    responses(
        (status = 200, description = "Number of students updated", body = AssignedCountResponse),
        (status = 400, description = "User is not a supervisor (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Supervisor not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(supervisor_id = payload.supervisor_id))]
pub async fn assign_supervisor_to_all(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AssignSupervisorRequest>,
) -> Result<Json<AssignedCountResponse>, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    let updated = UserService::new(&state)
        .assign_supervisor_to_all_students(payload.supervisor_id)
        .await?;
    Ok(Json(AssignedCountResponse { updated }))
}

#[utoipa::path(
    get,
    path = "/{id}/students",
    tag = "Users",
    operation_id = "listSupervisedStudents",
    summary = "Students supervised by a supervisor",
    params(("id" = i32, Path, description = "Supervisor ID")),
    responses(
        (status = 200, description = "Students", body = Vec<UserResponse>),
        (status = 400, description = "User is not a supervisor (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(supervisor_id = id))]
pub async fn supervised_students(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    auth_user.require_self_or_committee(id)?;
    let students = UserService::new(&state).supervised_students(id).await?;
    Ok(Json(students.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}/group",
    tag = "Users",
    operation_id = "getStudentGroup",
    summary = "The project group a student belongs to",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Group with members", body = GroupDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found or not grouped (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(student_id = id))]
pub async fn student_group(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GroupDetailResponse>, AppError> {
    require_self_or_staff(&auth_user, id)?;
    let detail = GroupService::new(&state)
        .group_of_student(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student is not in a group".into()))?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/documents",
    tag = "Users",
    operation_id = "listStudentDocuments",
    summary = "Documents of a student or their group",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Documents", body = Vec<DocumentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(student_id = id))]
pub async fn student_documents(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    require_self_or_staff(&auth_user, id)?;
    let docs = DocumentService::new(&state).list_for_student(id).await?;
    Ok(Json(docs.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}/supervised-documents",
    tag = "Users",
    operation_id = "listSupervisedDocuments",
    summary = "Documents a supervisor is responsible for",
    params(("id" = i32, Path, description = "Supervisor ID")),
    responses(
        (status = 200, description = "Documents", body = Vec<DocumentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(supervisor_id = id))]
pub async fn supervised_documents(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    auth_user.require_self_or_committee(id)?;
    let docs = DocumentService::new(&state).list_for_supervisor(id).await?;
    Ok(Json(docs.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}/transcript",
    tag = "Users",
    operation_id = "getStudentTranscript",
    summary = "Detailed marks certificate",
    description = "Built from released grades only. Documents with nothing released are omitted \
        and an empty certificate reports zero totals.",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Transcript", body = Transcript),
        (status = 400, description = "User is not a student (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(student_id = id))]
pub async fn transcript(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Transcript>, AppError> {
    require_self_or_staff(&auth_user, id)?;
    let transcript = GradeService::new(&state).student_dmc(id).await?;
    Ok(Json(transcript))
}
