use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{Aggregate, Role};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::grade::{
    CreateGradeRequest, GradeResponse, GradingCompleteResponse, UpdateGradeRequest,
};
use crate::services::document::DocumentService;
use crate::services::grade::GradeService;
use crate::state::AppState;

/// Graders may touch their own rows; the committee any row.
fn require_grader_of(auth_user: &AuthUser, evaluator_id: i32) -> Result<(), AppError> {
    if auth_user.role == Role::FypCommittee
        || (auth_user.role.can_grade() && auth_user.user_id == evaluator_id)
    {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Grades",
    operation_id = "createGrade",
    summary = "Grade one rubric criterion",
    description = "Each call stores one row. When a document reaches six rows it moves to \
        EVALUATION_COMMITTEE_APPROVED; an evaluator's sixth row also notifies the committee.",
    request_body = CreateGradeRequest,
    responses(
        (status = 201, description = "Grade stored", body = GradeResponse),
        (status = 400, description = "Score out of range (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Role cannot grade (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Document is FINAL_APPROVED or REJECTED (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, auth_user, payload),
    fields(document_id = payload.document_id, evaluator_id = auth_user.user_id)
)]
pub async fn create_grade(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateGradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let grade = GradeService::new(&state)
        .record(auth_user.user_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(GradeResponse::from(grade))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Grades",
    operation_id = "getGrade",
    summary = "Get a grade",
    params(("id" = i32, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Grade", body = GradeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Grade not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(grade_id = id))]
pub async fn get_grade(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GradeResponse>, AppError> {
    let grade = GradeService::new(&state).get(id).await?;
    if !auth_user.role.is_staff() {
        // Students see a grade once it is released on a document they own.
        if !grade.is_released {
            return Err(AppError::NotFound("Grade not found".into()));
        }
        DocumentService::new(&state)
            .get(grade.document_id, &auth_user)
            .await?;
    }
    Ok(Json(grade.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Grades",
    operation_id = "updateGrade",
    summary = "Edit an unreleased grade",
    params(("id" = i32, Path, description = "Grade ID")),
    request_body = UpdateGradeRequest,
    responses(
        (status = 200, description = "Updated grade", body = GradeResponse),
        (status = 400, description = "Score out of range (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Grade not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Grade already released (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(grade_id = id))]
pub async fn update_grade(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateGradeRequest>,
) -> Result<Json<GradeResponse>, AppError> {
    let service = GradeService::new(&state);
    let existing = service.get(id).await?;
    require_grader_of(&auth_user, existing.evaluator_id)?;
    let grade = service.update(id, payload.into()).await?;
    Ok(Json(grade.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}/release",
    tag = "Grades",
    operation_id = "releaseGrade",
    summary = "Release a single grade",
    params(("id" = i32, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Released grade", body = GradeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Grade not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Grade already released (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(grade_id = id))]
pub async fn release_grade(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GradeResponse>, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    let grade = GradeService::new(&state).release(id).await?;
    Ok(Json(grade.into()))
}

#[utoipa::path(
    get,
    path = "/evaluator/{evaluator_id}",
    tag = "Grades",
    operation_id = "listEvaluatorGrades",
    summary = "Grades entered by an evaluator",
    params(("evaluator_id" = i32, Path, description = "Evaluator ID")),
    responses(
        (status = 200, description = "Grades", body = Vec<GradeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(evaluator_id))]
pub async fn list_evaluator_grades(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(evaluator_id): Path<i32>,
) -> Result<Json<Vec<GradeResponse>>, AppError> {
    auth_user.require_self_or_committee(evaluator_id)?;
    let grades = GradeService::new(&state)
        .list_by_evaluator(evaluator_id)
        .await?;
    Ok(Json(grades.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}/grades",
    tag = "Grades",
    operation_id = "listDocumentGrades",
    summary = "Grades of a document",
    description = "Staff see every row. Students see released rows of their own documents.",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Grades", body = Vec<GradeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(document_id = id))]
pub async fn list_document_grades(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<GradeResponse>>, AppError> {
    DocumentService::new(&state).get(id, &auth_user).await?;
    let service = GradeService::new(&state);
    let grades = if auth_user.role.is_staff() {
        service.list_for_document(id).await?
    } else {
        service.released_for_document(id).await?
    };
    Ok(Json(grades.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    patch,
    path = "/{id}/grades/release",
    tag = "Grades",
    operation_id = "releaseDocumentGrades",
    summary = "Release every grade of a document",
    description = "FYP committee only. Marks the document FINAL_APPROVED and returns the \
        aggregate over all of its grades.",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Aggregate result", body = Aggregate),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "No grades to release (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(document_id = id))]
pub async fn release_document_grades(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Aggregate>, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    let aggregate = GradeService::new(&state).release_all(id).await?;
    Ok(Json(aggregate))
}

#[utoipa::path(
    get,
    path = "/{id}/grades/summary",
    tag = "Grades",
    operation_id = "documentGradeSummary",
    summary = "Aggregate of a document's released grades",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Aggregate result", body = Aggregate),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(document_id = id))]
pub async fn document_grade_summary(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Aggregate>, AppError> {
    DocumentService::new(&state).get(id, &auth_user).await?;
    let aggregate = GradeService::new(&state).released_totals(id).await?;
    Ok(Json(aggregate))
}

#[utoipa::path(
    get,
    path = "/{id}/grades/complete/{evaluator_id}",
    tag = "Grades",
    operation_id = "hasGradedAllCriteria",
    summary = "Whether an evaluator has graded all six criteria",
    params(
        ("id" = i32, Path, description = "Document ID"),
        ("evaluator_id" = i32, Path, description = "Evaluator ID"),
    ),
    responses(
        (status = 200, description = "Completion flag", body = GradingCompleteResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document or evaluator not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(document_id = id, evaluator_id))]
pub async fn grading_complete(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, evaluator_id)): Path<(i32, i32)>,
) -> Result<Json<GradingCompleteResponse>, AppError> {
    if !auth_user.role.is_staff() {
        return Err(AppError::PermissionDenied);
    }
    let complete = GradeService::new(&state)
        .has_graded_all_criteria(id, evaluator_id)
        .await?;
    Ok(Json(GradingCompleteResponse {
        document_id: id,
        evaluator_id,
        complete,
    }))
}
