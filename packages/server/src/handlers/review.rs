use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::review::{CreateReviewRequest, ReviewResponse};
use crate::services::document::DocumentService;
use crate::services::review::ReviewService;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Reviews",
    operation_id = "createReview",
    summary = "Record a review decision",
    description = "The reviewer's role and decision select the document's next status. \
        Supervisor approval forwards the document to evaluators, evaluator approval marks it \
        EVALUATION_COMMITTEE_APPROVED, and committee approval marks it FINAL_APPROVED. Revision requests \
        reopen the document for a new upload. Documents already FINAL_APPROVED or REJECTED \
        cannot be reviewed.",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review recorded", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Role cannot review (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Document is terminal (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, auth_user, payload),
    fields(document_id = payload.document_id, reviewer_id = auth_user.user_id, decision = %payload.decision)
)]
pub async fn create_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let review = ReviewService::new(&state)
        .create(auth_user.user_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Reviews",
    operation_id = "getReview",
    summary = "Get a review",
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review", body = ReviewResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(review_id = id))]
pub async fn get_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = ReviewService::new(&state).get(id).await?;
    // Same visibility as the reviewed document.
    DocumentService::new(&state)
        .get(review.document_id, &auth_user)
        .await?;
    Ok(Json(review.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/reviews",
    tag = "Reviews",
    operation_id = "listDocumentReviews",
    summary = "Reviews of a document, newest first",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Reviews", body = Vec<ReviewResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(document_id = id))]
pub async fn list_document_reviews(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    DocumentService::new(&state).get(id, &auth_user).await?;
    let reviews = ReviewService::new(&state).list_for_document(id).await?;
    Ok(Json(reviews.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/reviewer/{reviewer_id}",
    tag = "Reviews",
    operation_id = "listReviewerReviews",
    summary = "Reviews written by a reviewer",
    params(("reviewer_id" = i32, Path, description = "Reviewer ID")),
    responses(
        (status = 200, description = "Reviews", body = Vec<ReviewResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(reviewer_id))]
pub async fn list_reviewer_reviews(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(reviewer_id): Path<i32>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    auth_user.require_self_or_committee(reviewer_id)?;
    let reviews = ReviewService::new(&state)
        .list_by_reviewer(reviewer_id)
        .await?;
    Ok(Json(reviews.into_iter().map(Into::into).collect()))
}
