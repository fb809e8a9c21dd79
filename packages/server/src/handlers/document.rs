use axum::Json;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::{DocumentType, Role};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::document::{
    DocumentListQuery, DocumentResponse, UpdateStatusRequest, VersionResponse,
};
use crate::models::user::AssignSupervisorRequest;
use crate::services::document::{DocumentService, NewDocument, Upload};
use crate::state::AppState;
use crate::utils::filename::{content_disposition_value, content_type_for};

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(64 * 1024 * 1024) // 64 MB
}

/// Fields read from a document upload form.
#[derive(Default)]
struct UploadForm {
    file: Option<Upload>,
    title: Option<String>,
    doc_type: Option<String>,
    custom_type: Option<String>,
    description: Option<String>,
    change_description: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "file" {
            let file_name = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
            form.file = Some(Upload {
                file_name,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;
        match name.as_str() {
            "title" => form.title = Some(text),
            "doc_type" => form.doc_type = Some(text),
            "custom_type" => form.custom_type = Some(text),
            "description" => form.description = Some(text),
            "change_description" => form.change_description = Some(text),
            _ => {} // Ignore unknown fields.
        }
    }

    Ok(form)
}

fn parse_doc_type(raw: Option<String>) -> Result<Option<DocumentType>, AppError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<DocumentType>()
            .map(Some)
            .map_err(|e| AppError::Validation(e.to_string())),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Documents",
    operation_id = "createDocument",
    summary = "Upload a new document",
    description = "Creates a document in DRAFT at version 1. Multipart fields: `file` (required), \
        `title` (required), and exactly one of `doc_type` or `custom_type`; `description` is optional. \
        Students only.",
    request_body(content_type = "multipart/form-data", description = "Document file and metadata"),
    responses(
        (status = 201, description = "Document created", body = DocumentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Document of this type already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Student)?;

    let form = read_upload_form(multipart).await?;
    let upload = form
        .file
        .ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let new = NewDocument {
        doc_type: parse_doc_type(form.doc_type)?,
        custom_type: form.custom_type,
        title: form.title.unwrap_or_default(),
        description: form.description,
    };

    let doc = DocumentService::new(&state)
        .create(auth_user.user_id, new, upload)
        .await?;
    Ok((StatusCode::CREATED, Json(DocumentResponse::from(doc))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Documents",
    operation_id = "listDocuments",
    summary = "List documents visible to the caller",
    description = "Students see their own (or their group's) documents. Staff may filter by \
        `status` or `submitted`; without filters supervisors see the documents they supervise, \
        evaluators see submitted documents and the committee sees everything.",
    params(DocumentListQuery),
    responses(
        (status = 200, description = "Documents", body = Vec<DocumentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_documents(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let service = DocumentService::new(&state);
    let docs = match (auth_user.role, query.status, query.submitted) {
        (Role::Student, _, _) => service.list_for_student(auth_user.user_id).await?,
        (_, Some(status), _) => service.list_by_status(status).await?,
        (_, None, Some(true)) => service.list_submitted().await?,
        (Role::Supervisor, None, _) => service.list_for_supervisor(auth_user.user_id).await?,
        (Role::Evaluator, None, _) => service.list_submitted().await?,
        (Role::FypCommittee, None, _) => service.list_all().await?,
    };
    Ok(Json(docs.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Documents",
    operation_id = "getDocument",
    summary = "Get a document",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document", body = DocumentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(document_id = id))]
pub async fn get_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DocumentResponse>, AppError> {
    let doc = DocumentService::new(&state).get(id, &auth_user).await?;
    Ok(Json(doc.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Documents",
    operation_id = "deleteDocument",
    summary = "Delete a document",
    description = "Owners may delete a document until it is submitted; the FYP committee at any time. \
        Versions, reviews, grades and stored files are removed with it.",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Document already submitted (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(document_id = id))]
pub async fn delete_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    DocumentService::new(&state).delete(id, &auth_user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/versions",
    tag = "Documents",
    operation_id = "uploadDocumentVersion",
    summary = "Upload a new version",
    description = "Replaces the document's file and bumps its version. A document waiting on a \
        revision returns to DRAFT. Multipart fields: `file` (required), `change_description`.",
    params(("id" = i32, Path, description = "Document ID")),
    request_body(content_type = "multipart/form-data", description = "New file"),
    responses(
        (status = 200, description = "Updated document", body = DocumentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Document is locked (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(document_id = id))]
pub async fn upload_version(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<DocumentResponse>, AppError> {
    let form = read_upload_form(multipart).await?;
    let upload = form
        .file
        .ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    let doc = DocumentService::new(&state)
        .upload_new_version(id, &auth_user, upload, form.change_description)
        .await?;
    Ok(Json(doc.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/versions",
    tag = "Documents",
    operation_id = "listDocumentVersions",
    summary = "Version history, newest first",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Versions", body = Vec<VersionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(document_id = id))]
pub async fn list_versions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<VersionResponse>>, AppError> {
    let versions = DocumentService::new(&state).versions(id, &auth_user).await?;
    Ok(Json(versions.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/submit",
    tag = "Documents",
    operation_id = "submitDocument",
    summary = "Submit a document for review",
    description = "Refused with DEADLINE_PASSED once the document's deadline is behind us. \
        The supervisor is notified.",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Submitted document", body = DocumentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already submitted (CONFLICT) or deadline passed (DEADLINE_PASSED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(document_id = id))]
pub async fn submit_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DocumentResponse>, AppError> {
    auth_user.require_role(Role::Student)?;
    let doc = DocumentService::new(&state).submit(id, &auth_user).await?;
    Ok(Json(doc.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}/supervisor",
    tag = "Documents",
    operation_id = "assignDocumentSupervisor",
    summary = "Assign a supervisor to a document",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = AssignSupervisorRequest,
    responses(
        (status = 200, description = "Updated document", body = DocumentResponse),
        (status = 400, description = "User is not a supervisor (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(document_id = id))]
pub async fn assign_supervisor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AssignSupervisorRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    auth_user.require_role(Role::FypCommittee)?;
    let doc = DocumentService::new(&state)
        .assign_supervisor(id, payload.supervisor_id)
        .await?;
    Ok(Json(doc.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}/status",
    tag = "Documents",
    operation_id = "updateDocumentStatus",
    summary = "Override a document's status",
    description = "Manual override for supervisors and the FYP committee. Terminal documents \
        (FINAL_APPROVED, REJECTED) cannot change.",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated document", body = DocumentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Document is terminal (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(document_id = id, status = %payload.status))]
pub async fn update_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    auth_user.require_any_role(&[Role::Supervisor, Role::FypCommittee])?;
    let doc = DocumentService::new(&state)
        .update_status(id, payload.status)
        .await?;
    Ok(Json(doc.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Documents",
    operation_id = "downloadDocument",
    summary = "Download the current file",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document or file not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(document_id = id))]
pub async fn download_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let (file_name, bytes) = DocumentService::new(&state).download(id, &auth_user).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&file_name))
        .header(header::CONTENT_LENGTH, bytes.len().to_string())
        .header(header::CONTENT_DISPOSITION, content_disposition_value(&file_name))
        .header(header::CACHE_CONTROL, "private, no-cache")
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
