use chrono::{DateTime, Utc};
use common::{DocumentStatus, DocumentType};
use serde::{Deserialize, Serialize};

use crate::entity::{document, document_version};

#[derive(Deserialize, utoipa::IntoParams)]
pub struct DocumentListQuery {
    /// Only documents in this status.
    pub status: Option<DocumentStatus>,
    /// Only submitted documents.
    pub submitted: Option<bool>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusRequest {
    pub status: DocumentStatus,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentResponse {
    pub id: i32,
    pub student_id: i32,
    pub project_group_id: Option<i32>,
    pub supervisor_id: Option<i32>,
    pub doc_type: Option<DocumentType>,
    pub custom_type: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_size: i64,
    pub version: i32,
    pub status: DocumentStatus,
    pub is_submitted: bool,
    pub is_locked: bool,
    pub is_late_submission: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<document::Model> for DocumentResponse {
    fn from(m: document::Model) -> Self {
        Self {
            id: m.id,
            student_id: m.student_id,
            project_group_id: m.project_group_id,
            supervisor_id: m.supervisor_id,
            doc_type: m.doc_type,
            custom_type: m.custom_type,
            title: m.title,
            description: m.description,
            file_name: m.file_name,
            file_size: m.file_size,
            version: m.version,
            status: m.status,
            is_submitted: m.is_submitted,
            is_locked: m.is_locked,
            is_late_submission: m.is_late_submission,
            submitted_at: m.submitted_at,
            deadline: m.deadline,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VersionResponse {
    pub id: i32,
    pub document_id: i32,
    pub version_number: i32,
    pub file_name: String,
    pub file_size: i64,
    pub change_description: Option<String>,
    pub was_submitted: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl From<document_version::Model> for VersionResponse {
    fn from(m: document_version::Model) -> Self {
        Self {
            id: m.id,
            document_id: m.document_id,
            version_number: m.version_number,
            file_name: m.file_name,
            file_size: m.file_size,
            change_description: m.change_description,
            was_submitted: m.was_submitted,
            uploaded_at: m.uploaded_at,
        }
    }
}
