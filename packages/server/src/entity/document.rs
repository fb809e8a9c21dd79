use common::{DocumentStatus, DocumentType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// The uploading student.
    #[sea_orm(indexed)]
    pub student_id: i32,
    /// Set when the uploader belonged to a group at creation time.
    #[sea_orm(indexed)]
    pub project_group_id: Option<i32>,
    #[sea_orm(indexed)]
    pub supervisor_id: Option<i32>,

    /// Exactly one of `doc_type` and `custom_type` is set.
    #[sea_orm(indexed)]
    pub doc_type: Option<DocumentType>,
    pub custom_type: Option<String>,

    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub version: i32,

    #[sea_orm(indexed)]
    pub status: DocumentStatus,
    #[sea_orm(default_value = false)]
    pub is_submitted: bool,
    #[sea_orm(default_value = false)]
    pub is_locked: bool,
    #[sea_orm(default_value = false)]
    pub is_late_submission: bool,
    pub submitted_at: Option<DateTimeUtc>,
    /// Copied from the matching deadline when the document was created.
    pub deadline: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
