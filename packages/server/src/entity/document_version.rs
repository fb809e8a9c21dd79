use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only history of uploaded files for a document.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document_version")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub document_id: i32,
    pub version_number: i32,

    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub change_description: Option<String>,
    #[sea_orm(default_value = false)]
    pub was_submitted: bool,

    pub uploaded_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
