use common::DocumentType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deadline")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Free-form key; also matches custom document types.
    #[sea_orm(unique)]
    pub deadline_type: String,
    /// When set, deleting the deadline deletes every document of this type.
    pub document_type: Option<DocumentType>,

    pub deadline: DateTimeUtc,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(default_value = true, indexed)]
    pub is_active: bool,
    pub set_by_id: Option<i32>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
