use common::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A directory entry. Credentials live with the identity service.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,

    #[sea_orm(indexed)]
    pub role: Role,

    /// Students only. Blank input is stored as NULL so the unique index holds.
    #[sea_orm(unique)]
    pub registration_number: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    /// Default supervisor of a student.
    #[sea_orm(indexed)]
    pub supervisor_id: Option<i32>,

    /// A student belongs to at most one group.
    #[sea_orm(indexed)]
    pub project_group_id: Option<i32>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
