use common::{ReviewDecision, Role};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An immutable review record.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub document_id: i32,
    #[sea_orm(indexed)]
    pub reviewer_id: i32,
    pub reviewer_role: Role,

    #[sea_orm(column_type = "Text")]
    pub comments: String,
    pub decision: ReviewDecision,
    pub review_round: i32,

    pub reviewed_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
