use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One rubric row. Rows are additive; re-grading a criterion inserts a new row.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grade")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub document_id: i32,
    #[sea_orm(indexed)]
    pub evaluator_id: i32,

    pub rubric_criteria: String,
    pub score: f64,
    pub max_score: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,

    /// One-way: once released a grade is never hidden or edited again.
    #[sea_orm(default_value = false)]
    pub is_released: bool,

    pub graded_at: DateTimeUtc,
    pub released_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
