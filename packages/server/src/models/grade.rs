use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::grade;
use crate::services::grade::{GradePatch, NewGrade};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateGradeRequest {
    #[schema(example = 12)]
    pub document_id: i32,
    #[schema(example = "Methodology")]
    pub rubric_criteria: String,
    #[schema(example = 8.5)]
    pub score: f64,
    #[schema(example = 10.0)]
    pub max_score: f64,
    pub feedback: Option<String>,
}

impl From<CreateGradeRequest> for NewGrade {
    fn from(r: CreateGradeRequest) -> Self {
        Self {
            document_id: r.document_id,
            rubric_criteria: r.rubric_criteria,
            score: r.score,
            max_score: r.max_score,
            feedback: r.feedback,
        }
    }
}

/// Absent fields keep their current value.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateGradeRequest {
    pub rubric_criteria: Option<String>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub feedback: Option<String>,
}

impl From<UpdateGradeRequest> for GradePatch {
    fn from(r: UpdateGradeRequest) -> Self {
        Self {
            rubric_criteria: r.rubric_criteria,
            score: r.score,
            max_score: r.max_score,
            feedback: r.feedback,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GradeResponse {
    pub id: i32,
    pub document_id: i32,
    pub evaluator_id: i32,
    pub rubric_criteria: String,
    pub score: f64,
    pub max_score: f64,
    pub feedback: Option<String>,
    pub is_released: bool,
    pub graded_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

impl From<grade::Model> for GradeResponse {
    fn from(m: grade::Model) -> Self {
        Self {
            id: m.id,
            document_id: m.document_id,
            evaluator_id: m.evaluator_id,
            rubric_criteria: m.rubric_criteria,
            score: m.score,
            max_score: m.max_score,
            feedback: m.feedback,
            is_released: m.is_released,
            graded_at: m.graded_at,
            released_at: m.released_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GradingCompleteResponse {
    pub document_id: i32,
    pub evaluator_id: i32,
    pub complete: bool,
}
