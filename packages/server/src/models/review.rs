use chrono::{DateTime, Utc};
use common::{ReviewDecision, Role};
use serde::{Deserialize, Serialize};

use crate::entity::review;
use crate::services::review::NewReview;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    #[schema(example = 12)]
    pub document_id: i32,
    #[schema(example = "Methodology section needs a clearer evaluation plan.")]
    pub comments: String,
    pub decision: ReviewDecision,
    /// Defaults to 1.
    #[schema(example = 1)]
    pub review_round: Option<i32>,
}

impl From<CreateReviewRequest> for NewReview {
    fn from(r: CreateReviewRequest) -> Self {
        Self {
            document_id: r.document_id,
            comments: r.comments,
            decision: r.decision,
            review_round: r.review_round,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub id: i32,
    pub document_id: i32,
    pub reviewer_id: i32,
    pub reviewer_role: Role,
    pub comments: String,
    pub decision: ReviewDecision,
    pub review_round: i32,
    pub reviewed_at: DateTime<Utc>,
}

impl From<review::Model> for ReviewResponse {
    fn from(m: review::Model) -> Self {
        Self {
            id: m.id,
            document_id: m.document_id,
            reviewer_id: m.reviewer_id,
            reviewer_role: m.reviewer_role,
            comments: m.comments,
            decision: m.decision,
            review_round: m.review_round,
            reviewed_at: m.reviewed_at,
        }
    }
}
