use chrono::{DateTime, Utc};
use common::DocumentType;
use serde::{Deserialize, Serialize};

use crate::entity::deadline;
use crate::services::deadline::DeadlineInput;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SaveDeadlineRequest {
    /// Key of the deadline; saving an existing key updates it.
    #[schema(example = "Proposal")]
    pub deadline_type: String,
    pub document_type: Option<DocumentType>,
    #[schema(example = "2026-12-01T23:59:00Z")]
    pub deadline: DateTime<Utc>,
    pub description: Option<String>,
}

impl From<SaveDeadlineRequest> for DeadlineInput {
    fn from(r: SaveDeadlineRequest) -> Self {
        Self {
            deadline_type: r.deadline_type,
            document_type: r.document_type,
            deadline: r.deadline,
            description: r.description,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeadlineResponse {
    pub id: i32,
    pub deadline_type: String,
    pub document_type: Option<DocumentType>,
    pub deadline: DateTime<Utc>,
    pub description: Option<String>,
    pub is_active: bool,
    /// True once the deadline has passed; the deadline stays listed.
    pub is_expired: bool,
    pub set_by_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<deadline::Model> for DeadlineResponse {
    fn from(m: deadline::Model) -> Self {
        Self {
            id: m.id,
            is_expired: m.deadline < Utc::now(),
            deadline_type: m.deadline_type,
            document_type: m.document_type,
            deadline: m.deadline,
            description: m.description,
            is_active: m.is_active,
            set_by_id: m.set_by_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReminderRunResponse {
    /// Reminders written to student inboxes.
    #[schema(example = 14)]
    pub sent: usize,
}
