use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::validate_bulk_ids;
use super::user::UserResponse;
use crate::entity::project_group;
use crate::error::AppError;
use crate::services::group::GroupDetail;

/// Largest group a single request may enrol.
const MAX_MEMBERS: usize = 10;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateGroupRequest {
    #[schema(example = "Team Orion")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 7)]
    pub supervisor_id: i32,
    #[serde(default)]
    #[schema(example = json!([11, 12, 13]))]
    pub student_ids: Vec<i32>,
}

pub fn validate_create_group(payload: &CreateGroupRequest) -> Result<(), AppError> {
    if payload.student_ids.is_empty() {
        return Ok(());
    }
    validate_bulk_ids(&payload.student_ids, "student_ids", MAX_MEMBERS)
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct GroupListQuery {
    /// Only groups supervised by this user.
    pub supervisor_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GroupResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub supervisor_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<project_group::Model> for GroupResponse {
    fn from(m: project_group::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            supervisor_id: m.supervisor_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GroupDetailResponse {
    #[serde(flatten)]
    pub group: GroupResponse,
    pub members: Vec<UserResponse>,
}

impl From<GroupDetail> for GroupDetailResponse {
    fn from(d: GroupDetail) -> Self {
        Self {
            group: d.group.into(),
            members: d.members.into_iter().map(Into::into).collect(),
        }
    }
}
