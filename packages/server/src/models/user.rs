use chrono::{DateTime, Utc};
use common::Role;
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::services::user::{NewUser, ProfilePatch};

/// Request body for creating a directory entry.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "ayesha@uni.edu")]
    pub email: String,
    #[schema(example = "Ayesha Khan")]
    pub full_name: String,
    pub role: Role,
    /// Students only. Blank is stored as no registration number.
    #[schema(example = "FA21-BSE-001")]
    pub registration_number: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(r: CreateUserRequest) -> Self {
        Self {
            email: r.email,
            full_name: r.full_name,
            role: r.role,
            registration_number: r.registration_number,
            department: r.department,
            phone_number: r.phone_number,
        }
    }
}

/// Profile fields a user may change. Absent fields are left untouched.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
}

impl From<UpdateProfileRequest> for ProfilePatch {
    fn from(r: UpdateProfileRequest) -> Self {
        Self {
            full_name: r.full_name,
            department: r.department,
            phone_number: r.phone_number,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AssignSupervisorRequest {
    #[schema(example = 7)]
    pub supervisor_id: i32,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct UserListQuery {
    /// Only users with this role.
    pub role: Option<Role>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub registration_number: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub supervisor_id: Option<i32>,
    pub project_group_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            full_name: m.full_name,
            role: m.role,
            registration_number: m.registration_number,
            department: m.department,
            phone_number: m.phone_number,
            is_active: m.is_active,
            supervisor_id: m.supervisor_id,
            project_group_id: m.project_group_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignedCountResponse {
    /// Number of students updated.
    #[schema(example = 42)]
    pub updated: u64,
}
