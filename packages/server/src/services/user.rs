use chrono::Utc;
use common::Role;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::{debug, info};

use super::{find_user, optional_text, required_text};
use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;

pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub registration_number: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
}

pub struct UserService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { db: &state.db }
    }

    pub async fn create(&self, new: NewUser) -> Result<user::Model, AppError> {
        let email = required_text(&new.email, "Email")?.to_lowercase();
        if !email.contains('@') {
            return Err(AppError::Validation("Email address is invalid".into()));
        }
        let full_name = required_text(&new.full_name, "Full name")?;
        let registration_number = optional_text(new.registration_number);

        let email_taken = user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .count(self.db)
            .await?
            > 0;
        if email_taken {
            return Err(AppError::Conflict("Email already exists".into()));
        }
        if let Some(reg) = &registration_number {
            let reg_taken = user::Entity::find()
                .filter(user::Column::RegistrationNumber.eq(reg.as_str()))
                .count(self.db)
                .await?
                > 0;
            if reg_taken {
                return Err(AppError::Conflict("Registration number already exists".into()));
            }
        }

        let now = Utc::now();
        let created = user::ActiveModel {
            email: Set(email),
            full_name: Set(full_name),
            role: Set(new.role),
            registration_number: Set(registration_number),
            department: Set(optional_text(new.department)),
            phone_number: Set(optional_text(new.phone_number)),
            is_active: Set(true),
            supervisor_id: Set(None),
            project_group_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                debug!("User creation race: unique constraint caught on insert");
                AppError::Conflict("Email or registration number already exists".into())
            }
            _ => AppError::from(e),
        })?;

        info!(user_id = created.id, role = %created.role, "User created");
        Ok(created)
    }

    pub async fn get(&self, user_id: i32) -> Result<user::Model, AppError> {
        find_user(self.db, user_id).await
    }

    pub async fn list(&self, role: Option<Role>) -> Result<Vec<user::Model>, AppError> {
        let mut select = user::Entity::find();
        if let Some(role) = role {
            select = select.filter(user::Column::Role.eq(role));
        }
        Ok(select.order_by_asc(user::Column::Id).all(self.db).await?)
    }

    pub async fn update_profile(&self, user_id: i32, patch: ProfilePatch) -> Result<user::Model, AppError> {
        let existing = find_user(self.db, user_id).await?;
        let mut active: user::ActiveModel = existing.into();
        if let Some(name) = patch.full_name {
            active.full_name = Set(required_text(&name, "Full name")?);
        }
        if patch.department.is_some() {
            active.department = Set(optional_text(patch.department));
        }
        if patch.phone_number.is_some() {
            active.phone_number = Set(optional_text(patch.phone_number));
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    pub async fn deactivate(&self, user_id: i32) -> Result<user::Model, AppError> {
        let existing = find_user(self.db, user_id).await?;
        let mut active: user::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db).await?;
        info!(user_id, "User deactivated");
        Ok(updated)
    }

    pub async fn assign_supervisor_to_student(
        &self,
        student_id: i32,
        supervisor_id: i32,
    ) -> Result<user::Model, AppError> {
        let student = find_user(self.db, student_id).await?;
        if student.role != Role::Student {
            return Err(AppError::Validation("User is not a student".into()));
        }
        let supervisor = self.supervisor(supervisor_id).await?;

        let mut active: user::ActiveModel = student.into();
        active.supervisor_id = Set(Some(supervisor.id));
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db).await?;
        info!(student_id, supervisor_id, "Supervisor assigned to student");
        Ok(updated)
    }

    /// Returns how many students were updated.
    pub async fn assign_supervisor_to_all_students(&self, supervisor_id: i32) -> Result<u64, AppError> {
        let supervisor = self.supervisor(supervisor_id).await?;
        let result = user::Entity::update_many()
            .col_expr(user::Column::SupervisorId, Expr::value(supervisor.id))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Role.eq(Role::Student))
            .exec(self.db)
            .await?;
        info!(supervisor_id, students = result.rows_affected, "Supervisor assigned to all students");
        Ok(result.rows_affected)
    }

    pub async fn supervised_students(&self, supervisor_id: i32) -> Result<Vec<user::Model>, AppError> {
        self.supervisor(supervisor_id).await?;
        Ok(user::Entity::find()
            .filter(user::Column::SupervisorId.eq(supervisor_id))
            .filter(user::Column::Role.eq(Role::Student))
            .order_by_asc(user::Column::FullName)
            .all(self.db)
            .await?)
    }

    async fn supervisor(&self, supervisor_id: i32) -> Result<user::Model, AppError> {
        let supervisor = find_user(self.db, supervisor_id).await?;
        if supervisor.role != Role::Supervisor {
            return Err(AppError::Validation("User is not a supervisor".into()));
        }
        Ok(supervisor)
    }
}
