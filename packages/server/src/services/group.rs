use chrono::Utc;
use common::Role;
use sea_orm::*;
use tracing::info;

use super::{find_group, find_user, optional_text, required_text};
use crate::entity::{project_group, user};
use crate::error::AppError;
use crate::state::AppState;

pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub supervisor_id: i32,
    pub student_ids: Vec<i32>,
}

/// A group with its current members.
pub struct GroupDetail {
    pub group: project_group::Model,
    pub members: Vec<user::Model>,
}

pub struct GroupService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> GroupService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { db: &state.db }
    }

    /// Create a group and enrol its students. Each member also takes the
    /// group supervisor as their default supervisor.
    pub async fn create(&self, new: NewGroup) -> Result<GroupDetail, AppError> {
        let name = required_text(&new.name, "Group name")?;

        let txn = self.db.begin().await?;

        let taken = project_group::Entity::find()
            .filter(project_group::Column::Name.eq(name.as_str()))
            .count(&txn)
            .await?
            > 0;
        if taken {
            return Err(AppError::Conflict(format!("Group name already exists: {name}")));
        }

        let supervisor = find_user(&txn, new.supervisor_id).await?;
        if supervisor.role != Role::Supervisor {
            return Err(AppError::Validation("User is not a supervisor".into()));
        }

        let now = Utc::now();
        let group = project_group::ActiveModel {
            name: Set(name),
            description: Set(optional_text(new.description)),
            supervisor_id: Set(Some(supervisor.id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut members = Vec::with_capacity(new.student_ids.len());
        for student_id in new.student_ids {
            members.push(enrol(&txn, &group, student_id).await?);
        }

        txn.commit().await?;
        info!(
            group_id = group.id,
            name = %group.name,
            supervisor_id = supervisor.id,
            members = members.len(),
            "Project group created"
        );
        Ok(GroupDetail { group, members })
    }

    pub async fn add_student(&self, group_id: i32, student_id: i32) -> Result<GroupDetail, AppError> {
        let txn = self.db.begin().await?;
        let group = find_group(&txn, group_id).await?;
        enrol(&txn, &group, student_id).await?;
        txn.commit().await?;

        info!(group_id, student_id, "Student added to group");
        self.get(group_id).await
    }

    pub async fn get(&self, group_id: i32) -> Result<GroupDetail, AppError> {
        let group = find_group(self.db, group_id).await?;
        let members = members_of(self.db, group.id).await?;
        Ok(GroupDetail { group, members })
    }

    pub async fn list(&self) -> Result<Vec<project_group::Model>, AppError> {
        Ok(project_group::Entity::find()
            .order_by_asc(project_group::Column::Name)
            .all(self.db)
            .await?)
    }

    pub async fn list_by_supervisor(&self, supervisor_id: i32) -> Result<Vec<project_group::Model>, AppError> {
        find_user(self.db, supervisor_id).await?;
        Ok(project_group::Entity::find()
            .filter(project_group::Column::SupervisorId.eq(supervisor_id))
            .order_by_asc(project_group::Column::Name)
            .all(self.db)
            .await?)
    }

    /// `None` when the student is not in a group.
    pub async fn group_of_student(&self, student_id: i32) -> Result<Option<GroupDetail>, AppError> {
        let student = find_user(self.db, student_id).await?;
        match student.project_group_id {
            Some(group_id) => Ok(Some(self.get(group_id).await?)),
            None => Ok(None),
        }
    }
}

async fn enrol<C: ConnectionTrait>(
    conn: &C,
    group: &project_group::Model,
    student_id: i32,
) -> Result<user::Model, AppError> {
    let student = user::Entity::find_by_id(student_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student not found: {student_id}")))?;
    if student.role != Role::Student {
        return Err(AppError::Validation(format!("User is not a student: {student_id}")));
    }
    if student.project_group_id.is_some() {
        return Err(AppError::Conflict(format!(
            "Student is already in a group: {}",
            student.full_name
        )));
    }

    let mut active: user::ActiveModel = student.into();
    active.project_group_id = Set(Some(group.id));
    active.supervisor_id = Set(group.supervisor_id);
    active.updated_at = Set(Utc::now());
    Ok(active.update(conn).await?)
}

pub async fn members_of<C: ConnectionTrait>(conn: &C, group_id: i32) -> Result<Vec<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::ProjectGroupId.eq(group_id))
        .order_by_asc(user::Column::FullName)
        .all(conn)
        .await
}
