//! Business operations. Each state change runs in one transaction; any
//! notifications go out after commit through [`crate::notify::Notifier`].

pub mod chat;
pub mod deadline;
pub mod document;
pub mod grade;
pub mod group;
pub mod inbox;
pub mod review;
pub mod user;

use sea_orm::sea_query::LockType;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QuerySelect};

use crate::entity::{deadline as deadline_entity, document as document_entity, grade as grade_entity};
use crate::entity::{project_group, user as user_entity};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

pub async fn find_user<C: ConnectionTrait>(conn: &C, id: i32) -> Result<user_entity::Model, AppError> {
    user_entity::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn find_document<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<document_entity::Model, AppError> {
    document_entity::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))
}

/// Loads a document with `FOR UPDATE`, serializing writers of the same row.
pub async fn lock_document<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<document_entity::Model, AppError> {
    document_entity::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))
}

pub async fn find_group<C: ConnectionTrait>(conn: &C, id: i32) -> Result<project_group::Model, AppError> {
    project_group::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Project group not found".into()))
}

pub async fn find_grade<C: ConnectionTrait>(conn: &C, id: i32) -> Result<grade_entity::Model, AppError> {
    grade_entity::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Grade not found".into()))
}

pub async fn find_deadline<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<deadline_entity::Model, AppError> {
    deadline_entity::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Deadline not found".into()))
}

/// The uploader, or any member of the group the document belongs to.
pub async fn is_document_owner<C: ConnectionTrait>(
    conn: &C,
    doc: &document_entity::Model,
    user_id: i32,
) -> Result<bool, DbErr> {
    if doc.student_id == user_id {
        return Ok(true);
    }
    let Some(group_id) = doc.project_group_id else {
        return Ok(false);
    };
    let member = user_entity::Entity::find_by_id(user_id).one(conn).await?;
    Ok(member.and_then(|u| u.project_group_id) == Some(group_id))
}

/// Staff may read any document; students only the ones they own.
pub async fn ensure_can_read_document<C: ConnectionTrait>(
    conn: &C,
    doc: &document_entity::Model,
    auth_user: &AuthUser,
) -> Result<(), AppError> {
    if auth_user.role.is_staff() || is_document_owner(conn, doc, auth_user.user_id).await? {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// Trimmed, non-empty text, or a validation error naming the field.
pub fn required_text(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trims optional text and maps blank input to `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
