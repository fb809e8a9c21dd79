use common::Role;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::{document, user};

/// The users who own a document: its group's members when it was uploaded
/// by a grouped student, otherwise the uploader alone.
pub async fn recipients_for_document<C: ConnectionTrait>(
    conn: &C,
    doc: &document::Model,
) -> Result<Vec<user::Model>, DbErr> {
    if let Some(group_id) = doc.project_group_id {
        let members = user::Entity::find()
            .filter(user::Column::ProjectGroupId.eq(group_id))
            .order_by_asc(user::Column::Id)
            .all(conn)
            .await?;
        if !members.is_empty() {
            return Ok(members);
        }
    }

    Ok(user::Entity::find_by_id(doc.student_id)
        .one(conn)
        .await?
        .into_iter()
        .collect())
}

pub async fn users_with_role<C: ConnectionTrait>(conn: &C, role: Role) -> Result<Vec<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Role.eq(role))
        .order_by_asc(user::Column::Id)
        .all(conn)
        .await
}
