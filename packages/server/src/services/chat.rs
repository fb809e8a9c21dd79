use chrono::Utc;
use common::Role;
use sea_orm::*;
use tracing::debug;

use super::{find_group, find_user, required_text};
use crate::entity::{chat_message, project_group, user};
use crate::error::AppError;
use crate::state::AppState;

pub struct ChatService<'a> {
    db: &'a DatabaseConnection,
}

/// Members and the group's supervisor may talk in a group.
fn is_participant(group: &project_group::Model, user: &user::Model) -> bool {
    user.project_group_id == Some(group.id) || group.supervisor_id == Some(user.id)
}

impl<'a> ChatService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { db: &state.db }
    }

    pub async fn send(
        &self,
        group_id: i32,
        sender_id: i32,
        content: &str,
    ) -> Result<chat_message::Model, AppError> {
        let group = find_group(self.db, group_id).await?;
        let sender = find_user(self.db, sender_id).await?;
        if !is_participant(&group, &sender) {
            return Err(AppError::PermissionDenied);
        }
        let content = required_text(content, "Message")?;

        let saved = chat_message::ActiveModel {
            project_group_id: Set(group.id),
            sender_id: Set(sender.id),
            content: Set(content),
            sent_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db)
        .await?;

        debug!(group_id, sender_id, message_id = saved.id, "Chat message sent");
        Ok(saved)
    }

    /// Oldest first. The committee may read any group.
    pub async fn messages(&self, group_id: i32, reader_id: i32) -> Result<Vec<chat_message::Model>, AppError> {
        let group = find_group(self.db, group_id).await?;
        let reader = find_user(self.db, reader_id).await?;
        if reader.role != Role::FypCommittee && !is_participant(&group, &reader) {
            return Err(AppError::PermissionDenied);
        }

        Ok(chat_message::Entity::find()
            .filter(chat_message::Column::ProjectGroupId.eq(group.id))
            .order_by_asc(chat_message::Column::SentAt)
            .order_by_asc(chat_message::Column::Id)
            .all(self.db)
            .await?)
    }
}
