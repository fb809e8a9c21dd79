use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::entity::notification;
use crate::error::AppError;
use crate::state::AppState;

/// A user's in-app notifications.
pub struct InboxService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> InboxService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { db: &state.db }
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<notification::Model>, AppError> {
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn unread(&self, user_id: i32) -> Result<Vec<notification::Model>, AppError> {
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn unread_count(&self, user_id: i32) -> Result<u64, AppError> {
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db)
            .await?)
    }

    pub async fn mark_read(&self, notification_id: i32, user_id: i32) -> Result<notification::Model, AppError> {
        let found = self.owned(notification_id, user_id).await?;
        if found.is_read {
            return Ok(found);
        }
        let mut active: notification::ActiveModel = found.into();
        active.is_read = Set(true);
        active.read_at = Set(Some(Utc::now()));
        Ok(active.update(self.db).await?)
    }

    /// Returns how many notifications changed.
    pub async fn mark_all_read(&self, user_id: i32) -> Result<u64, AppError> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .col_expr(notification::Column::ReadAt, Expr::value(Utc::now()))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete(&self, notification_id: i32, user_id: i32) -> Result<(), AppError> {
        let found = self.owned(notification_id, user_id).await?;
        notification::Entity::delete_by_id(found.id).exec(self.db).await?;
        Ok(())
    }

    async fn owned(&self, notification_id: i32, user_id: i32) -> Result<notification::Model, AppError> {
        let found = notification::Entity::find_by_id(notification_id)
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".into()))?;
        if found.user_id != user_id {
            return Err(AppError::PermissionDenied);
        }
        Ok(found)
    }
}
