use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::chat_message;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SendMessageRequest {
    #[schema(example = "Uploaded the revised proposal, please take a look.")]
    pub content: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ChatMessageResponse {
    pub id: i32,
    pub project_group_id: i32,
    pub sender_id: i32,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl From<chat_message::Model> for ChatMessageResponse {
    fn from(m: chat_message::Model) -> Self {
        Self {
            id: m.id,
            project_group_id: m.project_group_id,
            sender_id: m.sender_id,
            content: m.content,
            sent_at: m.sent_at,
        }
    }
}
