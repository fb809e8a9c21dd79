//! Notification dispatch: an in-app notification row plus one best-effort email.
//!
//! Every business operation notifies only after its own transaction has
//! committed, and treats a dispatch failure as a log line, never an error.

pub mod email;
mod recipients;

use chrono::Utc;
use common::NotificationKind;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

use crate::entity::{notification, user};
use email::{EmailError, EmailSender};

pub use recipients::{recipients_for_document, users_with_role};

const EMAIL_SIGN_OFF: &str = "Best regards,\nTrack Sphere Team";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to persist notification: {0}")]
    Persist(#[from] DbErr),
    #[error("failed to send email: {0}")]
    Email(#[from] EmailError),
}

/// Entity a notification points at, for deep links in the client.
#[derive(Debug, Clone, Copy)]
pub enum Related {
    Document(i32),
    Grade(i32),
    Deadline(i32),
}

impl Related {
    fn parts(self) -> (&'static str, i32) {
        match self {
            Self::Document(id) => ("DOCUMENT", id),
            Self::Grade(id) => ("GRADE", id),
            Self::Deadline(id) => ("DEADLINE", id),
        }
    }
}

/// What to tell a user.
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related: Option<Related>,
    /// Custom email `(subject, body)`; a generic rendering of the title and
    /// message is sent otherwise.
    pub email: Option<(String, String)>,
}

impl Notice {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            related: None,
            email: None,
        }
    }

    pub fn related(mut self, related: Related) -> Self {
        self.related = Some(related);
        self
    }

    pub fn email(mut self, subject: impl Into<String>, body: impl Into<String>) -> Self {
        self.email = Some((subject.into(), body.into()));
        self
    }

    /// Every email gets the same greeting and sign-off around its body.
    fn render_email(&self, recipient_name: &str) -> (String, String) {
        let (subject, body) = match &self.email {
            Some((subject, body)) => (subject.as_str(), body.as_str()),
            None => (self.title.as_str(), self.message.as_str()),
        };
        (
            subject.to_string(),
            format!("Dear {recipient_name},\n\n{body}\n\n{EMAIL_SIGN_OFF}"),
        )
    }
}

pub struct Notifier<'a, C: ConnectionTrait> {
    conn: &'a C,
    mailer: &'a dyn EmailSender,
}

impl<'a, C: ConnectionTrait> Notifier<'a, C> {
    pub fn new(conn: &'a C, mailer: &'a dyn EmailSender) -> Self {
        Self { conn, mailer }
    }

    /// Persist a notification for `recipient`, then email them.
    ///
    /// The email is attempted even when the row could not be written. The
    /// first failure is returned.
    pub async fn deliver(&self, recipient: &user::Model, notice: &Notice) -> Result<(), NotifyError> {
        let persisted = self.persist(recipient.id, notice).await;

        let (subject, body) = notice.render_email(&recipient.full_name);
        let emailed = self.mailer.send(&recipient.email, &subject, &body).await;

        persisted?;
        emailed?;
        Ok(())
    }

    /// Deliver to each recipient, logging failures. Returns how many
    /// notification rows were written.
    pub async fn fan_out(&self, recipients: &[user::Model], notice: &Notice) -> usize {
        let mut persisted = 0;
        for recipient in recipients {
            match self.deliver(recipient, notice).await {
                Ok(()) => persisted += 1,
                Err(e) => {
                    if matches!(e, NotifyError::Email(_)) {
                        persisted += 1;
                    }
                    tracing::warn!(
                        user_id = recipient.id,
                        kind = %notice.kind,
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        }
        persisted
    }

    /// Like [`Notifier::deliver`] but logs instead of returning the error.
    pub async fn deliver_logged(&self, recipient: &user::Model, notice: &Notice) {
        if let Err(e) = self.deliver(recipient, notice).await {
            tracing::warn!(
                user_id = recipient.id,
                kind = %notice.kind,
                error = %e,
                "Notification delivery failed"
            );
        }
    }

    async fn persist(&self, user_id: i32, notice: &Notice) -> Result<notification::Model, DbErr> {
        let (related_type, related_id) = match notice.related.map(Related::parts) {
            Some((kind, id)) => (Some(kind.to_string()), Some(id)),
            None => (None, None),
        };
        notification::ActiveModel {
            user_id: Set(user_id),
            title: Set(notice.title.clone()),
            message: Set(notice.message.clone()),
            kind: Set(notice.kind),
            is_read: Set(false),
            related_entity_type: Set(related_type),
            related_entity_id: Set(related_id),
            created_at: Set(Utc::now()),
            read_at: Set(None),
            ..Default::default()
        }
        .insert(self.conn)
        .await
    }
}
