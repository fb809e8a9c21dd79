use chrono::{DateTime, Duration, Utc};
use common::storage::FileStore;
use common::{DocumentType, NotificationKind, Role};
use sea_orm::*;
use tracing::{info, warn};

use super::document::purge_document;
use super::{find_deadline, find_user, optional_text, required_text};
use crate::entity::{deadline, document, user};
use crate::error::AppError;
use crate::notify::email::EmailSender;
use crate::notify::{Notice, Notifier, Related, users_with_role};
use crate::state::AppState;

pub struct DeadlineInput {
    pub deadline_type: String,
    pub document_type: Option<DocumentType>,
    pub deadline: DateTime<Utc>,
    pub description: Option<String>,
}

pub struct DeadlineService<'a> {
    db: &'a DatabaseConnection,
    files: &'a dyn FileStore,
    mailer: &'a dyn EmailSender,
}

impl<'a> DeadlineService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: &state.db,
            files: state.files.as_ref(),
            mailer: state.mailer.as_ref(),
        }
    }

    fn notifier(&self) -> Notifier<'a, DatabaseConnection> {
        Notifier::new(self.db, self.mailer)
    }

    /// Upsert keyed by `deadline_type`, then tell every student.
    pub async fn create_or_update(
        &self,
        acting_user_id: i32,
        input: DeadlineInput,
    ) -> Result<deadline::Model, AppError> {
        let actor = find_user(self.db, acting_user_id).await?;
        if actor.role != Role::FypCommittee {
            return Err(AppError::PermissionDenied);
        }
        let deadline_type = required_text(&input.deadline_type, "Deadline type")?;
        let description = optional_text(input.description);

        let existing = deadline::Entity::find()
            .filter(deadline::Column::DeadlineType.eq(deadline_type.as_str()))
            .one(self.db)
            .await?;
        let is_new = existing.is_none();

        let now = Utc::now();
        let saved = match existing {
            Some(found) => {
                let mut active: deadline::ActiveModel = found.into();
                active.document_type = Set(input.document_type);
                active.deadline = Set(input.deadline);
                active.description = Set(description.clone());
                active.set_by_id = Set(Some(actor.id));
                active.updated_at = Set(now);
                active.update(self.db).await?
            }
            None => {
                deadline::ActiveModel {
                    deadline_type: Set(deadline_type.clone()),
                    document_type: Set(input.document_type),
                    deadline: Set(input.deadline),
                    description: Set(description.clone()),
                    is_active: Set(true),
                    set_by_id: Set(Some(actor.id)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(self.db)
                .await?
            }
        };

        info!(
            deadline_id = saved.id,
            deadline_type = %saved.deadline_type,
            deadline = %saved.deadline,
            is_new,
            "Deadline saved"
        );

        let (verb, action) = if is_new { ("Added", "added") } else { ("Updated", "updated") };
        let notice = Notice::new(
            NotificationKind::DeadlineAdded,
            format!("Deadline {verb}"),
            format!("A deadline has been {action} for {deadline_type}"),
        )
        .related(Related::Deadline(saved.id))
        .email(
            format!("Deadline {verb} - Track Sphere"),
            format!(
                "A deadline has been {action} for your Final Year Project.\n\n\
                 Deadline Type: {deadline_type}\nDeadline: {}\nDescription: {}\n\n\
                 Please log in to Track Sphere for more details.",
                saved.deadline.format("%Y-%m-%d %H:%M UTC"),
                description.as_deref().unwrap_or("No description"),
            ),
        );
        self.notify_students(&notice).await;

        Ok(saved)
    }

    /// Delete a deadline. When it is tied to a document type every document
    /// of that type goes with it; a document that fails to delete is logged
    /// and skipped.
    pub async fn delete(&self, deadline_id: i32) -> Result<(), AppError> {
        let target = find_deadline(self.db, deadline_id).await?;

        let mut removed = 0usize;
        if let Some(doc_type) = target.document_type {
            let documents = document::Entity::find()
                .filter(document::Column::DocType.eq(doc_type))
                .all(self.db)
                .await?;
            for doc in &documents {
                match purge_document(self.db, self.files, doc).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(document_id = doc.id, error = ?e, "Failed to delete document"),
                }
            }
        }

        let cascade = target.document_type.is_some();
        let notice = Notice::new(
            NotificationKind::SystemAnnouncement,
            "Deadline Deleted",
            format!(
                "The deadline for {} has been deleted{}",
                target.deadline_type,
                if cascade { ". All related documents have been removed." } else { "." }
            ),
        )
        .email(
            "Deadline Deleted - Track Sphere",
            format!(
                "The deadline for {} has been deleted.\n\n{}\
                 Please contact your supervisor or FYP Committee for more information.",
                target.deadline_type,
                if cascade {
                    "All documents uploaded for this deadline type have been removed from the system.\n\n"
                } else {
                    ""
                }
            ),
        );
        self.notify_students(&notice).await;

        deadline::Entity::delete_by_id(target.id).exec(self.db).await?;
        info!(
            deadline_id,
            deadline_type = %target.deadline_type,
            documents_removed = removed,
            "Deadline deleted"
        );
        Ok(())
    }

    pub async fn deactivate(&self, deadline_id: i32) -> Result<deadline::Model, AppError> {
        let target = find_deadline(self.db, deadline_id).await?;
        let mut active: deadline::ActiveModel = target.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db).await?;
        info!(deadline_id, "Deadline deactivated");
        Ok(updated)
    }

    pub async fn get(&self, deadline_id: i32) -> Result<deadline::Model, AppError> {
        find_deadline(self.db, deadline_id).await
    }

    pub async fn list_all(&self) -> Result<Vec<deadline::Model>, AppError> {
        Ok(deadline::Entity::find()
            .order_by_asc(deadline::Column::Deadline)
            .all(self.db)
            .await?)
    }

    /// Active deadlines, including ones already past.
    pub async fn list_active(&self) -> Result<Vec<deadline::Model>, AppError> {
        Ok(active_deadlines(self.db).await?)
    }

    pub async fn by_deadline_type(&self, deadline_type: &str) -> Result<deadline::Model, AppError> {
        deadline::Entity::find()
            .filter(deadline::Column::DeadlineType.eq(deadline_type))
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Deadline not found for deadline type: {deadline_type}")))
    }

    pub async fn by_document_type(&self, doc_type: DocumentType) -> Result<deadline::Model, AppError> {
        deadline::Entity::find()
            .filter(deadline::Column::DocumentType.eq(doc_type))
            .order_by_desc(deadline::Column::UpdatedAt)
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Deadline not found for document type: {doc_type}")))
    }

    /// Remind every student who has nothing uploaded for a deadline falling
    /// inside `(now, now + window_days)`. Returns the number of reminders
    /// whose notification row was written.
    pub async fn notify_approaching(&self, now: DateTime<Utc>, window_days: i64) -> Result<usize, AppError> {
        let horizon = now + Duration::days(window_days);
        let approaching: Vec<deadline::Model> = active_deadlines(self.db)
            .await?
            .into_iter()
            .filter(|d| d.deadline > now && d.deadline < horizon)
            .collect();
        if approaching.is_empty() {
            return Ok(0);
        }

        let students = users_with_role(self.db, Role::Student).await?;
        let documents = document::Entity::find().all(self.db).await?;
        let notifier = self.notifier();

        let mut sent = 0;
        for due in &approaching {
            let label = match due.document_type {
                Some(t) => t.label().to_string(),
                None => due.deadline_type.clone(),
            };
            let remaining = (due.deadline - now).num_days();
            let notice = Notice::new(
                NotificationKind::DeadlineApproaching,
                "Deadline Approaching",
                format!("Only {window_days} days left for {label} submission"),
            )
            .related(Related::Deadline(due.id))
            .email(
                "Deadline Approaching - Track Sphere",
                format!(
                    "This is a reminder that a deadline is approaching.\n\n\
                     Document Type: {label}\nDeadline: {}\nDays Remaining: {remaining}\n\n\
                     Please make sure to submit your document on time.",
                    due.deadline.format("%Y-%m-%d %H:%M UTC"),
                ),
            );

            let pending: Vec<user::Model> = students
                .iter()
                .filter(|s| !documents.iter().any(|d| owns(s, d) && covers(due, d)))
                .cloned()
                .collect();
            sent += notifier.fan_out(&pending, &notice).await;
        }

        info!(deadlines = approaching.len(), reminders = sent, "Approaching deadline reminders sent");
        Ok(sent)
    }

    async fn notify_students(&self, notice: &Notice) {
        match users_with_role(self.db, Role::Student).await {
            Ok(students) => {
                self.notifier().fan_out(&students, notice).await;
            }
            Err(e) => warn!(error = %e, "Failed to load students for deadline notice"),
        }
    }
}

async fn active_deadlines<C: ConnectionTrait>(conn: &C) -> Result<Vec<deadline::Model>, DbErr> {
    deadline::Entity::find()
        .filter(deadline::Column::IsActive.eq(true))
        .order_by_asc(deadline::Column::Deadline)
        .all(conn)
        .await
}

/// Whether the document counts as the student's: the group's documents for
/// grouped students, their own uploads otherwise.
fn owns(student: &user::Model, doc: &document::Model) -> bool {
    match student.project_group_id {
        Some(group_id) => doc.project_group_id == Some(group_id),
        None => doc.student_id == student.id,
    }
}

/// Whether the document answers the deadline: same built-in type, or a
/// custom type named like the deadline.
fn covers(due: &deadline::Model, doc: &document::Model) -> bool {
    match due.document_type {
        Some(t) => doc.doc_type == Some(t),
        None => doc.custom_type.as_deref() == Some(due.deadline_type.as_str()),
    }
}
