use chrono::Utc;
use common::review::{self as transitions, FanOut, Transition};
use common::{NotificationKind, ReviewDecision, Role};
use sea_orm::*;
use tracing::{info, warn};

use super::document::type_label;
use super::{find_document, find_user, lock_document, required_text};
use crate::entity::{document, project_group, review, user};
use crate::error::AppError;
use crate::notify::email::EmailSender;
use crate::notify::{Notice, Notifier, Related, recipients_for_document, users_with_role};
use crate::state::AppState;

pub struct NewReview {
    pub document_id: i32,
    pub comments: String,
    pub decision: ReviewDecision,
    pub review_round: Option<i32>,
}

pub struct ReviewService<'a> {
    db: &'a DatabaseConnection,
    mailer: &'a dyn EmailSender,
}

impl<'a> ReviewService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: &state.db,
            mailer: state.mailer.as_ref(),
        }
    }

    /// Record a review and move the document along the transition table.
    ///
    /// The review row and the status change commit together; notifications
    /// follow the commit.
    pub async fn create(&self, reviewer_id: i32, new: NewReview) -> Result<review::Model, AppError> {
        find_document(self.db, new.document_id).await?;
        let reviewer = find_user(self.db, reviewer_id).await?;

        transitions::transition(reviewer.role, new.decision)?;
        let comments = required_text(&new.comments, "Comments")?;
        let round = new.review_round.unwrap_or(1);
        if round < 1 {
            return Err(AppError::Validation("Review round must be at least 1".into()));
        }

        let txn = self.db.begin().await?;
        let doc = lock_document(&txn, new.document_id).await?;
        let from = doc.status;
        let step = transitions::apply(doc.status, reviewer.role, new.decision)?;

        let now = Utc::now();
        let saved = review::ActiveModel {
            document_id: Set(doc.id),
            reviewer_id: Set(reviewer.id),
            reviewer_role: Set(reviewer.role),
            comments: Set(comments),
            decision: Set(new.decision),
            review_round: Set(round),
            reviewed_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut active: document::ActiveModel = doc.into();
        active.status = Set(step.status);
        if step.reopen {
            active.is_submitted = Set(false);
        }
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            document_id = updated.id,
            review_id = saved.id,
            reviewer_role = %reviewer.role,
            decision = %new.decision,
            %from,
            to = %updated.status,
            "Review recorded"
        );

        if let Err(e) = self.announce(&updated, &reviewer, new.decision, step).await {
            warn!(document_id = updated.id, error = %e, "Failed to resolve review recipients");
        }

        Ok(saved)
    }

    async fn announce(
        &self,
        doc: &document::Model,
        reviewer: &user::Model,
        decision: ReviewDecision,
        step: Transition,
    ) -> Result<(), DbErr> {
        let notifier = Notifier::new(self.db, self.mailer);
        let owner_name = self.owner_name(doc).await?;
        let label = type_label(doc);

        match step.fan_out {
            FanOut::Nobody => {}
            FanOut::Evaluators => {
                let evaluators = users_with_role(self.db, Role::Evaluator).await?;
                let notice = Notice::new(
                    NotificationKind::DocumentSubmitted,
                    "Document Ready for Evaluation",
                    format!("{owner_name}'s {label} has been approved by supervisor"),
                )
                .related(Related::Document(doc.id))
                .email(
                    "Document Ready for Evaluation - Track Sphere",
                    format!(
                        "A new document is ready for your evaluation.\n\n\
                         Student/Group: {owner_name}\nDocument: {label}\nTitle: {}\n\n\
                         Please log in to Track Sphere to review and evaluate the document.",
                        doc.title
                    ),
                );
                notifier.fan_out(&evaluators, &notice).await;
            }
            FanOut::Owners | FanOut::OwnersAndSupervisor => {
                let owners = recipients_for_document(self.db, doc).await?;
                let notice = owner_notice(doc, &label, reviewer.role, decision);
                notifier.fan_out(&owners, &notice).await;

                if step.fan_out == FanOut::OwnersAndSupervisor
                    && let Some(supervisor_id) = doc.supervisor_id
                    && let Some(supervisor) = user::Entity::find_by_id(supervisor_id).one(self.db).await?
                {
                    let notice = Notice::new(
                        NotificationKind::ReviewReceived,
                        "Revision Required by Evaluation Committee",
                        format!("Evaluation committee requested revisions for {owner_name}'s {label}"),
                    )
                    .related(Related::Document(doc.id))
                    .email(
                        "Revision Required - Track Sphere",
                        format!(
                            "The evaluation committee has requested revisions for your student's document.\n\n\
                             Student/Group: {owner_name}\nDocument: {}\n\n\
                             Please guide your student accordingly.",
                            doc.title
                        ),
                    );
                    notifier.deliver_logged(&supervisor, &notice).await;
                }
            }
        }
        Ok(())
    }

    /// Group name for group documents, otherwise the uploader's name.
    async fn owner_name(&self, doc: &document::Model) -> Result<String, DbErr> {
        if let Some(group_id) = doc.project_group_id
            && let Some(group) = project_group::Entity::find_by_id(group_id).one(self.db).await?
        {
            return Ok(group.name);
        }
        Ok(user::Entity::find_by_id(doc.student_id)
            .one(self.db)
            .await?
            .map(|u| u.full_name)
            .unwrap_or_else(|| "Student".to_string()))
    }

    /// Newest first.
    pub async fn list_for_document(&self, document_id: i32) -> Result<Vec<review::Model>, AppError> {
        Ok(review::Entity::find()
            .filter(review::Column::DocumentId.eq(document_id))
            .order_by_desc(review::Column::ReviewedAt)
            .order_by_desc(review::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn list_by_reviewer(&self, reviewer_id: i32) -> Result<Vec<review::Model>, AppError> {
        Ok(review::Entity::find()
            .filter(review::Column::ReviewerId.eq(reviewer_id))
            .order_by_desc(review::Column::ReviewedAt)
            .all(self.db)
            .await?)
    }

    pub async fn get(&self, review_id: i32) -> Result<review::Model, AppError> {
        review::Entity::find_by_id(review_id)
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".into()))
    }
}

fn owner_notice(doc: &document::Model, label: &str, role: Role, decision: ReviewDecision) -> Notice {
    let (kind, title, message, body) = match (role, decision) {
        (Role::Supervisor, ReviewDecision::RevisionRequested) => (
            NotificationKind::RevisionRequested,
            "Revision Required",
            format!("Your supervisor has requested revisions on {label}"),
            format!(
                "Your supervisor has reviewed your {label} and requested revisions.\n\n\
                 Document: {}\n\nPlease log in to Track Sphere to view the feedback and resubmit.",
                doc.title
            ),
        ),
        (Role::Evaluator, ReviewDecision::RevisionRequested) => (
            NotificationKind::RevisionRequested,
            "Revision Required by Evaluation Committee",
            format!(
                "The evaluation committee has requested revisions on {label}. \
                 Please review the feedback and resubmit."
            ),
            format!(
                "The evaluation committee has reviewed your {label} and requested revisions.\n\n\
                 Document: {}\n\nPlease log in to Track Sphere to view the feedback and resubmit.",
                doc.title
            ),
        ),
        (Role::FypCommittee, ReviewDecision::RevisionRequested) => (
            NotificationKind::RevisionRequested,
            "Revision Required by FYP Committee",
            format!("The FYP committee has requested revisions on {label}"),
            format!(
                "The FYP committee has reviewed your {label} and requested revisions.\n\n\
                 Document: {}\n\nPlease log in to Track Sphere to view the feedback and resubmit.",
                doc.title
            ),
        ),
        (reviewer, _) => {
            let by = match reviewer {
                Role::Evaluator => " by evaluation committee",
                Role::FypCommittee => " by FYP committee",
                _ => "",
            };
            (
                NotificationKind::ReviewReceived,
                "Document Rejected",
                format!("Your {label} has been rejected{by}"),
                format!(
                    "Your {label} has been rejected{by}.\n\n\
                     Please contact your supervisor for more information."
                ),
            )
        }
    };

    Notice::new(kind, title, message)
        .related(Related::Document(doc.id))
        .email(format!("{title} - Track Sphere"), body)
}
