use chrono::Utc;
use common::grading::{self, Aggregate, REQUIRED_CRITERIA, TranscriptTotals};
use common::{DocumentStatus, DocumentType, LetterGrade, NotificationKind, Role};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::document::type_label;
use super::{find_document, find_grade, find_user, lock_document, optional_text};
use crate::entity::{document, grade, user};
use crate::error::AppError;
use crate::notify::email::EmailSender;
use crate::notify::{Notice, Notifier, Related, recipients_for_document, users_with_role};
use crate::state::AppState;

pub struct NewGrade {
    pub document_id: i32,
    pub rubric_criteria: String,
    pub score: f64,
    pub max_score: f64,
    pub feedback: Option<String>,
}

#[derive(Default)]
pub struct GradePatch {
    pub rubric_criteria: Option<String>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub feedback: Option<String>,
}

/// Released results of one document.
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResult {
    pub document_id: i32,
    pub document_type: Option<DocumentType>,
    pub custom_type: Option<String>,
    pub document_title: String,
    pub total_score: f64,
    pub total_max_score: f64,
    pub percentage: f64,
    pub grade: LetterGrade,
    pub gpa: f64,
}

/// Detailed marks certificate of a student.
#[derive(Debug, Serialize, ToSchema)]
pub struct Transcript {
    pub student_id: i32,
    pub student_name: String,
    pub registration_number: Option<String>,
    pub department: Option<String>,
    pub document_grades: Vec<DocumentResult>,
    #[serde(flatten)]
    pub totals: TranscriptTotals,
}

pub struct GradeService<'a> {
    db: &'a DatabaseConnection,
    mailer: &'a dyn EmailSender,
}

impl<'a> GradeService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: &state.db,
            mailer: state.mailer.as_ref(),
        }
    }

    fn notifier(&self) -> Notifier<'a, DatabaseConnection> {
        Notifier::new(self.db, self.mailer)
    }

    /// Insert one rubric row. Once the document carries six rows it moves to
    /// EVALUATION_COMMITTEE_APPROVED, and an evaluator's grade tells the
    /// committee the document is ready for release. FINAL_APPROVED and
    /// REJECTED documents take no further grades.
    ///
    /// The count is taken under the document's row lock so concurrent
    /// graders see each other's rows.
    pub async fn record(&self, evaluator_id: i32, new: NewGrade) -> Result<grade::Model, AppError> {
        find_document(self.db, new.document_id).await?;
        let evaluator = find_user(self.db, evaluator_id).await?;
        if !evaluator.role.can_grade() {
            return Err(AppError::PermissionDenied);
        }
        grading::validate_score(&new.rubric_criteria, new.score, new.max_score)
            .map_err(AppError::Validation)?;

        let txn = self.db.begin().await?;
        let doc = lock_document(&txn, new.document_id).await?;
        if doc.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Document is already {} and cannot be graded",
                doc.status
            )));
        }

        let now = Utc::now();
        let saved = grade::ActiveModel {
            document_id: Set(doc.id),
            evaluator_id: Set(evaluator.id),
            rubric_criteria: Set(new.rubric_criteria.trim().to_string()),
            score: Set(new.score),
            max_score: Set(new.max_score),
            feedback: Set(optional_text(new.feedback)),
            is_released: Set(false),
            graded_at: Set(now),
            released_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let count = grade::Entity::find()
            .filter(grade::Column::DocumentId.eq(doc.id))
            .count(&txn)
            .await?;

        let complete = count >= REQUIRED_CRITERIA;
        let doc = if complete && doc.status != DocumentStatus::EvaluationCommitteeApproved {
            let from = doc.status;
            let mut active: document::ActiveModel = doc.into();
            active.status = Set(DocumentStatus::EvaluationCommitteeApproved);
            active.updated_at = Set(now);
            let updated = active.update(&txn).await?;
            info!(document_id = updated.id, %from, to = %updated.status, "Evaluation complete");
            updated
        } else {
            doc
        };

        txn.commit().await?;
        info!(
            grade_id = saved.id,
            document_id = doc.id,
            evaluator_id,
            criterion = %saved.rubric_criteria,
            count,
            "Grade recorded"
        );

        if complete && evaluator.role == Role::Evaluator {
            self.announce_fully_graded(&doc).await;
        }

        Ok(saved)
    }

    async fn announce_fully_graded(&self, doc: &document::Model) {
        let committee = match users_with_role(self.db, Role::FypCommittee).await {
            Ok(users) => users,
            Err(e) => {
                warn!(document_id = doc.id, error = %e, "Failed to load committee members");
                return;
            }
        };
        let student = user::Entity::find_by_id(doc.student_id)
            .one(self.db)
            .await
            .ok()
            .flatten()
            .map(|u| u.full_name)
            .unwrap_or_else(|| "A student".to_string());
        let label = type_label(doc);

        let notice = Notice::new(
            NotificationKind::GradeAssigned,
            "Document Graded",
            format!("{student}'s {label} has been fully graded and is ready for review"),
        )
        .related(Related::Document(doc.id))
        .email(
            "Document Graded - Track Sphere",
            format!(
                "A document has been fully graded by the evaluation committee.\n\n\
                 Student: {student}\nDocument: {label}\nTitle: {}\n\n\
                 All criteria have been evaluated. Please log in to Track Sphere \
                 to review and release the grades.",
                doc.title
            ),
        );
        self.notifier().fan_out(&committee, &notice).await;
    }

    pub async fn update(&self, grade_id: i32, patch: GradePatch) -> Result<grade::Model, AppError> {
        let existing = find_grade(self.db, grade_id).await?;
        if existing.is_released {
            return Err(AppError::Conflict("Cannot update a released grade".into()));
        }

        let criterion = patch
            .rubric_criteria
            .unwrap_or_else(|| existing.rubric_criteria.clone());
        let score = patch.score.unwrap_or(existing.score);
        let max_score = patch.max_score.unwrap_or(existing.max_score);
        grading::validate_score(&criterion, score, max_score).map_err(AppError::Validation)?;

        let mut active: grade::ActiveModel = existing.into();
        active.rubric_criteria = Set(criterion.trim().to_string());
        active.score = Set(score);
        active.max_score = Set(max_score);
        if patch.feedback.is_some() {
            active.feedback = Set(optional_text(patch.feedback));
        }
        let updated = active.update(self.db).await?;
        info!(grade_id, "Grade updated");
        Ok(updated)
    }

    pub async fn release(&self, grade_id: i32) -> Result<grade::Model, AppError> {
        let existing = find_grade(self.db, grade_id).await?;
        if existing.is_released {
            return Err(AppError::Conflict("Grade is already released".into()));
        }
        let doc = find_document(self.db, existing.document_id).await?;

        let mut active: grade::ActiveModel = existing.into();
        active.is_released = Set(true);
        active.released_at = Set(Some(Utc::now()));
        let released = active.update(self.db).await?;
        info!(grade_id, document_id = doc.id, "Grade released");

        let label = type_label(&doc);
        let notice = Notice::new(
            NotificationKind::GradeReleased,
            "Grade Released",
            format!("Your grade for {label} has been released"),
        )
        .related(Related::Grade(released.id))
        .email(
            "Grade Released - Track Sphere",
            format!(
                "Your grade for {label} has been released.\n\n\
                 Document: {}\nScore: {}/{}\n\n\
                 Please log in to Track Sphere to view your detailed grade.",
                doc.title, released.score, released.max_score
            ),
        );
        self.notify_owners(&doc, &notice).await;

        Ok(released)
    }

    /// Release every grade of a document and mark it FINAL_APPROVED.
    pub async fn release_all(&self, document_id: i32) -> Result<Aggregate, AppError> {
        let txn = self.db.begin().await?;
        let doc = lock_document(&txn, document_id).await?;
        let grades = grade::Entity::find()
            .filter(grade::Column::DocumentId.eq(document_id))
            .all(&txn)
            .await?;
        if grades.is_empty() {
            return Err(AppError::Conflict("No grades found for this document".into()));
        }

        let now = Utc::now();
        grade::Entity::update_many()
            .col_expr(grade::Column::IsReleased, Expr::value(true))
            .col_expr(grade::Column::ReleasedAt, Expr::value(now))
            .filter(grade::Column::DocumentId.eq(document_id))
            .filter(grade::Column::IsReleased.eq(false))
            .exec(&txn)
            .await?;

        let from = doc.status;
        let mut active: document::ActiveModel = doc.into();
        active.status = Set(DocumentStatus::FinalApproved);
        active.updated_at = Set(now);
        let doc = active.update(&txn).await?;
        txn.commit().await?;

        let aggregate = Aggregate::from_scores(grades.iter().map(|g| (g.score, g.max_score)));
        info!(
            document_id,
            %from,
            grades = grades.len(),
            percentage = aggregate.percentage,
            letter = %aggregate.letter,
            "All grades released"
        );

        let label = type_label(&doc);
        let notice = Notice::new(
            NotificationKind::GradeReleased,
            "Grades Released",
            format!(
                "Your grades for {label} have been released. Overall Grade: {}",
                aggregate.letter
            ),
        )
        .related(Related::Document(doc.id))
        .email(
            "Grades Released - Track Sphere",
            format!(
                "Your grades for {label} have been released.\n\n\
                 Document: {}\nTotal Marks: {:.2}/{:.2}\nPercentage: {:.2}%\n\
                 Grade: {}\nGPA: {:.2}\n\n\
                 Please log in to Track Sphere to view your detailed results.",
                doc.title,
                aggregate.total_score,
                aggregate.total_max_score,
                aggregate.percentage,
                aggregate.letter,
                aggregate.gpa
            ),
        );
        self.notify_owners(&doc, &notice).await;

        Ok(aggregate)
    }

    async fn notify_owners(&self, doc: &document::Model, notice: &Notice) {
        match recipients_for_document(self.db, doc).await {
            Ok(owners) => {
                self.notifier().fan_out(&owners, notice).await;
            }
            Err(e) => warn!(document_id = doc.id, error = %e, "Failed to resolve grade recipients"),
        }
    }

    pub async fn get(&self, grade_id: i32) -> Result<grade::Model, AppError> {
        find_grade(self.db, grade_id).await
    }

    pub async fn list_for_document(&self, document_id: i32) -> Result<Vec<grade::Model>, AppError> {
        Ok(grade::Entity::find()
            .filter(grade::Column::DocumentId.eq(document_id))
            .order_by_asc(grade::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn released_for_document(&self, document_id: i32) -> Result<Vec<grade::Model>, AppError> {
        Ok(released_grades(self.db, document_id).await?)
    }

    pub async fn list_by_evaluator(&self, evaluator_id: i32) -> Result<Vec<grade::Model>, AppError> {
        Ok(grade::Entity::find()
            .filter(grade::Column::EvaluatorId.eq(evaluator_id))
            .order_by_desc(grade::Column::GradedAt)
            .all(self.db)
            .await?)
    }

    /// Aggregate of the released grades only.
    pub async fn released_totals(&self, document_id: i32) -> Result<Aggregate, AppError> {
        find_document(self.db, document_id).await?;
        let released = released_grades(self.db, document_id).await?;
        Ok(Aggregate::from_scores(released.iter().map(|g| (g.score, g.max_score))))
    }

    /// True once the evaluator has six rows on the document. Repeated
    /// criteria count separately.
    pub async fn has_graded_all_criteria(
        &self,
        document_id: i32,
        evaluator_id: i32,
    ) -> Result<bool, AppError> {
        find_document(self.db, document_id).await?;
        find_user(self.db, evaluator_id).await?;
        let count = grade::Entity::find()
            .filter(grade::Column::DocumentId.eq(document_id))
            .filter(grade::Column::EvaluatorId.eq(evaluator_id))
            .count(self.db)
            .await?;
        Ok(count >= REQUIRED_CRITERIA)
    }

    /// Builds the student's marks certificate from released grades. Documents
    /// with nothing released are left out.
    pub async fn student_dmc(&self, student_id: i32) -> Result<Transcript, AppError> {
        let student = find_user(self.db, student_id).await?;
        if student.role != Role::Student {
            return Err(AppError::Validation("User is not a student".into()));
        }

        let select = match student.project_group_id {
            Some(group_id) => document::Entity::find().filter(document::Column::ProjectGroupId.eq(group_id)),
            None => document::Entity::find().filter(document::Column::StudentId.eq(student.id)),
        };
        let documents = select.order_by_asc(document::Column::Id).all(self.db).await?;

        let mut document_grades = Vec::new();
        let mut aggregates = Vec::new();
        for doc in documents {
            let released = released_grades(self.db, doc.id).await?;
            if released.is_empty() {
                continue;
            }
            let aggregate = Aggregate::from_scores(released.iter().map(|g| (g.score, g.max_score)));
            aggregates.push(aggregate);
            document_grades.push(DocumentResult {
                document_id: doc.id,
                document_type: doc.doc_type,
                custom_type: doc.custom_type,
                document_title: doc.title,
                total_score: aggregate.total_score,
                total_max_score: aggregate.total_max_score,
                percentage: aggregate.percentage,
                grade: aggregate.letter,
                gpa: aggregate.gpa,
            });
        }

        Ok(Transcript {
            student_id: student.id,
            student_name: student.full_name,
            registration_number: student.registration_number,
            department: student.department,
            document_grades,
            totals: TranscriptTotals::from_documents(&aggregates),
        })
    }
}

async fn released_grades<C: ConnectionTrait>(conn: &C, document_id: i32) -> Result<Vec<grade::Model>, DbErr> {
    grade::Entity::find()
        .filter(grade::Column::DocumentId.eq(document_id))
        .filter(grade::Column::IsReleased.eq(true))
        .order_by_asc(grade::Column::Id)
        .all(conn)
        .await
}
