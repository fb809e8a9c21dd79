use chrono::Utc;
use common::storage::FileStore;
use common::{DocumentStatus, DocumentType, NotificationKind, Role};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::*;
use tracing::{info, warn};

use super::{
    ensure_can_read_document, find_document, find_group, find_user, is_document_owner,
    lock_document, optional_text,
};
use crate::entity::{deadline, document, document_version, grade, project_group, review, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::notify::email::EmailSender;
use crate::notify::{Notice, Notifier, Related};
use crate::state::AppState;
use crate::utils::filename::validate_upload_filename;

/// A file received from a client.
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct NewDocument {
    pub doc_type: Option<DocumentType>,
    pub custom_type: Option<String>,
    pub title: String,
    pub description: Option<String>,
}

/// What kind of deliverable a document is: built-in or free-form.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DocKind {
    Builtin(DocumentType),
    Custom(String),
}

impl DocKind {
    fn from_input(doc_type: Option<DocumentType>, custom_type: Option<String>) -> Result<Self, AppError> {
        match (doc_type, optional_text(custom_type)) {
            (Some(t), None) => Ok(Self::Builtin(t)),
            (None, Some(c)) => Ok(Self::Custom(c)),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "Specify either a document type or a custom type, not both".into(),
            )),
            (None, None) => Err(AppError::Validation(
                "A document type or custom type is required".into(),
            )),
        }
    }

    fn label(&self) -> &str {
        match self {
            Self::Builtin(t) => t.label(),
            Self::Custom(c) => c,
        }
    }
}

/// Display name of a document's type for notification text.
pub fn type_label(doc: &document::Model) -> String {
    match (&doc.doc_type, &doc.custom_type) {
        (Some(t), _) => t.label().to_string(),
        (None, Some(c)) => c.clone(),
        (None, None) => "Document".to_string(),
    }
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation("Title must be 1-256 characters".into()));
    }
    Ok(title.to_string())
}

/// Storage directory for an owner's files.
fn owner_dir(student: &user::Model) -> String {
    match student.project_group_id {
        Some(group_id) => format!("groups/{group_id}"),
        None => format!("documents/{}", student.id),
    }
}

pub struct DocumentService<'a> {
    db: &'a DatabaseConnection,
    files: &'a dyn FileStore,
    mailer: &'a dyn EmailSender,
}

impl<'a> DocumentService<'a> {
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

    /// Create a document at version 1 in DRAFT, with its first version row.
    pub async fn create(
        &self,
        student_id: i32,
        new: NewDocument,
        upload: Upload,
    ) -> Result<document::Model, AppError> {
        let student = find_user(self.db, student_id).await?;
        if student.role != Role::Student {
            return Err(AppError::PermissionDenied);
        }
        let kind = DocKind::from_input(new.doc_type, new.custom_type)?;
        let title = validate_title(&new.title)?;
        let file_name = validate_upload_filename(&upload.file_name)
            .map_err(|e| AppError::Validation(e.message().into()))?
            .to_string();

        let txn = self.db.begin().await?;

        if owner_has_document(&txn, &student, &kind).await? {
            return Err(AppError::Conflict(match student.project_group_id {
                Some(_) => format!("A {} already exists for your group", kind.label()),
                None => format!("A {} already exists for this student", kind.label()),
            }));
        }

        let deadline = deadline_for(&txn, &kind).await?;
        let supervisor_id = match student.project_group_id {
            Some(group_id) => find_group(&txn, group_id).await?.supervisor_id,
            None => student.supervisor_id,
        };

        let key = self
            .files
            .store(&owner_dir(&student), &file_name, &upload.bytes)
            .await?;

        let now = Utc::now();
        let model = document::ActiveModel {
            student_id: Set(student.id),
            project_group_id: Set(student.project_group_id),
            supervisor_id: Set(supervisor_id),
            doc_type: Set(match &kind {
                DocKind::Builtin(t) => Some(*t),
                DocKind::Custom(_) => None,
            }),
            custom_type: Set(match &kind {
                DocKind::Builtin(_) => None,
                DocKind::Custom(c) => Some(c.clone()),
            }),
            title: Set(title),
            description: Set(optional_text(new.description)),
            file_name: Set(file_name),
            file_path: Set(key.clone()),
            file_size: Set(upload.bytes.len() as i64),
            version: Set(1),
            status: Set(DocumentStatus::Draft),
            is_submitted: Set(false),
            is_locked: Set(false),
            is_late_submission: Set(false),
            submitted_at: Set(None),
            deadline: Set(deadline),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = insert_with_version(txn, model, "Initial version".into()).await;
        if result.is_err() {
            self.discard_file(&key).await;
        }
        let doc = result?;

        info!(
            document_id = doc.id,
            student_id = doc.student_id,
            kind = kind.label(),
            "Document created"
        );
        Ok(doc)
    }

    /// Replace the document's file, bumping the version. A document waiting
    /// on a revision goes back to DRAFT so it can be submitted again.
    pub async fn upload_new_version(
        &self,
        document_id: i32,
        actor: &AuthUser,
        upload: Upload,
        change_description: Option<String>,
    ) -> Result<document::Model, AppError> {
        let doc = find_document(self.db, document_id).await?;
        if !is_document_owner(self.db, &doc, actor.user_id).await? {
            return Err(AppError::PermissionDenied);
        }
        if doc.is_locked {
            return Err(AppError::Conflict(
                "Document is locked and cannot be updated".into(),
            ));
        }
        let file_name = validate_upload_filename(&upload.file_name)
            .map_err(|e| AppError::Validation(e.message().into()))?
            .to_string();

        let uploader = find_user(self.db, doc.student_id).await?;
        let key = self
            .files
            .store(&owner_dir(&uploader), &file_name, &upload.bytes)
            .await?;

        let result = self
            .apply_new_version(document_id, key.clone(), file_name, upload.bytes.len() as i64, change_description)
            .await;
        if result.is_err() {
            self.discard_file(&key).await;
        }
        let updated = result?;

        info!(
            document_id,
            version = updated.version,
            status = %updated.status,
            "New document version uploaded"
        );
        Ok(updated)
    }

    async fn apply_new_version(
        &self,
        document_id: i32,
        key: String,
        file_name: String,
        file_size: i64,
        change_description: Option<String>,
    ) -> Result<document::Model, AppError> {
        let txn = self.db.begin().await?;
        let doc = lock_document(&txn, document_id).await?;
        if doc.is_locked {
            return Err(AppError::Conflict(
                "Document is locked and cannot be updated".into(),
            ));
        }

        let reopen = doc.status.is_revision_requested();
        let mut active: document::ActiveModel = doc.clone().into();
        active.file_name = Set(file_name);
        active.file_path = Set(key);
        active.file_size = Set(file_size);
        active.version = Set(doc.version + 1);
        if reopen {
            active.status = Set(DocumentStatus::Draft);
            active.is_submitted = Set(false);
        }
        active.updated_at = Set(Utc::now());

        let description = optional_text(change_description)
            .unwrap_or_else(|| format!("Version {}", doc.version + 1));
        insert_with_version(txn, active, description).await
    }

    /// Submit a document for review.
    pub async fn submit(&self, document_id: i32, actor: &AuthUser) -> Result<document::Model, AppError> {
        let txn = self.db.begin().await?;
        let doc = lock_document(&txn, document_id).await?;

        if !is_document_owner(&txn, &doc, actor.user_id).await? {
            return Err(AppError::PermissionDenied);
        }
        if doc.is_submitted {
            return Err(AppError::Conflict("Document is already submitted".into()));
        }

        let now = Utc::now();
        if let Some(deadline) = doc.deadline
            && now > deadline
        {
            info!(document_id, %deadline, "Submission refused after deadline");
            return Err(AppError::DeadlinePassed);
        }

        let uploader = find_user(&txn, doc.student_id).await?;
        let supervisor_id = doc.supervisor_id.or(uploader.supervisor_id);

        let mut active: document::ActiveModel = doc.clone().into();
        active.is_submitted = Set(true);
        active.submitted_at = Set(Some(now));
        active.is_late_submission = Set(false);
        active.status = Set(DocumentStatus::Submitted);
        active.supervisor_id = Set(supervisor_id);
        active.updated_at = Set(now);
        let submitted = active.update(&txn).await?;

        document_version::Entity::update_many()
            .col_expr(document_version::Column::WasSubmitted, Expr::value(true))
            .filter(document_version::Column::DocumentId.eq(document_id))
            .filter(document_version::Column::VersionNumber.eq(submitted.version))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        info!(document_id, ?supervisor_id, "Document submitted");

        if let Some(supervisor_id) = supervisor_id {
            match user::Entity::find_by_id(supervisor_id).one(self.db).await {
                Ok(Some(supervisor)) => {
                    let notice = submission_notice(&submitted, &uploader);
                    self.notifier().deliver_logged(&supervisor, &notice).await;
                }
                Ok(None) => warn!(supervisor_id, "Assigned supervisor no longer exists"),
                Err(e) => warn!(error = %e, "Failed to load supervisor for notification"),
            }
        }

        Ok(submitted)
    }

    pub async fn assign_supervisor(
        &self,
        document_id: i32,
        supervisor_id: i32,
    ) -> Result<document::Model, AppError> {
        let supervisor = find_user(self.db, supervisor_id).await?;
        if supervisor.role != Role::Supervisor {
            return Err(AppError::Validation("User is not a supervisor".into()));
        }

        let doc = find_document(self.db, document_id).await?;
        let mut active: document::ActiveModel = doc.into();
        active.supervisor_id = Set(Some(supervisor.id));
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    /// Manual override of the status field by a supervisor or the committee.
    pub async fn update_status(
        &self,
        document_id: i32,
        status: DocumentStatus,
    ) -> Result<document::Model, AppError> {
        let txn = self.db.begin().await?;
        let doc = lock_document(&txn, document_id).await?;
        if doc.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Document is already {} and its status cannot change",
                doc.status
            )));
        }
        let from = doc.status;
        let mut active: document::ActiveModel = doc.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(document_id, %from, to = %status, "Document status overridden");
        Ok(updated)
    }

    /// Owners may delete a document until it is submitted; the committee at any time.
    pub async fn delete(&self, document_id: i32, actor: &AuthUser) -> Result<(), AppError> {
        let doc = find_document(self.db, document_id).await?;
        let allowed = match actor.role {
            Role::FypCommittee => true,
            Role::Student => {
                if !is_document_owner(self.db, &doc, actor.user_id).await? {
                    false
                } else if doc.is_submitted {
                    return Err(AppError::Conflict(
                        "Submitted documents cannot be deleted".into(),
                    ));
                } else {
                    true
                }
            }
            _ => false,
        };
        if !allowed {
            return Err(AppError::PermissionDenied);
        }

        purge_document(self.db, self.files, &doc).await?;
        info!(document_id, "Document deleted");
        Ok(())
    }

    pub async fn get(&self, document_id: i32, actor: &AuthUser) -> Result<document::Model, AppError> {
        let doc = find_document(self.db, document_id).await?;
        ensure_can_read_document(self.db, &doc, actor).await?;
        Ok(doc)
    }

    /// The student's group documents when grouped, otherwise their own.
    pub async fn list_for_student(&self, student_id: i32) -> Result<Vec<document::Model>, AppError> {
        let student = find_user(self.db, student_id).await?;
        let select = match student.project_group_id {
            Some(group_id) => {
                document::Entity::find().filter(document::Column::ProjectGroupId.eq(group_id))
            }
            None => document::Entity::find().filter(document::Column::StudentId.eq(student.id)),
        };
        Ok(select
            .order_by_desc(document::Column::CreatedAt)
            .all(self.db)
            .await?)
    }

    /// Documents assigned to the supervisor, plus every document of the
    /// students and groups they supervise.
    pub async fn list_for_supervisor(
        &self,
        supervisor_id: i32,
    ) -> Result<Vec<document::Model>, AppError> {
        find_user(self.db, supervisor_id).await?;

        let supervised_students = Query::select()
            .column(user::Column::Id)
            .from(user::Entity)
            .and_where(user::Column::SupervisorId.eq(supervisor_id))
            .to_owned();
        let supervised_groups = Query::select()
            .column(project_group::Column::Id)
            .from(project_group::Entity)
            .and_where(project_group::Column::SupervisorId.eq(supervisor_id))
            .to_owned();

        Ok(document::Entity::find()
            .filter(
                Condition::any()
                    .add(document::Column::SupervisorId.eq(supervisor_id))
                    .add(document::Column::StudentId.in_subquery(supervised_students))
                    .add(document::Column::ProjectGroupId.in_subquery(supervised_groups)),
            )
            .order_by_desc(document::Column::CreatedAt)
            .all(self.db)
            .await?)
    }

    pub async fn list_submitted(&self) -> Result<Vec<document::Model>, AppError> {
        Ok(document::Entity::find()
            .filter(document::Column::IsSubmitted.eq(true))
            .order_by_desc(document::Column::SubmittedAt)
            .all(self.db)
            .await?)
    }

    pub async fn list_by_status(
        &self,
        status: DocumentStatus,
    ) -> Result<Vec<document::Model>, AppError> {
        Ok(document::Entity::find()
            .filter(document::Column::Status.eq(status))
            .order_by_desc(document::Column::UpdatedAt)
            .all(self.db)
            .await?)
    }

    pub async fn list_all(&self) -> Result<Vec<document::Model>, AppError> {
        Ok(document::Entity::find()
            .order_by_desc(document::Column::CreatedAt)
            .all(self.db)
            .await?)
    }

    /// Version history, newest first.
    pub async fn versions(
        &self,
        document_id: i32,
        actor: &AuthUser,
    ) -> Result<Vec<document_version::Model>, AppError> {
        self.get(document_id, actor).await?;
        Ok(document_version::Entity::find()
            .filter(document_version::Column::DocumentId.eq(document_id))
            .order_by_desc(document_version::Column::VersionNumber)
            .all(self.db)
            .await?)
    }

    /// The current file as `(file name, bytes)`.
    pub async fn download(
        &self,
        document_id: i32,
        actor: &AuthUser,
    ) -> Result<(String, Vec<u8>), AppError> {
        let doc = self.get(document_id, actor).await?;
        let bytes = self.files.load(&doc.file_path).await?;
        Ok((doc.file_name, bytes))
    }

    async fn discard_file(&self, key: &str) {
        if let Err(e) = self.files.delete(key).await {
            warn!(key, error = %e, "Failed to remove orphaned upload");
        }
    }
}

/// Saves the document (insert or update) and appends a version row for its
/// current file, then commits.
async fn insert_with_version(
    txn: DatabaseTransaction,
    model: document::ActiveModel,
    change_description: String,
) -> Result<document::Model, AppError> {
    let doc = model.save(&txn).await?.try_into_model()?;

    document_version::ActiveModel {
        document_id: Set(doc.id),
        version_number: Set(doc.version),
        file_name: Set(doc.file_name.clone()),
        file_path: Set(doc.file_path.clone()),
        file_size: Set(doc.file_size),
        change_description: Set(Some(change_description)),
        was_submitted: Set(false),
        uploaded_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(doc)
}

async fn owner_has_document<C: ConnectionTrait>(
    conn: &C,
    student: &user::Model,
    kind: &DocKind,
) -> Result<bool, DbErr> {
    let select = match student.project_group_id {
        Some(group_id) => {
            document::Entity::find().filter(document::Column::ProjectGroupId.eq(group_id))
        }
        None => document::Entity::find().filter(document::Column::StudentId.eq(student.id)),
    };
    let select = match kind {
        DocKind::Builtin(t) => select.filter(document::Column::DocType.eq(*t)),
        DocKind::Custom(c) => select.filter(document::Column::CustomType.eq(c.as_str())),
    };
    Ok(select.count(conn).await? > 0)
}

/// Deadline copied onto a new document: by document type for built-in
/// kinds, by deadline type for custom ones.
async fn deadline_for<C: ConnectionTrait>(
    conn: &C,
    kind: &DocKind,
) -> Result<Option<chrono::DateTime<Utc>>, DbErr> {
    let select = match kind {
        DocKind::Builtin(t) => deadline::Entity::find().filter(deadline::Column::DocumentType.eq(*t)),
        DocKind::Custom(c) => {
            deadline::Entity::find().filter(deadline::Column::DeadlineType.eq(c.as_str()))
        }
    };
    Ok(select
        .order_by_desc(deadline::Column::UpdatedAt)
        .one(conn)
        .await?
        .map(|d| d.deadline))
}

fn submission_notice(doc: &document::Model, uploader: &user::Model) -> Notice {
    let label = type_label(doc);
    Notice::new(
        NotificationKind::DocumentSubmitted,
        "New Document Submission",
        format!("{} has submitted {}", uploader.full_name, label),
    )
    .related(Related::Document(doc.id))
    .email(
        "New Document Submission - Track Sphere",
        format!(
            "A new document has been submitted by your student.\n\n\
             Student: {}\nDocument Type: {}\nTitle: {}\nSubmitted At: {}\n\n\
             Please log in to Track Sphere to review the document.",
            uploader.full_name,
            label,
            doc.title,
            doc.submitted_at
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_default(),
        ),
    )
}

/// Delete a document with its versions, reviews and grades, then its
/// stored files. File removal is best-effort once the rows are gone.
pub async fn purge_document(
    db: &DatabaseConnection,
    files: &dyn FileStore,
    doc: &document::Model,
) -> Result<(), AppError> {
    let txn = db.begin().await?;

    let versions = document_version::Entity::find()
        .filter(document_version::Column::DocumentId.eq(doc.id))
        .all(&txn)
        .await?;

    document_version::Entity::delete_many()
        .filter(document_version::Column::DocumentId.eq(doc.id))
        .exec(&txn)
        .await?;
    review::Entity::delete_many()
        .filter(review::Column::DocumentId.eq(doc.id))
        .exec(&txn)
        .await?;
    grade::Entity::delete_many()
        .filter(grade::Column::DocumentId.eq(doc.id))
        .exec(&txn)
        .await?;
    document::Entity::delete_by_id(doc.id).exec(&txn).await?;

    txn.commit().await?;

    let mut paths: Vec<&str> = versions.iter().map(|v| v.file_path.as_str()).collect();
    paths.push(doc.file_path.as_str());
    paths.sort_unstable();
    paths.dedup();
    for path in paths {
        if let Err(e) = files.delete(path).await {
            warn!(document_id = doc.id, path, error = %e, "Failed to delete stored file");
        }
    }
    Ok(())
}
