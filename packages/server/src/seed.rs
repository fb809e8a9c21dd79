use chrono::Utc;
use common::Role;
use sea_orm::sea_query::{Index, IndexCreateStatement, OnConflict};
use sea_orm::*;
use tracing::{info, warn};

use crate::config::BootstrapConfig;
use crate::entity::{document, grade, notification, review, user};

/// Create the FYP committee account named in the bootstrap config, if any.
///
/// Accounts are otherwise created by the committee itself, so a fresh
/// deployment needs one to start from.
pub async fn seed_bootstrap_committee(
    db: &DatabaseConnection,
    config: &BootstrapConfig,
) -> Result<(), DbErr> {
    let Some(email) = config
        .committee_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
    else {
        return Ok(());
    };

    let now = Utc::now();
    let model = user::ActiveModel {
        email: Set(email.to_lowercase()),
        full_name: Set(config
            .committee_name
            .clone()
            .unwrap_or_else(|| "FYP Committee".to_string())),
        role: Set(Role::FypCommittee),
        registration_number: Set(None),
        department: Set(None),
        phone_number: Set(None),
        is_active: Set(true),
        supervisor_id: Set(None),
        project_group_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = user::Entity::insert(model)
        .on_conflict(OnConflict::column(user::Column::Email).do_nothing().to_owned())
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => info!(email, "Seeded bootstrap committee account"),
        Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Ensure composite indexes exist.
///
/// SeaORM's schema-sync only creates single-column indexes, so the
/// multi-column lookups are created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Duplicate check on document creation and per-owner listings.
    create_index(
        db,
        "idx_document_student_type",
        Index::create()
            .if_not_exists()
            .name("idx_document_student_type")
            .table(document::Entity)
            .col(document::Column::StudentId)
            .col(document::Column::DocType)
            .to_owned(),
    )
    .await;

    // Completion count and "has graded all criteria".
    create_index(
        db,
        "idx_grade_document_evaluator",
        Index::create()
            .if_not_exists()
            .name("idx_grade_document_evaluator")
            .table(grade::Entity)
            .col(grade::Column::DocumentId)
            .col(grade::Column::EvaluatorId)
            .to_owned(),
    )
    .await;

    create_index(
        db,
        "idx_review_document_reviewed",
        Index::create()
            .if_not_exists()
            .name("idx_review_document_reviewed")
            .table(review::Entity)
            .col(review::Column::DocumentId)
            .col(review::Column::ReviewedAt)
            .to_owned(),
    )
    .await;

    // Inbox: unread notifications of one user.
    create_index(
        db,
        "idx_notification_user_read",
        Index::create()
            .if_not_exists()
            .name("idx_notification_user_read")
            .table(notification::Entity)
            .col(notification::Column::UserId)
            .col(notification::Column::IsRead)
            .to_owned(),
    )
    .await;

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, index: IndexCreateStatement) {
    let stmt = db.get_database_backend().build(&index);
    match db.execute_raw(stmt).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => warn!("Failed to create index {}: {}", name, e),
    }
}
