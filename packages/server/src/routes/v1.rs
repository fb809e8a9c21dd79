use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{auth, deadline, document, grade, group, notification, review, user};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/groups", group_routes())
        .nest("/documents", document_routes())
        .nest("/reviews", review_routes())
        .nest("/grades", grade_routes())
        .nest("/deadlines", deadline_routes())
        .nest("/notifications", notification_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(auth::me))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::list_users, user::create_user))
        .routes(routes!(user::assign_supervisor_to_all))
        .routes(routes!(user::get_user, user::update_profile))
        .routes(routes!(user::deactivate_user))
        .routes(routes!(user::assign_supervisor))
        .routes(routes!(user::supervised_students))
        .routes(routes!(user::student_group))
        .routes(routes!(user::student_documents))
        .routes(routes!(user::supervised_documents))
        .routes(routes!(user::transcript))
}

fn group_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(group::list_groups, group::create_group))
        .routes(routes!(group::get_group))
        .routes(routes!(group::add_student))
        .routes(routes!(group::list_messages, group::send_message))
}

fn document_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(document::list_documents, document::create_document))
        .routes(routes!(document::get_document, document::delete_document))
        .routes(routes!(document::list_versions, document::upload_version))
        .routes(routes!(document::submit_document))
        .routes(routes!(document::assign_supervisor))
        .routes(routes!(document::update_status))
        .routes(routes!(document::download_document))
        .routes(routes!(review::list_document_reviews))
        .routes(routes!(grade::list_document_grades))
        .routes(routes!(grade::release_document_grades))
        .routes(routes!(grade::document_grade_summary))
        .routes(routes!(grade::grading_complete))
        .layer(document::upload_body_limit())
}

fn review_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(review::create_review))
        .routes(routes!(review::get_review))
        .routes(routes!(review::list_reviewer_reviews))
}

fn grade_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(grade::create_grade))
        .routes(routes!(grade::get_grade, grade::update_grade))
        .routes(routes!(grade::release_grade))
        .routes(routes!(grade::list_evaluator_grades))
}

fn deadline_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(deadline::list_deadlines, deadline::save_deadline))
        .routes(routes!(deadline::list_active_deadlines))
        .routes(routes!(deadline::send_reminders))
        .routes(routes!(deadline::get_deadline, deadline::delete_deadline))
        .routes(routes!(deadline::deactivate_deadline))
        .routes(routes!(deadline::get_deadline_by_document_type))
        .routes(routes!(deadline::get_deadline_by_name))
}

fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(notification::list_notifications))
        .routes(routes!(notification::unread_count))
        .routes(routes!(notification::mark_all_read))
        .routes(routes!(notification::mark_read))
        .routes(routes!(notification::delete_notification))
}
