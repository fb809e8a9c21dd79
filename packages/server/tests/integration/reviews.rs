use common::Role;
use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn supervisor_approval_forwards_to_evaluators() {
    let app = TestApp::spawn().await;
    let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;
    let evaluator_a = app.create_user(Role::Evaluator, "eval-a@uni.edu").await;
    let evaluator_b = app.create_user(Role::Evaluator, "eval-b@uni.edu").await;
    let student = app.create_user(Role::Student, "s@uni.edu").await;
    let id = app.submitted_document(&student, "PROPOSAL").await;

    let res = app.review(&supervisor, id, "APPROVED").await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["reviewer_role"], "SUPERVISOR");
    assert_eq!(res.body["review_round"], 1);
    assert_eq!(
        app.document_status(id, &student.token).await,
        "UNDER_EVALUATION_COMMITTEE_REVIEW"
    );
    for evaluator in [&evaluator_a, &evaluator_b] {
        assert_eq!(
            app.notification_titles(evaluator).await,
            vec!["Document Ready for Evaluation"]
        );
    }
    assert!(app.notification_titles(&student).await.is_empty());
}

#[tokio::test]
async fn evaluator_revision_reopens_and_copies_the_supervisor() {
    let app = TestApp::spawn().await;
    let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
    let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;
    let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
    let student = app.create_user(Role::Student, "s@uni.edu").await;
    app.patch_with_token(
        &format!("{}/supervisor", routes::user(student.id)),
        &json!({"supervisor_id": supervisor.id}),
        &committee.token,
    )
    .await;
    let id = app.submitted_document(&student, "DESIGN_DOCUMENT").await;
    app.review(&supervisor, id, "APPROVED").await;

    let res = app.review(&evaluator, id, "REVISION_REQUESTED").await;
    assert_eq!(res.status, 201, "{}", res.text);

    let doc = app.get_with_token(&routes::document(id), &student.token).await;
    assert_eq!(doc.body["status"], "EVALUATION_COMMITTEE_REVISION_REQUESTED");
    assert_eq!(doc.body["is_submitted"], false);

    assert_eq!(
        app.notification_titles(&student).await,
        vec!["Revision Required by Evaluation Committee"]
    );
    let supervisor_titles = app.notification_titles(&supervisor).await;
    assert!(
        supervisor_titles.contains(&"Revision Required by Evaluation Committee".to_string()),
        "{supervisor_titles:?}"
    );
}

#[tokio::test]
async fn terminal_documents_cannot_be_reviewed() {
    let app = TestApp::spawn().await;
    let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;
    let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
    let student = app.create_user(Role::Student, "s@uni.edu").await;
    let id = app.submitted_document(&student, "PROPOSAL").await;

    let res = app.review(&supervisor, id, "REJECTED").await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(app.document_status(id, &student.token).await, "REJECTED");
    assert_eq!(app.notification_titles(&student).await, vec!["Document Rejected"]);

    let res = app.review(&committee, id, "APPROVED").await;
    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "CONFLICT");
    assert_eq!(app.document_status(id, &student.token).await, "REJECTED");

    let history = app
        .get_with_token(&routes::document_reviews(id), &student.token)
        .await;
    assert_eq!(history.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn committee_approval_is_final_and_silent() {
    let app = TestApp::spawn().await;
    let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
    let student = app.create_user(Role::Student, "s@uni.edu").await;
    let id = app.submitted_document(&student, "THESIS").await;

    let res = app.review(&committee, id, "APPROVED").await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(app.document_status(id, &student.token).await, "FINAL_APPROVED");
    assert!(app.notification_titles(&student).await.is_empty());
}

#[tokio::test]
async fn students_cannot_review() {
    let app = TestApp::spawn().await;
    let student = app.create_user(Role::Student, "s@uni.edu").await;
    let id = app.submitted_document(&student, "PROPOSAL").await;

    let res = app.review(&student, id, "APPROVED").await;

    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn blank_comments_are_rejected() {
    let app = TestApp::spawn().await;
    let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;
    let student = app.create_user(Role::Student, "s@uni.edu").await;
    let id = app.submitted_document(&student, "PROPOSAL").await;

    let res = app
        .post_with_token(
            routes::REVIEWS,
            &json!({"document_id": id, "comments": "   ", "decision": "APPROVED"}),
            &supervisor.token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(app.document_status(id, &student.token).await, "SUBMITTED");
}

#[tokio::test]
async fn a_broken_mail_transport_does_not_fail_the_review() {
    let app = TestApp::spawn_with_failing_mailer().await;
    let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;
    let student = app.create_user(Role::Student, "s@uni.edu").await;
    let id = app.submitted_document(&student, "PROPOSAL").await;

    let res = app.review(&supervisor, id, "REVISION_REQUESTED").await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(
        app.document_status(id, &student.token).await,
        "SUPERVISOR_REVISION_REQUESTED"
    );
    assert_eq!(app.notification_titles(&student).await, vec!["Revision Required"]);
}
