use common::Role;
use common::grading::RUBRIC_CRITERIA;
use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

/// Three review outcomes land three notifications in the student's inbox.
async fn inbox_with_three(app: &TestApp) -> TestUser {
    let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;
    let student = app.create_user(Role::Student, "s@uni.edu").await;
    for doc_type in ["PROPOSAL", "DESIGN_DOCUMENT", "THESIS"] {
        let id = app.submitted_document(&student, doc_type).await;
        let res = app.review(&supervisor, id, "REJECTED").await;
        assert_eq!(res.status, 201, "{}", res.text);
    }
    student
}

async fn notification_ids(app: &TestApp, user: &TestUser) -> Vec<i32> {
    let res = app.get_with_token(routes::NOTIFICATIONS, &user.token).await;
    res.body
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|n| n["id"].as_i64())
        .map(|id| id as i32)
        .collect()
}

#[tokio::test]
async fn read_state_tracks_the_unread_count() {
    let app = TestApp::spawn().await;
    let student = inbox_with_three(&app).await;

    let res = app.get_with_token(routes::UNREAD_COUNT, &student.token).await;
    assert_eq!(res.body["count"], 3);

    let ids = notification_ids(&app, &student).await;
    let res = app
        .patch_with_token(&routes::notification_read(ids[0]), &json!({}), &student.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["is_read"], true);

    let res = app.get_with_token(routes::UNREAD_COUNT, &student.token).await;
    assert_eq!(res.body["count"], 2);

    let unread = app
        .get_with_token(&format!("{}?unread=true", routes::NOTIFICATIONS), &student.token)
        .await;
    assert_eq!(unread.body.as_array().map(Vec::len), Some(2));

    let res = app
        .patch_with_token(routes::READ_ALL, &json!({}), &student.token)
        .await;
    assert_eq!(res.body["count"], 2);

    let res = app.get_with_token(routes::UNREAD_COUNT, &student.token).await;
    assert_eq!(res.body["count"], 0);
}

#[tokio::test]
async fn every_notification_is_mirrored_by_email() {
    let app = TestApp::spawn().await;
    inbox_with_three(&app).await;

    let sent = app.mailer.sent_to("s@uni.edu");
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|m| m.subject == "Document Rejected - Track Sphere"));
}

#[tokio::test]
async fn every_email_carries_the_greeting_and_sign_off() {
    let app = TestApp::spawn().await;
    let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
    let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
    let student = inbox_with_three(&app).await;

    let id = app.submitted_document(&student, "TEST_DOCUMENT").await;
    let grade_id = app.grade(&evaluator, id, "Methodology", 8.0, 10.0).await.id();
    let res = app
        .patch_with_token(&routes::grade_release(grade_id), &json!({}), &committee.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    for criterion in RUBRIC_CRITERIA.iter().filter(|c| **c != "Methodology") {
        let res = app.grade(&evaluator, id, criterion, 8.0, 10.0).await;
        assert_eq!(res.status, 201, "{}", res.text);
    }
    let res = app
        .patch_with_token(&routes::document_grades_release(id), &json!({}), &committee.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let sent = app.mailer.sent();
    for subject in [
        "Document Rejected - Track Sphere",
        "Grade Released - Track Sphere",
        "Grades Released - Track Sphere",
    ] {
        assert!(
            sent.iter().any(|m| m.subject == subject),
            "no email titled {subject}"
        );
    }
    for mail in &sent {
        assert!(mail.body.starts_with("Dear "), "{}: {}", mail.subject, mail.body);
        assert!(
            mail.body.ends_with("Best regards,\nTrack Sphere Team"),
            "{}: {}",
            mail.subject,
            mail.body
        );
        assert_eq!(mail.body.matches("Best regards").count(), 1, "{}", mail.body);
    }
}

#[tokio::test]
async fn users_only_touch_their_own_notifications() {
    let app = TestApp::spawn().await;
    let student = inbox_with_three(&app).await;
    let other = app.create_user(Role::Student, "other@uni.edu").await;
    let ids = notification_ids(&app, &student).await;

    let res = app
        .delete_with_token(&routes::notification(ids[0]), &other.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .patch_with_token(&routes::notification_read(ids[0]), &json!({}), &other.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .delete_with_token(&routes::notification(ids[0]), &student.token)
        .await;
    assert_eq!(res.status, 204);
    assert_eq!(notification_ids(&app, &student).await.len(), 2);

    let res = app
        .delete_with_token(&routes::notification(ids[0]), &student.token)
        .await;
    assert_eq!(res.status, 404);
}
