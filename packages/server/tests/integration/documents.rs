use common::Role;
use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

async fn supervised_student(app: &TestApp) -> (TestUser, TestUser) {
    let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
    let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;
    let student = app.create_user(Role::Student, "student@uni.edu").await;
    let res = app
        .patch_with_token(
            &format!("{}/supervisor", routes::user(student.id)),
            &json!({"supervisor_id": supervisor.id}),
            &committee.token,
        )
        .await;
    assert_eq!(res.status, 200, "assign supervisor failed: {}", res.text);
    (student, supervisor)
}

mod upload {
    use super::*;

    #[tokio::test]
    async fn new_document_starts_as_draft_version_one() {
        let app = TestApp::spawn().await;
        let (student, supervisor) = supervised_student(&app).await;

        let res = app
            .upload_with_token(
                routes::DOCUMENTS,
                &[("title", "Smart Campus Navigator"), ("doc_type", "PROPOSAL")],
                "proposal.pdf",
                b"%PDF-1.4 body".to_vec(),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "DRAFT");
        assert_eq!(res.body["version"], 1);
        assert_eq!(res.body["is_submitted"], false);
        assert_eq!(res.body["file_name"], "proposal.pdf");
        assert_eq!(res.body["supervisor_id"], supervisor.id);
        assert!(res.body.get("file_path").is_none());
    }

    #[tokio::test]
    async fn second_document_of_the_same_type_is_a_conflict() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        app.create_document(&student, "PROPOSAL").await;

        let res = app
            .upload_with_token(
                routes::DOCUMENTS,
                &[("title", "Another"), ("doc_type", "PROPOSAL")],
                "again.pdf",
                b"x".to_vec(),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn type_and_custom_type_are_mutually_exclusive() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;

        let both = app
            .upload_with_token(
                routes::DOCUMENTS,
                &[("title", "T"), ("doc_type", "THESIS"), ("custom_type", "Poster")],
                "t.pdf",
                b"x".to_vec(),
                &student.token,
            )
            .await;
        let neither = app
            .upload_with_token(
                routes::DOCUMENTS,
                &[("title", "T")],
                "t.pdf",
                b"x".to_vec(),
                &student.token,
            )
            .await;

        assert_eq!(both.status, 400);
        assert_eq!(neither.status, 400);
        assert_eq!(neither.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn staff_cannot_upload_documents() {
        let app = TestApp::spawn().await;
        let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;

        let res = app
            .upload_with_token(
                routes::DOCUMENTS,
                &[("title", "T"), ("doc_type", "THESIS")],
                "t.pdf",
                b"x".to_vec(),
                &supervisor.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn other_students_cannot_read_the_document() {
        let app = TestApp::spawn().await;
        let owner = app.create_user(Role::Student, "owner@uni.edu").await;
        let other = app.create_user(Role::Student, "other@uni.edu").await;
        let id = app.create_document(&owner, "PROPOSAL").await;

        let res = app.get_with_token(&routes::document(id), &other.token).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn download_returns_the_stored_bytes() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.create_document(&student, "PROPOSAL").await;

        let res = app
            .client
            .get(format!("http://{}{}", app.addr, routes::document_download(id)))
            .header("Authorization", format!("Bearer {}", student.token))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 200);
        let disposition = res
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposition.contains("proposal.pdf"), "{disposition}");
        assert_eq!(res.bytes().await.unwrap().as_ref(), b"%PDF-1.4 test");
    }
}

mod submission {
    use super::*;

    #[tokio::test]
    async fn submit_marks_the_document_and_tells_the_supervisor() {
        let app = TestApp::spawn().await;
        let (student, supervisor) = supervised_student(&app).await;
        let id = app.create_document(&student, "PROPOSAL").await;

        let res = app
            .post_empty_with_token(&routes::document_submit(id), &student.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "SUBMITTED");
        assert_eq!(res.body["is_submitted"], true);
        assert!(res.body["submitted_at"].is_string());
        assert_eq!(res.body["is_late_submission"], false);

        let titles = app.notification_titles(&supervisor).await;
        assert_eq!(titles, vec!["New Document Submission"]);
        assert_eq!(app.mailer.sent_to(&supervisor.email).len(), 1);
    }

    #[tokio::test]
    async fn submitting_twice_is_a_conflict() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;

        let res = app
            .post_empty_with_token(&routes::document_submit(id), &student.token)
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn submission_after_the_deadline_is_refused() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let res = app
            .post_with_token(
                routes::DEADLINES,
                &json!({
                    "deadline_type": "Proposal",
                    "document_type": "PROPOSAL",
                    "deadline": "2020-01-01T00:00:00Z",
                }),
                &committee.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let id = app.create_document(&student, "PROPOSAL").await;
        let res = app
            .post_empty_with_token(&routes::document_submit(id), &student.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "DEADLINE_PASSED");
        assert_eq!(app.document_status(id, &student.token).await, "DRAFT");
    }

    #[tokio::test]
    async fn owners_cannot_delete_submitted_documents() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;

        let res = app.delete_with_token(&routes::document(id), &student.token).await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn draft_documents_can_be_deleted_by_their_owner() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.create_document(&student, "PROPOSAL").await;

        let res = app.delete_with_token(&routes::document(id), &student.token).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app.get_with_token(&routes::document(id), &student.token).await;
        assert_eq!(res.status, 404);
    }
}

mod versions {
    use super::*;

    #[tokio::test]
    async fn new_version_after_a_revision_request_returns_to_draft() {
        let app = TestApp::spawn().await;
        let (student, supervisor) = supervised_student(&app).await;
        let id = app.submitted_document(&student, "PROPOSAL").await;

        let res = app.review(&supervisor, id, "REVISION_REQUESTED").await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(
            app.document_status(id, &student.token).await,
            "SUPERVISOR_REVISION_REQUESTED"
        );

        let res = app
            .upload_with_token(
                &routes::document_versions(id),
                &[("change_description", "Addressed feedback")],
                "proposal-v2.pdf",
                b"%PDF-1.4 v2".to_vec(),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["version"], 2);
        assert_eq!(res.body["status"], "DRAFT");
        assert_eq!(res.body["is_submitted"], false);
        assert_eq!(res.body["file_name"], "proposal-v2.pdf");

        let history = app
            .get_with_token(&routes::document_versions(id), &student.token)
            .await;
        let versions = history.body.as_array().expect("versions array");
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0]["version_number"], 2);
        assert_eq!(versions[0]["change_description"], "Addressed feedback");
        assert_eq!(versions[1]["was_submitted"], true);
    }

    #[tokio::test]
    async fn new_version_of_a_draft_keeps_its_status() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.create_document(&student, "THESIS").await;

        let res = app
            .upload_with_token(
                &routes::document_versions(id),
                &[],
                "thesis.pdf",
                b"v2".to_vec(),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["version"], 2);
        assert_eq!(res.body["status"], "DRAFT");
    }
}

mod status_override {
    use super::*;

    #[tokio::test]
    async fn terminal_documents_cannot_be_overridden() {
        let app = TestApp::spawn().await;
        let (student, supervisor) = supervised_student(&app).await;
        let id = app.submitted_document(&student, "PROPOSAL").await;
        let res = app.review(&supervisor, id, "REJECTED").await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app
            .patch_with_token(
                &routes::document_status(id),
                &json!({"status": "DRAFT"}),
                &supervisor.token,
            )
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn students_cannot_override_status() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.create_document(&student, "PROPOSAL").await;

        let res = app
            .patch_with_token(
                &routes::document_status(id),
                &json!({"status": "FINAL_APPROVED"}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}
