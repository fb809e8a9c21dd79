use chrono::{Duration, Utc};
use common::Role;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use tracksphere_server::entity::{document, document_version};

use crate::common::{TestApp, TestUser, routes};

async fn save_deadline(
    app: &TestApp,
    committee: &TestUser,
    name: &str,
    document_type: Option<&str>,
    due_in: Duration,
) -> crate::common::TestResponse {
    app.post_with_token(
        routes::DEADLINES,
        &json!({
            "deadline_type": name,
            "document_type": document_type,
            "deadline": (Utc::now() + due_in).to_rfc3339(),
            "description": "Upload through the portal",
        }),
        &committee.token,
    )
    .await
}

mod upsert {
    use super::*;

    #[tokio::test]
    async fn saving_the_same_key_updates_in_place() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;

        let first = save_deadline(&app, &committee, "Proposal", Some("PROPOSAL"), Duration::days(10)).await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["is_active"], true);
        assert_eq!(first.body["is_expired"], false);

        let second = save_deadline(&app, &committee, "Proposal", Some("PROPOSAL"), Duration::days(20)).await;
        assert_eq!(second.status, 200, "{}", second.text);
        assert_eq!(second.id(), first.id());

        let all = app.get_with_token(routes::DEADLINES, &committee.token).await;
        assert_eq!(all.body.as_array().map(Vec::len), Some(1));

        assert_eq!(
            app.notification_titles(&student).await,
            vec!["Deadline Updated", "Deadline Added"]
        );
        assert_eq!(app.mailer.sent_to("s@uni.edu").len(), 2);
    }

    #[tokio::test]
    async fn only_the_committee_sets_deadlines() {
        let app = TestApp::spawn().await;
        let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;

        let res = save_deadline(&app, &supervisor, "Proposal", Some("PROPOSAL"), Duration::days(10)).await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn lookup_by_name_and_document_type() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let saved = save_deadline(&app, &committee, "Thesis Final", Some("THESIS"), Duration::days(30)).await;

        let by_name = app
            .get_with_token(&routes::deadline_by_name("Thesis Final"), &student.token)
            .await;
        assert_eq!(by_name.status, 200, "{}", by_name.text);
        assert_eq!(by_name.id(), saved.id());

        let by_type = app
            .get_with_token(&format!("{}/type/THESIS", routes::DEADLINES), &student.token)
            .await;
        assert_eq!(by_type.id(), saved.id());

        let missing = app
            .get_with_token(&format!("{}/type/PROPOSAL", routes::DEADLINES), &student.token)
            .await;
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn new_documents_copy_the_deadline_of_their_type() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let saved = save_deadline(&app, &committee, "Proposal", Some("PROPOSAL"), Duration::days(10)).await;

        let id = app.create_document(&student, "PROPOSAL").await;

        let doc = app.get_with_token(&routes::document(id), &student.token).await;
        let copied = doc.body["deadline"].as_str().and_then(|s| s.parse::<chrono::DateTime<Utc>>().ok());
        let expected = saved.body["deadline"].as_str().and_then(|s| s.parse::<chrono::DateTime<Utc>>().ok());
        let (Some(copied), Some(expected)) = (copied, expected) else {
            panic!("deadline missing: {}", doc.text);
        };
        assert!((copied - expected).num_seconds().abs() < 1);
    }
}

mod removal {
    use super::*;

    #[tokio::test]
    async fn deleting_a_typed_deadline_removes_its_documents() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let deadline = save_deadline(&app, &committee, "Proposal", Some("PROPOSAL"), Duration::days(10)).await;
        let proposal = app.create_document(&student, "PROPOSAL").await;
        let thesis = app.create_document(&student, "THESIS").await;

        let res = app
            .delete_with_token(&routes::deadline(deadline.id()), &committee.token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let gone = app.get_with_token(&routes::document(proposal), &student.token).await;
        assert_eq!(gone.status, 404);
        let kept = app.get_with_token(&routes::document(thesis), &student.token).await;
        assert_eq!(kept.status, 200);

        let again = app.get_with_token(&routes::deadline(deadline.id()), &student.token).await;
        assert_eq!(again.status, 404);
        assert_eq!(
            app.notification_titles(&student).await.first().map(String::as_str),
            Some("Deadline Deleted")
        );
    }

    #[tokio::test]
    async fn cascade_survives_a_missing_stored_file() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let first = app.create_user(Role::Student, "a@uni.edu").await;
        let second = app.create_user(Role::Student, "b@uni.edu").await;
        let deadline = save_deadline(&app, &committee, "Proposal", Some("PROPOSAL"), Duration::days(10)).await;
        let kept = app.create_document(&first, "PROPOSAL").await;
        let broken = app.create_document(&second, "PROPOSAL").await;
        let res = app
            .upload_with_token(
                &routes::document_versions(kept),
                &[("change_description", "Second pass")],
                "proposal-v2.pdf",
                b"%PDF-1.4 v2".to_vec(),
                &first.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let ids = [kept, broken];
        let stored: Vec<String> = document_version::Entity::find()
            .filter(document_version::Column::DocumentId.is_in(ids))
            .all(&app.db)
            .await
            .expect("load versions")
            .into_iter()
            .map(|v| v.file_path)
            .collect();
        assert_eq!(stored.len(), 3);
        let missing = document::Entity::find_by_id(broken)
            .one(&app.db)
            .await
            .expect("load document")
            .expect("document exists")
            .file_path;
        std::fs::remove_file(app.stored_file(&missing)).expect("remove stored file");

        let res = app
            .delete_with_token(&routes::deadline(deadline.id()), &committee.token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        for (id, owner) in [(kept, &first), (broken, &second)] {
            let gone = app.get_with_token(&routes::document(id), &owner.token).await;
            assert_eq!(gone.status, 404, "document {id} survived");
        }
        let versions = document_version::Entity::find()
            .filter(document_version::Column::DocumentId.is_in(ids))
            .count(&app.db)
            .await
            .expect("count versions");
        assert_eq!(versions, 0);
        let again = app.get_with_token(&routes::deadline(deadline.id()), &committee.token).await;
        assert_eq!(again.status, 404);
        for key in &stored {
            assert!(!app.stored_file(key).exists(), "{key} left on disk");
        }
    }

    #[tokio::test]
    async fn deactivated_deadlines_leave_the_active_list() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let deadline = save_deadline(&app, &committee, "Proposal", Some("PROPOSAL"), Duration::days(10)).await;
        save_deadline(&app, &committee, "Design", Some("DESIGN_DOCUMENT"), Duration::days(20)).await;

        let res = app
            .patch_with_token(
                &format!("{}/deactivate", routes::deadline(deadline.id())),
                &json!({}),
                &committee.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["is_active"], false);

        let active = app
            .get_with_token(&format!("{}/active", routes::DEADLINES), &student.token)
            .await;
        let names: Vec<&str> = active
            .body
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|d| d["deadline_type"].as_str())
            .collect();
        assert_eq!(names, vec!["Design"]);
    }
}

mod reminders {
    use super::*;

    #[tokio::test]
    async fn only_students_without_an_upload_are_reminded() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let ready = app.create_user(Role::Student, "ready@uni.edu").await;
        let late = app.create_user(Role::Student, "late@uni.edu").await;
        save_deadline(&app, &committee, "Proposal", Some("PROPOSAL"), Duration::days(1)).await;
        // Outside the three day window.
        save_deadline(&app, &committee, "Thesis", Some("THESIS"), Duration::days(30)).await;
        app.create_document(&ready, "PROPOSAL").await;

        let res = app
            .post_empty_with_token(routes::DEADLINE_REMINDERS, &committee.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["sent"], 1);
        assert_eq!(
            app.notification_titles(&late).await.first().map(String::as_str),
            Some("Deadline Approaching")
        );
        assert!(
            !app.notification_titles(&ready)
                .await
                .contains(&"Deadline Approaching".to_string())
        );
    }

    #[tokio::test]
    async fn past_deadlines_are_not_reminded() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        app.create_user(Role::Student, "s@uni.edu").await;
        save_deadline(&app, &committee, "Proposal", Some("PROPOSAL"), Duration::days(-1)).await;

        let res = app
            .post_empty_with_token(routes::DEADLINE_REMINDERS, &committee.token)
            .await;

        assert_eq!(res.body["sent"], 0);
    }
}
