use common::Role;
use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

struct Team {
    committee: TestUser,
    supervisor: TestUser,
    alice: TestUser,
    bilal: TestUser,
    group_id: i32,
}

async fn team(app: &TestApp) -> Team {
    let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
    let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;
    let alice = app.create_user(Role::Student, "alice@uni.edu").await;
    let bilal = app.create_user(Role::Student, "bilal@uni.edu").await;
    let res = app
        .post_with_token(
            routes::GROUPS,
            &json!({
                "name": "Team Orion",
                "description": "Indoor navigation",
                "supervisor_id": supervisor.id,
                "student_ids": [alice.id, bilal.id],
            }),
            &committee.token,
        )
        .await;
    assert_eq!(res.status, 201, "create group failed: {}", res.text);
    let group_id = res.id();
    Team {
        committee,
        supervisor,
        alice,
        bilal,
        group_id,
    }
}

mod membership {
    use super::*;

    #[tokio::test]
    async fn members_inherit_the_group_supervisor() {
        let app = TestApp::spawn().await;
        let t = team(&app).await;

        let res = app.get_with_token(&routes::group(t.group_id), &t.alice.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Team Orion");
        assert_eq!(res.body["members"].as_array().map(Vec::len), Some(2));

        let me = app.get_with_token(&routes::user(t.bilal.id), &t.bilal.token).await;
        assert_eq!(me.body["supervisor_id"], t.supervisor.id);
        assert_eq!(me.body["project_group_id"], t.group_id);

        let via_user = app.get_with_token(&routes::user_group(t.alice.id), &t.alice.token).await;
        assert_eq!(via_user.id(), t.group_id);
    }

    #[tokio::test]
    async fn a_student_joins_one_group_only() {
        let app = TestApp::spawn().await;
        let t = team(&app).await;
        let other = app
            .post_with_token(
                routes::GROUPS,
                &json!({"name": "Team Vega", "supervisor_id": t.supervisor.id, "student_ids": []}),
                &t.committee.token,
            )
            .await;
        assert_eq!(other.status, 201, "{}", other.text);

        let res = app
            .post_with_token(
                &format!("{}/students/{}", routes::group(other.id()), t.alice.id),
                &json!({}),
                &t.committee.token,
            )
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn group_names_are_unique() {
        let app = TestApp::spawn().await;
        let t = team(&app).await;

        let res = app
            .post_with_token(
                routes::GROUPS,
                &json!({"name": "Team Orion", "supervisor_id": t.supervisor.id, "student_ids": []}),
                &t.committee.token,
            )
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn outsiders_cannot_see_the_group() {
        let app = TestApp::spawn().await;
        let t = team(&app).await;
        let outsider = app.create_user(Role::Student, "zara@uni.edu").await;

        let res = app.get_with_token(&routes::group(t.group_id), &outsider.token).await;

        assert_eq!(res.status, 403);
    }
}

mod documents {
    use super::*;

    #[tokio::test]
    async fn one_document_per_type_per_group() {
        let app = TestApp::spawn().await;
        let t = team(&app).await;
        let id = app.create_document(&t.alice, "PROPOSAL").await;

        let res = app
            .upload_with_token(
                routes::DOCUMENTS,
                &[("title", "Second attempt"), ("doc_type", "PROPOSAL")],
                "proposal.pdf",
                b"%PDF-1.4 other".to_vec(),
                &t.bilal.token,
            )
            .await;
        assert_eq!(res.status, 409);

        // Any member may act on the group's document.
        let doc = app.get_with_token(&routes::document(id), &t.bilal.token).await;
        assert_eq!(doc.status, 200);
        assert_eq!(doc.body["project_group_id"], t.group_id);
        assert_eq!(doc.body["supervisor_id"], t.supervisor.id);
    }

    #[tokio::test]
    async fn members_list_the_group_documents() {
        let app = TestApp::spawn().await;
        let t = team(&app).await;
        let outsider = app.create_user(Role::Student, "zed@uni.edu").await;
        let id = app.create_document(&t.alice, "PROPOSAL").await;

        let res = app
            .get_with_token(&routes::user_documents(t.bilal.id), &t.bilal.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let ids: Vec<i64> = res
            .body
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|d| d["id"].as_i64())
            .collect();
        assert_eq!(ids, vec![i64::from(id)]);

        let res = app
            .get_with_token(&routes::user_documents(t.bilal.id), &outsider.token)
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn review_outcomes_reach_every_member() {
        let app = TestApp::spawn().await;
        let t = team(&app).await;
        let id = app.submitted_document(&t.alice, "PROPOSAL").await;

        let res = app.review(&t.supervisor, id, "REVISION_REQUESTED").await;
        assert_eq!(res.status, 201, "{}", res.text);

        for member in [&t.alice, &t.bilal] {
            assert_eq!(app.notification_titles(member).await, vec!["Revision Required"]);
        }
    }
}

mod chat {
    use super::*;

    #[tokio::test]
    async fn members_and_supervisor_talk_in_order() {
        let app = TestApp::spawn().await;
        let t = team(&app).await;
        let path = routes::group_messages(t.group_id);

        for (user, content) in [
            (&t.alice, "Draft is uploaded"),
            (&t.supervisor, "Reviewing tonight"),
            (&t.bilal, "Thanks"),
        ] {
            let res = app
                .post_with_token(&path, &json!({"content": content}), &user.token)
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let res = app.get_with_token(&path, &t.committee.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let contents: Vec<&str> = res
            .body
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|m| m["content"].as_str())
            .collect();
        assert_eq!(contents, vec!["Draft is uploaded", "Reviewing tonight", "Thanks"]);
    }

    #[tokio::test]
    async fn outsiders_cannot_post_or_read() {
        let app = TestApp::spawn().await;
        let t = team(&app).await;
        let outsider = app.create_user(Role::Student, "zara@uni.edu").await;
        let path = routes::group_messages(t.group_id);

        let res = app
            .post_with_token(&path, &json!({"content": "hello"}), &outsider.token)
            .await;
        assert_eq!(res.status, 403);

        let res = app.get_with_token(&path, &outsider.token).await;
        assert_eq!(res.status, 403);

        // The committee reads but does not post.
        let res = app
            .post_with_token(&path, &json!({"content": "hello"}), &t.committee.token)
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() {
        let app = TestApp::spawn().await;
        let t = team(&app).await;

        let res = app
            .post_with_token(&routes::group_messages(t.group_id), &json!({"content": "  "}), &t.alice.token)
            .await;

        assert_eq!(res.status, 400);
    }
}
