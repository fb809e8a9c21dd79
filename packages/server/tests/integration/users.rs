use common::Role;
use serde_json::json;

use crate::common::{TestApp, routes};

mod identity {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_directory_entry_behind_the_token() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "ayesha@uni.edu").await;

        let res = app.get_with_token(routes::ME, &student.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], student.id);
        assert_eq!(res.body["email"], "ayesha@uni.edu");
        assert_eq!(res.body["role"], "STUDENT");
    }

    #[tokio::test]
    async fn requests_without_a_token_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod directory {
    use super::*;

    #[tokio::test]
    async fn committee_creates_users_with_normalized_email() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({
                    "email": "Bilal@Uni.edu",
                    "full_name": "Bilal Ahmed",
                    "role": "STUDENT",
                    "registration_number": "FA21-BSE-002",
                }),
                &committee.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "bilal@uni.edu");
        assert_eq!(res.body["is_active"], true);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        app.create_user(Role::Student, "taken@uni.edu").await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({"email": "taken@uni.edu", "full_name": "Someone", "role": "STUDENT"}),
                &committee.token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn students_cannot_create_users() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({"email": "x@uni.edu", "full_name": "X", "role": "STUDENT"}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn students_cannot_read_other_students() {
        let app = TestApp::spawn().await;
        let a = app.create_user(Role::Student, "a@uni.edu").await;
        let b = app.create_user(Role::Student, "b@uni.edu").await;

        let res = app.get_with_token(&routes::user(b.id), &a.token).await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn profile_update_leaves_absent_fields_alone() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;

        let res = app
            .put_with_token(
                &routes::user(student.id),
                &json!({"phone_number": "+92 300 1234567"}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["phone_number"], "+92 300 1234567");
        assert_eq!(res.body["department"], "Software Engineering");
    }
}

mod supervision {
    use super::*;

    #[tokio::test]
    async fn assigning_a_supervisor_to_all_students_reports_the_count() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;
        for i in 0..3 {
            app.create_user(Role::Student, &format!("s{i}@uni.edu")).await;
        }

        let res = app
            .patch_with_token(
                routes::ASSIGN_SUPERVISOR_ALL,
                &json!({"supervisor_id": supervisor.id}),
                &committee.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["updated"], 3);
    }

    #[tokio::test]
    async fn only_supervisors_can_be_assigned() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;

        let res = app
            .patch_with_token(
                routes::ASSIGN_SUPERVISOR_ALL,
                &json!({"supervisor_id": evaluator.id}),
                &committee.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
