use common::Role;
use common::grading::RUBRIC_CRITERIA as CRITERIA;
use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

async fn grade_all(app: &TestApp, grader: &TestUser, document_id: i32, score: f64) {
    for criterion in CRITERIA {
        let res = app.grade(grader, document_id, criterion, score, 10.0).await;
        assert_eq!(res.status, 201, "grade failed: {}", res.text);
    }
}

mod recording {
    use super::*;

    #[tokio::test]
    async fn sixth_grade_completes_evaluation_and_tells_the_committee() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;

        for criterion in &CRITERIA[..5] {
            app.grade(&evaluator, id, criterion, 8.0, 10.0).await;
        }
        assert_eq!(app.document_status(id, &student.token).await, "SUBMITTED");
        let res = app
            .get_with_token(&routes::grading_complete(id, evaluator.id), &evaluator.token)
            .await;
        assert_eq!(res.body["complete"], false);

        let res = app.grade(&evaluator, id, CRITERIA[5], 8.0, 10.0).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["is_released"], false);

        assert_eq!(
            app.document_status(id, &student.token).await,
            "EVALUATION_COMMITTEE_APPROVED"
        );
        assert_eq!(
            app.notification_titles(&committee).await,
            vec!["Document Graded"]
        );
        let res = app
            .get_with_token(&routes::grading_complete(id, evaluator.id), &evaluator.token)
            .await;
        assert_eq!(res.body["complete"], true);
    }

    #[tokio::test]
    async fn extra_rows_after_completion_notify_again_without_a_status_change() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;
        grade_all(&app, &evaluator, id, 8.0).await;

        let res = app.grade(&evaluator, id, "Presentation", 9.0, 10.0).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(
            app.document_status(id, &student.token).await,
            "EVALUATION_COMMITTEE_APPROVED"
        );
        assert_eq!(
            app.notification_titles(&committee).await,
            vec!["Document Graded", "Document Graded"]
        );
    }

    #[tokio::test]
    async fn finalized_documents_take_no_more_grades() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;
        grade_all(&app, &evaluator, id, 8.0).await;
        let res = app
            .patch_with_token(&routes::document_grades_release(id), &json!({}), &committee.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.grade(&evaluator, id, "Presentation", 9.0, 10.0).await;

        assert_eq!(res.status, 409, "{}", res.text);
        assert_eq!(res.body["code"], "CONFLICT");
        assert_eq!(app.document_status(id, &student.token).await, "FINAL_APPROVED");
        assert_eq!(
            app.notification_titles(&committee).await,
            vec!["Document Graded"]
        );
        let listed = app.get_with_token(&routes::document_grades(id), &evaluator.token).await;
        assert_eq!(listed.body.as_array().map(Vec::len), Some(6));
    }

    #[tokio::test]
    async fn rejected_documents_take_no_grades() {
        let app = TestApp::spawn().await;
        let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;
        let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;
        let res = app.review(&supervisor, id, "REJECTED").await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app.grade(&evaluator, id, CRITERIA[0], 9.0, 10.0).await;

        assert_eq!(res.status, 409, "{}", res.text);
        assert_eq!(app.document_status(id, &student.token).await, "REJECTED");
    }

    #[tokio::test]
    async fn score_above_maximum_is_rejected() {
        let app = TestApp::spawn().await;
        let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;

        let res = app.grade(&evaluator, id, "Methodology", 11.0, 10.0).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn students_cannot_grade() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;

        let res = app.grade(&student, id, "Methodology", 5.0, 10.0).await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn students_do_not_see_unreleased_grades() {
        let app = TestApp::spawn().await;
        let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;
        let grade_id = app.grade(&evaluator, id, "Methodology", 7.0, 10.0).await.id();

        let listed = app.get_with_token(&routes::document_grades(id), &student.token).await;
        assert_eq!(listed.body.as_array().map(Vec::len), Some(0));

        let single = app.get_with_token(&routes::grade(grade_id), &student.token).await;
        assert_eq!(single.status, 404);

        let staff = app.get_with_token(&routes::document_grades(id), &evaluator.token).await;
        assert_eq!(staff.body.as_array().map(Vec::len), Some(1));
    }
}

mod release {
    use super::*;

    #[tokio::test]
    async fn releasing_a_document_without_grades_is_a_conflict() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;

        let res = app
            .patch_with_token(&routes::document_grades_release(id), &json!({}), &committee.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(app.document_status(id, &student.token).await, "SUBMITTED");
    }

    #[tokio::test]
    async fn release_all_finalizes_the_document_and_reports_the_aggregate() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;
        grade_all(&app, &evaluator, id, 9.0).await;

        let res = app
            .patch_with_token(&routes::document_grades_release(id), &json!({}), &committee.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total_score"], 54.0);
        assert_eq!(res.body["total_max_score"], 60.0);
        assert_eq!(res.body["letter"], "A");
        assert_eq!(res.body["gpa"], 4.0);
        assert_eq!(app.document_status(id, &student.token).await, "FINAL_APPROVED");

        let listed = app.get_with_token(&routes::document_grades(id), &student.token).await;
        assert_eq!(listed.body.as_array().map(Vec::len), Some(6));
        assert!(
            app.notification_titles(&student)
                .await
                .contains(&"Grades Released".to_string())
        );

        let summary = app
            .get_with_token(&routes::document_grades_summary(id), &student.token)
            .await;
        assert_eq!(summary.body["total_score"], 54.0);
    }

    #[tokio::test]
    async fn a_single_grade_is_released_once() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;
        let grade_id = app.grade(&evaluator, id, "Methodology", 6.0, 10.0).await.id();

        let first = app
            .patch_with_token(&routes::grade_release(grade_id), &json!({}), &committee.token)
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["is_released"], true);

        let again = app
            .patch_with_token(&routes::grade_release(grade_id), &json!({}), &committee.token)
            .await;
        assert_eq!(again.status, 409);
        assert_eq!(again.body["code"], "CONFLICT");

        let stored = app.get_with_token(&routes::grade(grade_id), &evaluator.token).await;
        assert_eq!(stored.status, 200, "{}", stored.text);
        assert_eq!(stored.body["is_released"], true);
        assert!(!stored.body["released_at"].is_null());
        assert_eq!(stored.body["released_at"], first.body["released_at"]);

        let seen = app.get_with_token(&routes::grade(grade_id), &student.token).await;
        assert_eq!(seen.status, 200, "{}", seen.text);
        assert_eq!(app.notification_titles(&student).await, vec!["Grade Released"]);
    }

    #[tokio::test]
    async fn released_grades_cannot_be_edited() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;
        let grade_id = app.grade(&evaluator, id, "Methodology", 6.0, 10.0).await.id();

        let res = app
            .patch_with_token(&routes::grade_release(grade_id), &json!({}), &committee.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["is_released"], true);
        assert_eq!(app.notification_titles(&student).await, vec!["Grade Released"]);

        let res = app
            .put_with_token(&routes::grade(grade_id), &json!({"score": 9.0}), &evaluator.token)
            .await;
        assert_eq!(res.status, 409);

        let res = app
            .patch_with_token(&routes::grade_release(grade_id), &json!({}), &committee.token)
            .await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn evaluators_edit_only_their_own_grades() {
        let app = TestApp::spawn().await;
        let author = app.create_user(Role::Evaluator, "a@uni.edu").await;
        let other = app.create_user(Role::Evaluator, "b@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;
        let id = app.submitted_document(&student, "PROPOSAL").await;
        let grade_id = app.grade(&author, id, "Methodology", 6.0, 10.0).await.id();

        let res = app
            .put_with_token(&routes::grade(grade_id), &json!({"score": 9.0}), &other.token)
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .put_with_token(&routes::grade(grade_id), &json!({"score": 9.0}), &author.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["score"], 9.0);
    }
}

mod transcript {
    use super::*;

    #[tokio::test]
    async fn transcript_averages_document_gpas() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let evaluator = app.create_user(Role::Evaluator, "eval@uni.edu").await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;

        let proposal = app.submitted_document(&student, "PROPOSAL").await;
        grade_all(&app, &evaluator, proposal, 9.0).await; // 90% -> A, 4.0
        let design = app.submitted_document(&student, "DESIGN_DOCUMENT").await;
        grade_all(&app, &evaluator, design, 7.0).await; // 70% -> B, 3.0
        // Graded but never released: left out.
        let thesis = app.submitted_document(&student, "THESIS").await;
        grade_all(&app, &evaluator, thesis, 10.0).await;

        for id in [proposal, design] {
            let res = app
                .patch_with_token(&routes::document_grades_release(id), &json!({}), &committee.token)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        let res = app
            .get_with_token(&routes::user_transcript(student.id), &student.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["student_id"], student.id);
        assert_eq!(res.body["document_grades"].as_array().map(Vec::len), Some(2));
        assert_eq!(res.body["overall_total_score"], 96.0);
        assert_eq!(res.body["overall_max_score"], 120.0);
        assert_eq!(res.body["overall_grade"], "A-");
        let gpa = res.body["overall_gpa"].as_f64().unwrap();
        assert!((gpa - 3.5).abs() < 1e-9, "{gpa}");
    }

    #[tokio::test]
    async fn empty_transcript_reports_zero_totals() {
        let app = TestApp::spawn().await;
        let student = app.create_user(Role::Student, "s@uni.edu").await;

        let res = app
            .get_with_token(&routes::user_transcript(student.id), &student.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["document_grades"].as_array().map(Vec::len), Some(0));
        assert_eq!(res.body["overall_total_score"], 0.0);
        assert_eq!(res.body["overall_gpa"], 0.0);
        assert_eq!(res.body["overall_grade"], "F");
    }

    #[tokio::test]
    async fn transcripts_are_only_for_students() {
        let app = TestApp::spawn().await;
        let committee = app.create_user(Role::FypCommittee, "fyp@uni.edu").await;
        let supervisor = app.create_user(Role::Supervisor, "sup@uni.edu").await;

        let res = app
            .get_with_token(&routes::user_transcript(supervisor.id), &committee.token)
            .await;

        assert_eq!(res.status, 400);
    }
}
