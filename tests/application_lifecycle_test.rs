mod common;

use std::sync::Arc;

use bytes::Bytes;
use common::{details, resume, Fixture, RecordingNotifier};
use jobboard_backend::config::ResumeUploadOrder;
use jobboard_backend::error::Error;
use jobboard_backend::models::application::{ApplicationFilter, ApplicationStatus, Pagination};
use jobboard_backend::models::principal::Principal;
use jobboard_backend::repositories::{ApplicationRepository, JobRepository};
use jobboard_backend::services::resume_service::{TOO_LARGE, MAX_RESUME_BYTES};
use uuid::Uuid;

#[tokio::test]
async fn submit_for_missing_job_is_not_found_and_writes_nothing() {
    let fx = Fixture::new();
    let err = fx
        .state
        .application_service
        .submit(
            &Principal::applicant("applicant-x"),
            Uuid::new_v4(),
            details("Jane", "Doe", "jane@example.com"),
            resume("cv"),
        )
        .await
        .unwrap_err();

    match err {
        Error::NotFound(msg) => assert_eq!(msg, "job not found"),
        other => panic!("unexpected {:?}", other),
    }
    let page = fx
        .applications
        .query(&ApplicationFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert!(fx.notifier.sent().is_empty());
}

#[tokio::test]
async fn second_submit_is_duplicate_and_counter_stays_at_one() {
    let fx = Fixture::new();
    let job = fx.job("Backend Engineer").await;
    let applicant = Principal::applicant("applicant-x");
    let service = &fx.state.application_service;

    service
        .submit(&applicant, job.id, details("Jane", "Doe", "jane@example.com"), resume("a"))
        .await
        .unwrap();
    let err = service
        .submit(&applicant, job.id, details("Jane", "Doe", "jane@example.com"), resume("b"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateApplication));
    assert_eq!(err.to_string(), "you have already applied");

    let page = fx
        .applications
        .query(
            &ApplicationFilter {
                job_id: Some(job.id),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(fx.jobs.get(job.id).await.unwrap().application_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_submits_yield_exactly_one_success() {
    let fx = Fixture::new();
    let job = fx.job("Backend Engineer").await;
    let applicant = Principal::applicant("racer");

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = fx.state.application_service.clone();
        let applicant = applicant.clone();
        handles.push(tokio::spawn(async move {
            service
                .submit(
                    &applicant,
                    job.id,
                    details("Race", "Condition", "race@example.com"),
                    resume(&format!("cv-{}", i)),
                )
                .await
        }));
    }

    let mut ok = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(Error::DuplicateApplication) => duplicates += 1,
            Err(other) => panic!("unexpected {:?}", other),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(fx.jobs.get(job.id).await.unwrap().application_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_views_are_all_counted() {
    let fx = Fixture::new();
    let job = fx.job("Designer").await;
    let before = fx.jobs.get(job.id).await.unwrap().view_count;

    let n = 50;
    let handles: Vec<_> = (0..n)
        .map(|_| {
            let service = fx.state.application_service.clone();
            tokio::spawn(async move { service.record_view(job.id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(fx.jobs.get(job.id).await.unwrap().view_count, before + n);
}

#[tokio::test]
async fn record_view_on_missing_job_is_not_found() {
    let fx = Fixture::new();
    let err = fx
        .state
        .application_service
        .record_view(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn counter_failure_keeps_application_and_undercounts() {
    let fx = Fixture::new();
    let job = fx.job("Data Engineer").await;
    fx.jobs.fail_application_increments(true);

    let application = fx
        .state
        .application_service
        .submit(
            &Principal::applicant("applicant-y"),
            job.id,
            details("Ann", "Lee", "ann@example.com"),
            resume("ann"),
        )
        .await
        .unwrap();

    assert_eq!(application.status, ApplicationStatus::Pending);
    assert!(fx.applications.get(application.id).await.is_ok());
    assert_eq!(fx.jobs.get(job.id).await.unwrap().application_count, 0);

    fx.jobs.fail_application_increments(false);
    fx.state
        .application_service
        .submit(
            &Principal::applicant("applicant-z"),
            job.id,
            details("Bo", "Kim", "bo@example.com"),
            resume("bo"),
        )
        .await
        .unwrap();
    assert_eq!(fx.jobs.get(job.id).await.unwrap().application_count, 1);
}

#[tokio::test]
async fn notification_failure_does_not_fail_submit() {
    let fx = Fixture::build(RecordingNotifier::failing(), ResumeUploadOrder::First);
    let job = fx.job("Support Lead").await;

    let application = fx
        .state
        .application_service
        .submit(
            &Principal::applicant("applicant-n"),
            job.id,
            details("Nia", "Ode", "nia@example.com"),
            resume("nia"),
        )
        .await
        .unwrap();

    let sent = fx.notifier.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "hr@example.com");
    assert!(sent[0].subject.contains("Support Lead"));
    assert!(sent[0].body_html.contains(&format!("job_id={}", job.id)));
    assert!(fx.applications.get(application.id).await.is_ok());
}

#[tokio::test]
async fn pending_can_jump_straight_to_hired() {
    let fx = Fixture::new();
    let job = fx.job("Backend Engineer").await;
    let application = fx
        .state
        .application_service
        .submit(
            &Principal::applicant("applicant-h"),
            job.id,
            details("Hal", "Ito", "hal@example.com"),
            resume("hal"),
        )
        .await
        .unwrap();
    assert!(application.reviewed_at.is_none());

    let before = chrono::Utc::now();
    let hired = fx
        .state
        .application_service
        .review_transition(
            &Principal::admin("admin-1"),
            application.id,
            "hired",
            Some("Great interview".into()),
        )
        .await
        .unwrap();
    assert_eq!(hired.status, ApplicationStatus::Hired);
    assert!(hired.reviewed_at.unwrap() >= before);
    assert_eq!(hired.notes.as_deref(), Some("Great interview"));

    // Backward moves are allowed too.
    let back = fx
        .state
        .application_service
        .review_transition(&Principal::admin("admin-1"), application.id, "pending", None)
        .await
        .unwrap();
    assert_eq!(back.status, ApplicationStatus::Pending);
    assert_eq!(back.notes.as_deref(), Some("Great interview"));
}

#[tokio::test]
async fn unknown_status_is_rejected_and_status_unchanged() {
    let fx = Fixture::new();
    let job = fx.job("Backend Engineer").await;
    let application = fx
        .state
        .application_service
        .submit(
            &Principal::applicant("applicant-s"),
            job.id,
            details("Sam", "Roe", "sam@example.com"),
            resume("sam"),
        )
        .await
        .unwrap();

    for bad in ["archived", "", "HIRED!"] {
        let err = fx
            .state
            .application_service
            .review_transition(&Principal::admin("admin-1"), application.id, bad, None)
            .await
            .unwrap_err();
        match err {
            Error::Validation { field, .. } => assert_eq!(field, "status"),
            other => panic!("unexpected {:?}", other),
        }
    }
    let stored = fx.applications.get(application.id).await.unwrap();
    assert_eq!(stored.status, ApplicationStatus::Pending);
    assert!(stored.reviewed_at.is_none());
}

#[tokio::test]
async fn review_requires_admin() {
    let fx = Fixture::new();
    let err = fx
        .state
        .application_service
        .review_transition(&Principal::applicant("u"), Uuid::new_v4(), "hired", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn prior_application_reports_status() {
    let fx = Fixture::new();
    let job = fx.job("Backend Engineer").await;
    let applicant = Principal::applicant("applicant-p");
    let service = &fx.state.application_service;

    let before = service.prior_application(&applicant, job.id).await.unwrap();
    assert!(!before.has_applied);
    assert!(before.status.is_none());

    service
        .submit(&applicant, job.id, details("Pat", "Ng", "pat@example.com"), resume("pat"))
        .await
        .unwrap();
    let after = service.prior_application(&applicant, job.id).await.unwrap();
    assert!(after.has_applied);
    assert_eq!(after.status, Some(ApplicationStatus::Pending));

    let mine = service.my_applications(&applicant).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].job_id, job.id);
}

#[tokio::test]
async fn oversized_resume_never_reaches_the_store() {
    let fx = Fixture::new();
    let bytes = Bytes::from(vec![0u8; 6 * 1024 * 1024]);
    assert!(bytes.len() > MAX_RESUME_BYTES);

    let err = fx
        .state
        .resume_service
        .upload("applicant-x", "cv.pdf", "application/pdf", bytes)
        .await
        .unwrap_err();
    match err {
        Error::Upload { message, size, .. } => {
            assert_eq!(message, TOO_LARGE);
            assert_eq!(size, Some(6 * 1024 * 1024));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(fx.artifacts.is_empty());
}

#[tokio::test]
async fn preflight_catches_duplicates_before_upload() {
    let fx = Fixture::build(RecordingNotifier::default(), ResumeUploadOrder::Last);
    let job = fx.job("Backend Engineer").await;
    let applicant = Principal::applicant("applicant-l");
    let service = &fx.state.application_service;
    let form = details("Lu", "Tan", "lu@example.com");

    service.preflight(&applicant, job.id, &form).await.unwrap();
    service
        .submit(&applicant, job.id, form.clone(), resume("lu"))
        .await
        .unwrap();
    let err = service.preflight(&applicant, job.id, &form).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateApplication));

    let missing = service
        .preflight(&applicant, Uuid::new_v4(), &form)
        .await
        .unwrap_err();
    assert!(matches!(missing, Error::NotFound(_)));
}

#[tokio::test]
async fn deleting_a_job_leaves_applications_in_place() {
    let fx = Fixture::new();
    let job = fx.job("Short-lived").await;
    let application = fx
        .state
        .application_service
        .submit(
            &Principal::applicant("applicant-d"),
            job.id,
            details("Dee", "Fox", "dee@example.com"),
            resume("dee"),
        )
        .await
        .unwrap();

    let jobs: Arc<dyn JobRepository> = Arc::new(fx.jobs.clone());
    fx.state
        .job_service
        .delete(&Principal::admin("admin-1"), job.id)
        .await
        .unwrap();
    assert!(!jobs.exists(job.id).await.unwrap());

    let kept = fx.applications.get(application.id).await.unwrap();
    assert_eq!(kept.job_id, job.id);
}
