mod common;

use common::{entry, session, two_cluster_result, FakeService};
use serde_json::json;
use std::time::Duration;
use tnm_dashboard::staging::Axis;
use tnm_dashboard::{SessionError, SessionState, StageError, StageSelection};

#[tokio::test]
async fn test_full_cycle_matches_nearest_cluster() {
    let mut session = session(FakeService::completing_with(two_cluster_result()));

    let receipt = session.submit().await.unwrap();
    assert_eq!(receipt.task_id, 1);
    assert_eq!(session.state().name(), "submitted");

    let outcome = session.retrieve().await.unwrap();
    assert_eq!(outcome.clusters, 2);
    assert_eq!(session.state().name(), "retrieved");

    // (T1, N0, M0) -> (0,0,0): distance 0 to cluster 0, sqrt(3) to cluster 1
    let matched = session.match_stage(&StageSelection::new("T1", "N0", "M0")).unwrap();
    assert_eq!(matched.cluster, 0);
    assert_eq!(matched.distance, 0.0);
    let probs: Vec<f64> = matched.curve.points.iter().map(|p| p.probability).collect();
    assert_eq!(probs, vec![1.0, 0.9, 0.85, 0.8]);

    // (T2, N1, M1) -> (1,1,1)
    let matched = session.match_stage(&StageSelection::new("T2", "N1", "M1")).unwrap();
    assert_eq!(matched.cluster, 1);
    assert_eq!(matched.centroid, [1.0, 1.0, 1.0]);
    assert_eq!(matched.curve.points[0].probability, 0.8);

    let chart = matched.chart();
    assert_eq!(chart.y_range, [0.0, 1.0]);
    let times: Vec<u32> = chart.points.iter().map(|p| p.time).collect();
    assert_eq!(times, vec![0, 30, 60, 90]);
}

#[tokio::test]
async fn test_submission_uses_analysis_parameters() {
    let mut session = session(FakeService::completing_with(two_cluster_result()));
    session.submit().await.unwrap();

    let state = session.service().state.lock().unwrap();
    assert_eq!(state.auth_calls, 1);
    let spec = &state.submitted[0];
    assert_eq!(spec.collaboration_id, 2);
    assert_eq!(spec.organizations, vec![7, 8]);
    assert_eq!(spec.input["kwargs"]["k"], 4);
    assert_eq!(spec.input["kwargs"]["epsilon"], 0.01);
    assert_eq!(spec.input["kwargs"]["max_iter"], 50);
}

#[tokio::test]
async fn test_retrieve_before_submit() {
    let mut session = session(FakeService::completing_with(two_cluster_result()));
    assert_eq!(session.retrieve().await.unwrap_err(), SessionError::NoTaskSubmitted);
    assert_eq!(session.service().state.lock().unwrap().status_calls, 0);
}

#[tokio::test]
async fn test_incomplete_task_is_not_ready() {
    let service = FakeService::completing_with(two_cluster_result()).with(|s| s.pending_polls = 1);
    let mut session = session(service);
    session.submit().await.unwrap();

    let err = session.retrieve().await.unwrap_err();
    assert!(matches!(err, SessionError::NotReady(_)));
    assert_eq!(err.kind(), "not_ready");
    assert_eq!(session.state().name(), "submitted");

    // Second attempt succeeds
    assert!(session.retrieve().await.is_ok());
}

#[tokio::test]
async fn test_status_failure_is_not_ready() {
    let service = FakeService::completing_with(two_cluster_result()).with(|s| s.fail_status = true);
    let mut session = session(service);
    session.submit().await.unwrap();

    assert!(matches!(
        session.retrieve().await.unwrap_err(),
        SessionError::NotReady(_)
    ));
}

#[tokio::test]
async fn test_match_before_retrieve() {
    let mut session = session(FakeService::completing_with(two_cluster_result()));
    let selection = StageSelection::new("T1", "N0", "M0");

    assert_eq!(
        session.match_stage(&selection).unwrap_err(),
        SessionError::NoResultsAvailable
    );

    session.submit().await.unwrap();
    assert_eq!(
        session.match_stage(&selection).unwrap_err(),
        SessionError::NoResultsAvailable
    );
}

#[tokio::test]
async fn test_invalid_stage_rejected_before_matching() {
    let mut session = session(FakeService::completing_with(two_cluster_result()));

    // Validation happens even with no results loaded
    let err = session
        .match_stage(&StageSelection::new("T3", "N0", "M0"))
        .unwrap_err();
    assert_eq!(
        err,
        SessionError::Stage(StageError::InvalidStage {
            axis: Axis::T,
            label: "T3".to_string()
        })
    );
    assert_eq!(err.kind(), "invalid_stage");

    session.submit().await.unwrap();
    session.retrieve().await.unwrap();
    let err = session
        .match_stage(&StageSelection::new("T1", "N0", "M9"))
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Stage(StageError::InvalidStage { axis: Axis::M, .. })
    ));
}

#[tokio::test]
async fn test_incomplete_selection() {
    let mut session = session(FakeService::completing_with(two_cluster_result()));
    session.submit().await.unwrap();
    session.retrieve().await.unwrap();

    let selection = StageSelection {
        t: Some("T1".to_string()),
        n: None,
        m: Some("M0".to_string()),
    };
    let err = session.match_stage(&selection).unwrap_err();
    assert_eq!(err, SessionError::Stage(StageError::MissingSelection(Axis::N)));
    assert_eq!(err.kind(), "missing_selection");
}

#[tokio::test]
async fn test_second_submission_rejected_while_in_flight() {
    let mut session = session(FakeService::completing_with(two_cluster_result()));
    session.submit().await.unwrap();

    assert_eq!(session.submit().await.unwrap_err(), SessionError::TaskInFlight(1));
    assert_eq!(session.service().state.lock().unwrap().submitted.len(), 1);

    session.reset();
    assert_eq!(session.state(), &SessionState::Idle);
    assert_eq!(session.submit().await.unwrap().task_id, 2);
}

#[tokio::test]
async fn test_resubmission_after_retrieval_discards_results() {
    let mut session = session(FakeService::completing_with(two_cluster_result()));
    session.submit().await.unwrap();
    session.retrieve().await.unwrap();

    let receipt = session.submit().await.unwrap();
    assert_eq!(receipt.task_id, 2);
    assert_eq!(
        session
            .match_stage(&StageSelection::new("T1", "N0", "M0"))
            .unwrap_err(),
        SessionError::NoResultsAvailable
    );
}

#[tokio::test]
async fn test_submission_failure_keeps_idle() {
    let service = FakeService::completing_with(two_cluster_result()).with(|s| s.fail_submit = true);
    let mut session = session(service);

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, SessionError::Submission(_)));
    assert_eq!(session.state(), &SessionState::Idle);
}

#[tokio::test]
async fn test_authentication_failure_is_submission_error() {
    let service = FakeService::completing_with(two_cluster_result()).with(|s| s.fail_auth = true);
    let mut session = session(service);

    match session.submit().await.unwrap_err() {
        SessionError::Submission(msg) => assert!(msg.contains("Invalid username/password")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(session.service().state.lock().unwrap().submitted.is_empty());
}

#[tokio::test]
async fn test_submit_timeout() {
    let service = FakeService::completing_with(two_cluster_result())
        .with(|s| s.delay = Some(Duration::from_secs(5)));
    let mut session = common::session(service).with_timeout(Duration::from_millis(50));

    match session.submit().await.unwrap_err() {
        SessionError::Submission(msg) => assert!(msg.contains("timed out")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(session.state(), &SessionState::Idle);
}

#[tokio::test]
async fn test_retrieve_timeout_is_not_ready() {
    let mut session = common::session(FakeService::completing_with(two_cluster_result()))
        .with_timeout(Duration::from_millis(50));
    session.submit().await.unwrap();

    session.service().state.lock().unwrap().delay = Some(Duration::from_secs(5));
    match session.retrieve().await.unwrap_err() {
        SessionError::NotReady(msg) => assert!(msg.contains("timed out")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(session.state().name(), "submitted");
}

#[tokio::test]
async fn test_missing_profiles_is_recoverable() {
    let service = FakeService::completing_with(json!({ "centroids": [[0, 0, 0]] }));
    let mut session = session(service);
    session.submit().await.unwrap();

    let err = session.retrieve().await.unwrap_err();
    assert!(matches!(err, SessionError::MissingResult(_)));
    assert_eq!(session.state().name(), "submitted");

    session
        .service()
        .set_results(vec![entry(two_cluster_result(), None)]);
    assert_eq!(session.retrieve().await.unwrap().clusters, 2);
}

#[tokio::test]
async fn test_profile_count_must_match_centroids() {
    let service = FakeService::completing_with(json!({
        "centroids": [[0, 0, 0], [1, 1, 1]],
        "profiles": [[1.0, 0.9]],
    }));
    let mut session = session(service);
    session.submit().await.unwrap();

    match session.retrieve().await.unwrap_err() {
        SessionError::MissingResult(msg) => assert!(msg.contains("2 centroids but 1 profiles")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_cluster_profile_is_missing_result() {
    let service = FakeService::completing_with(json!({
        "centroids": [[0, 0, 0], [1, 1, 1]],
        "profiles": [[], [0.5]],
    }));
    let mut session = session(service);
    session.submit().await.unwrap();

    match session.retrieve().await.unwrap_err() {
        SessionError::MissingResult(msg) => assert!(msg.contains("profile 0 is empty")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(session.state().name(), "submitted");
}

#[tokio::test]
async fn test_exactly_one_result_entry_required() {
    let service = FakeService::default();
    let mut session = session(service);
    session.submit().await.unwrap();

    assert!(matches!(
        session.retrieve().await.unwrap_err(),
        SessionError::MissingResult(_)
    ));

    session.service().set_results(vec![
        entry(two_cluster_result(), None),
        entry(two_cluster_result(), None),
    ]);
    assert!(matches!(
        session.retrieve().await.unwrap_err(),
        SessionError::MissingResult(_)
    ));
}

#[tokio::test]
async fn test_duration_uses_reported_finish_time() {
    let service = FakeService::default();
    let mut session = session(service);
    let receipt = session.submit().await.unwrap();

    let finished = receipt.submitted_at + chrono::Duration::seconds(90);
    session
        .service()
        .set_results(vec![entry(two_cluster_result(), Some(&finished.to_rfc3339()))]);

    let outcome = session.retrieve().await.unwrap();
    assert_eq!(outcome.duration_minutes, 1.5);
    assert_eq!(session.snapshot().duration_minutes, Some(1.5));
}

#[tokio::test]
async fn test_retrieve_is_idempotent_after_success() {
    let mut session = session(FakeService::completing_with(two_cluster_result()));
    session.submit().await.unwrap();

    let first = session.retrieve().await.unwrap();
    let calls = session.service().state.lock().unwrap().status_calls;
    let second = session.retrieve().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(session.service().state.lock().unwrap().status_calls, calls);
}

#[tokio::test]
async fn test_matching_is_deterministic() {
    let service = FakeService::completing_with(json!({
        "centroids": [[0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0, 1, 0]],
        "profiles": [[0.9], [0.1], [0.5]],
    }));
    let mut session = session(service);
    session.submit().await.unwrap();
    session.retrieve().await.unwrap();

    let selection = StageSelection::new("T1", "N0", "M0");
    for _ in 0..5 {
        // Clusters 0 and 1 tie; the lower index wins
        assert_eq!(session.match_stage(&selection).unwrap().cluster, 0);
    }
}

#[tokio::test]
async fn test_poll_until_complete() {
    let service = FakeService::completing_with(two_cluster_result()).with(|s| s.pending_polls = 3);
    let mut session = session(service);
    session.submit().await.unwrap();

    let outcome = session
        .poll_until_complete(Duration::from_millis(10), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(outcome.clusters, 2);
    assert_eq!(session.service().state.lock().unwrap().status_calls, 4);
}

#[tokio::test]
async fn test_poll_gives_up_after_max_wait() {
    let service =
        FakeService::completing_with(two_cluster_result()).with(|s| s.pending_polls = 1000);
    let mut session = session(service);
    session.submit().await.unwrap();

    let err = session
        .poll_until_complete(Duration::from_millis(10), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotReady(_)));
}

#[tokio::test]
async fn test_poll_stops_on_missing_result() {
    let service = FakeService::completing_with(json!({ "profiles": [[1.0]] }));
    let mut session = session(service);
    session.submit().await.unwrap();

    let err = session
        .poll_until_complete(Duration::from_millis(10), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::MissingResult(_)));
    assert_eq!(session.service().state.lock().unwrap().status_calls, 1);
}

#[tokio::test]
async fn test_snapshot_tracks_state() {
    let mut session = session(FakeService::completing_with(two_cluster_result()));
    assert_eq!(session.snapshot().state, "idle");
    assert_eq!(session.snapshot().task_id, None);

    session.submit().await.unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, "submitted");
    assert_eq!(snapshot.task_id, Some(1));
    assert!(snapshot.submitted_at.is_some());
    assert_eq!(snapshot.clusters, None);

    session.retrieve().await.unwrap();
    assert_eq!(session.snapshot().clusters, Some(2));
}
