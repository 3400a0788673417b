//! Reconcile sequencing against a scripted controller.

use std::time::Duration;

use halley_core::errors::CoreError;
use halley_core::reconcile::Reconciler;
use halley_core::runner::ServiceState;
use halley_tests::RecordingController;

#[tokio::test]
async fn test_running_service_stop_precedes_start() {
    let controller = RecordingController::new(vec![ServiceState::Running]);
    let reconciler = Reconciler::new(&controller).with_verification(0, Duration::ZERO);

    let report = reconciler.reconcile().await.unwrap();

    assert!(report.stopped);
    assert!(report.started);

    let calls = controller.calls();
    let down = calls.iter().position(|c| c == "down").unwrap();
    let up = calls.iter().position(|c| c == "up").unwrap();
    assert!(down < up, "stop must complete before start: {calls:?}");
}

#[tokio::test]
async fn test_absent_service_does_not_error_on_stop() {
    let controller = RecordingController::new(vec![ServiceState::Absent]);
    let reconciler = Reconciler::new(&controller).with_verification(0, Duration::ZERO);

    let report = reconciler.reconcile().await.unwrap();

    assert!(!report.stopped);
    assert!(report.started);
    assert!(!controller.calls().contains(&"down".to_string()));
}

#[tokio::test]
async fn test_failed_stop_never_starts() {
    let mut controller = RecordingController::new(vec![ServiceState::Running]);
    controller.fail_down = true;
    let reconciler = Reconciler::new(&controller).with_verification(0, Duration::ZERO);

    let err = reconciler.reconcile().await.unwrap_err();

    assert!(matches!(err, CoreError::StopFailed(_)));
    assert!(!controller.calls().contains(&"up".to_string()));
}

#[tokio::test]
async fn test_failed_start_reported_without_rollback() {
    let mut controller = RecordingController::new(vec![ServiceState::Stopped]);
    controller.fail_up = true;
    let reconciler = Reconciler::new(&controller).with_verification(0, Duration::ZERO);

    let err = reconciler.reconcile().await.unwrap_err();
    assert!(matches!(err, CoreError::ProcessFailed { .. }));
    // Stop already ran; the files on disk are the operator's to retry with.
    assert!(controller.calls().contains(&"down".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_liveness_confirmed_within_bound() {
    let controller = RecordingController::new(vec![
        ServiceState::Absent,
        ServiceState::Stopped,
        ServiceState::Running,
    ]);
    let reconciler = Reconciler::new(&controller).with_verification(5, Duration::from_secs(3));

    let report = reconciler.reconcile().await.unwrap();

    assert_eq!(report.verified, Some(true));
    assert!(report.warnings.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_liveness_timeout_is_soft() {
    let controller =
        RecordingController::new(vec![ServiceState::Absent, ServiceState::Stopped]);
    let reconciler = Reconciler::new(&controller).with_verification(2, Duration::from_secs(3));

    let report = reconciler.reconcile().await.unwrap();

    assert_eq!(report.verified, Some(false));
    assert_eq!(report.warnings.len(), 1);
    assert!(report.started);
}

#[tokio::test]
async fn test_validation_failure_restores_previous_manifest() {
    let dir = tempfile::TempDir::new().unwrap();
    let manifest = dir.path().join("docker-compose.yml");
    let backup = dir.path().join("docker-compose.yml.bak.20260101-120000");
    std::fs::write(&manifest, "broken: [\n").unwrap();
    std::fs::write(&backup, "services: {}\n").unwrap();

    let mut controller = RecordingController::new(vec![ServiceState::Absent]);
    controller.fail_validate = true;
    let reconciler = Reconciler::new(&controller).with_verification(0, Duration::ZERO);

    let err = reconciler
        .validate_manifest(&manifest, Some(&backup))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ManifestInvalid(_)));
    assert_eq!(
        std::fs::read_to_string(&manifest).unwrap(),
        "services: {}\n"
    );
    // No start was attempted with the broken definition.
    assert!(!controller.calls().contains(&"up".to_string()));
}
