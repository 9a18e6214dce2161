//! Status machine tests for execution sessions.

use crate::session::domain::{Session, SessionDomainError, SessionStatus};
use crate::task::domain::TaskId;
use crate::workspace::domain::ProjectId;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn pending() -> Session {
    Session::new(TaskId::new(), ProjectId::new(), "Task: demo", &DefaultClock)
}

#[rstest]
#[case(SessionStatus::Pending, SessionStatus::Running, true)]
#[case(SessionStatus::Pending, SessionStatus::Failed, true)]
#[case(SessionStatus::Pending, SessionStatus::Cancelled, true)]
#[case(SessionStatus::Pending, SessionStatus::Completed, false)]
#[case(SessionStatus::Running, SessionStatus::Completed, true)]
#[case(SessionStatus::Running, SessionStatus::Failed, true)]
#[case(SessionStatus::Running, SessionStatus::Cancelled, true)]
#[case(SessionStatus::Running, SessionStatus::Pending, false)]
#[case(SessionStatus::Completed, SessionStatus::Running, false)]
#[case(SessionStatus::Failed, SessionStatus::Completed, false)]
#[case(SessionStatus::Cancelled, SessionStatus::Running, false)]
fn transition_table(
    #[case] from: SessionStatus,
    #[case] to: SessionStatus,
    #[case] allowed: bool,
) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[rstest]
#[case("pending", SessionStatus::Pending)]
#[case(" Running ", SessionStatus::Running)]
#[case("cancelled", SessionStatus::Cancelled)]
fn status_parses_storage_values(#[case] raw: &str, #[case] expected: SessionStatus) {
    assert_eq!(SessionStatus::try_from(raw), Ok(expected));
}

#[rstest]
fn unknown_status_is_rejected() {
    assert!(SessionStatus::try_from("paused").is_err());
}

#[rstest]
fn running_then_completed_records_timing(mut pending: Session) {
    pending
        .mark_running(Some("remote-1".to_owned()), &DefaultClock)
        .expect("pending sessions can start");
    assert!(pending.started_at().is_some());
    assert_eq!(pending.remote_session_id(), Some("remote-1"));

    let changed = pending
        .apply_report(SessionStatus::Completed, None, &DefaultClock)
        .expect("running sessions can complete");

    assert!(changed);
    assert_eq!(pending.status(), SessionStatus::Completed);
    assert!(pending.completed_at().is_some());
    assert!(pending.duration_ms().is_some_and(|ms| ms >= 0));
}

#[rstest]
fn completion_reported_while_pending_passes_through_running(mut pending: Session) {
    pending
        .apply_report(SessionStatus::Completed, None, &DefaultClock)
        .expect("completion is accepted");

    assert_eq!(pending.status(), SessionStatus::Completed);
    assert!(pending.started_at().is_some());
}

#[rstest]
fn failure_report_records_error_and_output(mut pending: Session) {
    pending
        .mark_running(None, &DefaultClock)
        .expect("pending sessions can start");
    pending
        .apply_report(SessionStatus::Failed, Some("model quota exhausted"), &DefaultClock)
        .expect("running sessions can fail");

    assert_eq!(pending.error(), Some("model quota exhausted"));
    assert!(pending.output().ends_with("\nError: model quota exhausted\n"));
}

#[rstest]
fn repeated_report_is_a_no_op(mut pending: Session) {
    pending.cancel(&DefaultClock).expect("pending sessions can be cancelled");

    let changed = pending
        .apply_report(SessionStatus::Cancelled, None, &DefaultClock)
        .expect("same status is accepted");

    assert!(!changed);
}

#[rstest]
fn terminal_sessions_do_not_move(mut pending: Session) {
    pending.cancel(&DefaultClock).expect("pending sessions can be cancelled");
    let session_id = pending.id();

    let err = pending
        .apply_report(SessionStatus::Running, None, &DefaultClock)
        .expect_err("cancelled is terminal");

    assert_eq!(
        err,
        SessionDomainError::InvalidStatusTransition {
            session_id,
            from: SessionStatus::Cancelled,
            to: SessionStatus::Running,
        }
    );
    assert!(pending.cancel(&DefaultClock).is_err());
}

#[rstest]
fn blank_checkpoint_is_rejected(mut pending: Session) {
    assert_eq!(
        pending.record_event_id("  ", &DefaultClock),
        Err(SessionDomainError::EmptyEventId)
    );
    pending
        .record_event_id("evt-42", &DefaultClock)
        .expect("checkpoint is stored");
    assert_eq!(pending.last_event_id(), Some("evt-42"));
}
