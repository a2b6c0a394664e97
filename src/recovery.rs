//! Startup recovery of a persisted session.
//!
//! Recovery is one-shot: once a stored record has been read it is cleared,
//! whether it could be applied or not, so a stale snapshot is never
//! replayed twice. Anything unusable degrades to "no snapshot" and the host
//! keeps its fresh idle session.

use chrono::{DateTime, Utc};

use crate::persistence::{PersistenceError, PersistenceGateway, PersistenceSnapshot};
use crate::types::Session;

/// Session rebuilt from a snapshot, adjusted for time spent while not running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recovered {
    /// Session the engine should be seeded with
    pub session: Session,
    /// Whether the tick source must be re-armed
    pub rearm: bool,
    /// Whole seconds between the save and now, clamped at zero
    pub elapsed_seconds: u64,
    /// A running countdown reached zero while the process was gone
    pub completed_while_away: bool,
}

/// Result of looking for a persisted session at startup.
#[derive(Debug)]
pub enum RecoveryOutcome {
    /// Nothing was persisted, or the store could not be read
    Absent,
    /// A record existed but could not be applied
    Discarded {
        /// Why the record was rejected
        reason: PersistenceError,
    },
    /// A session was rebuilt
    Restored(Recovered),
}

impl RecoveryOutcome {
    /// Returns the recovered session, if any.
    pub fn recovered(&self) -> Option<&Recovered> {
        match self {
            RecoveryOutcome::Restored(recovered) => Some(recovered),
            _ => None,
        }
    }
}

/// Full report of a recovery attempt, including storage problems for the caller to log.
#[derive(Debug)]
pub struct RecoveryReport {
    pub outcome: RecoveryOutcome,
    /// Failure while reading the store (treated as "nothing persisted")
    pub load_error: Option<PersistenceError>,
    /// Failure while clearing the consumed record
    pub clear_error: Option<PersistenceError>,
}

/// Whole seconds from `saved_at` to `now`, never negative.
pub fn elapsed_seconds(saved_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - saved_at).num_seconds()).unwrap_or(0)
}

/// Rebuilds the session described by `snapshot` as of `now`.
///
/// Only a Running snapshot is advanced by the elapsed time; Paused and Idle
/// snapshots come back verbatim.
///
/// # Errors
///
/// Returns the validation error when the snapshot cannot be applied.
pub fn reconcile(
    snapshot: &PersistenceSnapshot,
    now: DateTime<Utc>,
) -> Result<Recovered, PersistenceError> {
    let saved = snapshot.to_session()?;
    let elapsed = elapsed_seconds(snapshot.saved_at, now);

    if !saved.is_running() {
        return Ok(Recovered {
            session: saved,
            rearm: false,
            elapsed_seconds: elapsed,
            completed_while_away: false,
        });
    }

    let session = saved.advancing(u32::try_from(elapsed).unwrap_or(u32::MAX));
    Ok(Recovered {
        session,
        rearm: session.is_running(),
        elapsed_seconds: elapsed,
        completed_while_away: session.is_completed(),
    })
}

/// Reads the stored snapshot and reconciles it without clearing the store.
///
/// Classifies load failures like [`recover`]: an unreadable store is Absent
/// with `load_error` set, a bad record is Discarded. `clear_error` is always
/// `None`.
pub async fn peek<G: PersistenceGateway>(gateway: &G, now: DateTime<Utc>) -> RecoveryReport {
    let (outcome, load_error) = match gateway.load().await {
        Ok(None) => (RecoveryOutcome::Absent, None),
        Err(err) if !err.is_bad_record() => (RecoveryOutcome::Absent, Some(err)),
        Err(reason) => (RecoveryOutcome::Discarded { reason }, None),
        Ok(Some(snapshot)) => match reconcile(&snapshot, now) {
            Ok(recovered) => (RecoveryOutcome::Restored(recovered), None),
            Err(reason) => (RecoveryOutcome::Discarded { reason }, None),
        },
    };

    RecoveryReport {
        outcome,
        load_error,
        clear_error: None,
    }
}

/// Reads, reconciles and then clears the stored snapshot.
///
/// A record that fails to decode counts as present-but-discarded and is
/// cleared as well. A store that cannot be read at all is left untouched.
pub async fn recover<G: PersistenceGateway>(gateway: &G, now: DateTime<Utc>) -> RecoveryReport {
    let outcome = match gateway.load().await {
        Ok(None) => {
            return RecoveryReport {
                outcome: RecoveryOutcome::Absent,
                load_error: None,
                clear_error: None,
            }
        }
        Err(err) if !err.is_bad_record() => {
            return RecoveryReport {
                outcome: RecoveryOutcome::Absent,
                load_error: Some(err),
                clear_error: None,
            }
        }
        Err(reason) => RecoveryOutcome::Discarded { reason },
        Ok(Some(snapshot)) => match reconcile(&snapshot, now) {
            Ok(recovered) => RecoveryOutcome::Restored(recovered),
            Err(reason) => RecoveryOutcome::Discarded { reason },
        },
    };

    RecoveryReport {
        outcome,
        load_error: None,
        clear_error: gateway.clear().await.err(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::persistence::{MemoryGateway, SCHEMA_VERSION};
    use crate::types::{Mode, SessionState};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 17, 12, 0, 0).unwrap()
    }

    fn snapshot(remaining: u32, state: SessionState, saved_ago: i64) -> PersistenceSnapshot {
        PersistenceSnapshot {
            mode_id: "work".to_string(),
            configured_seconds: 1500,
            remaining_seconds: remaining,
            state,
            started_at: Some(fixed_now() - Duration::minutes(30)),
            paused_at: (state == SessionState::Paused).then(|| fixed_now() - Duration::minutes(1)),
            saved_at: fixed_now() - Duration::seconds(saved_ago),
            schema_version: SCHEMA_VERSION,
        }
    }

    mod reconcile_tests {
        use super::*;

        #[test]
        fn test_elapsed_is_clamped_at_zero() {
            let future = fixed_now() + Duration::seconds(90);
            assert_eq!(elapsed_seconds(future, fixed_now()), 0);
            assert_eq!(elapsed_seconds(fixed_now() - Duration::milliseconds(2900), fixed_now()), 2);
        }

        #[test]
        fn test_immediate_reconcile_reproduces_session() {
            let session = Session::new(Mode::RestEyes, 120)
                .starting(fixed_now())
                .advancing(15);
            let snapshot = PersistenceSnapshot::capture(&session, fixed_now()).unwrap();

            let recovered = reconcile(&snapshot, fixed_now()).unwrap();

            assert_eq!(recovered.session, session);
            assert!(recovered.rearm);
            assert_eq!(recovered.elapsed_seconds, 0);
        }

        #[test]
        fn test_running_partial_elapsed() {
            let recovered = reconcile(&snapshot(100, SessionState::Running, 30), fixed_now()).unwrap();

            assert_eq!(recovered.session.state(), SessionState::Running);
            assert_eq!(recovered.session.remaining_seconds(), 70);
            assert!(recovered.rearm);
            assert!(!recovered.completed_while_away);
        }

        #[test]
        fn test_running_completed_while_away() {
            let recovered = reconcile(&snapshot(10, SessionState::Running, 60), fixed_now()).unwrap();

            assert_eq!(recovered.session.state(), SessionState::Completed);
            assert_eq!(recovered.session.remaining_seconds(), 0);
            assert!(!recovered.rearm);
            assert!(recovered.completed_while_away);
        }

        #[test]
        fn test_running_exactly_elapsed_completes() {
            let recovered = reconcile(&snapshot(30, SessionState::Running, 30), fixed_now()).unwrap();
            assert!(recovered.session.is_completed());
        }

        #[test]
        fn test_clock_moved_backwards() {
            let recovered =
                reconcile(&snapshot(100, SessionState::Running, -600), fixed_now()).unwrap();

            assert_eq!(recovered.session.remaining_seconds(), 100);
            assert_eq!(recovered.elapsed_seconds, 0);
            assert!(recovered.rearm);
        }

        #[test]
        fn test_paused_is_not_adjusted() {
            let recovered =
                reconcile(&snapshot(100, SessionState::Paused, 3600), fixed_now()).unwrap();

            assert_eq!(recovered.session.state(), SessionState::Paused);
            assert_eq!(recovered.session.remaining_seconds(), 100);
            assert!(!recovered.rearm);
        }

        #[test]
        fn test_invalid_snapshot_is_rejected() {
            let mut over_cap = snapshot(9999, SessionState::Running, 0);
            over_cap.configured_seconds = 9999;
            assert!(reconcile(&over_cap, fixed_now()).is_err());
        }
    }

    mod recover_tests {
        use super::*;

        #[tokio::test]
        async fn test_absent() {
            let gateway = MemoryGateway::new();

            let report = recover(&gateway, fixed_now()).await;

            assert!(matches!(report.outcome, RecoveryOutcome::Absent));
            assert_eq!(gateway.clear_call_count(), 0);
        }

        #[tokio::test]
        async fn test_restored_then_cleared() {
            let gateway = MemoryGateway::with_snapshot(&snapshot(10, SessionState::Running, 60));

            let report = recover(&gateway, fixed_now()).await;
            let recovered = report.outcome.recovered().unwrap();
            assert_eq!(recovered.session.state(), SessionState::Completed);
            assert!(report.clear_error.is_none());

            let second = recover(&gateway, fixed_now()).await;
            assert!(matches!(second.outcome, RecoveryOutcome::Absent));
        }

        #[tokio::test]
        async fn test_invalid_snapshot_is_discarded_and_cleared() {
            let mut over_cap = snapshot(9999, SessionState::Running, 0);
            over_cap.configured_seconds = 9999;
            let gateway = MemoryGateway::with_snapshot(&over_cap);

            let report = recover(&gateway, fixed_now()).await;

            assert!(matches!(report.outcome, RecoveryOutcome::Discarded { .. }));
            assert!(gateway.raw().is_none());
        }

        #[tokio::test]
        async fn test_corrupt_record_is_discarded_and_cleared() {
            let gateway = MemoryGateway::new();
            gateway.set_raw(Some("{\"modeId\": 12".to_string()));

            let report = recover(&gateway, fixed_now()).await;

            match report.outcome {
                RecoveryOutcome::Discarded { reason } => assert!(reason.is_bad_record()),
                other => panic!("expected Discarded, got {:?}", other),
            }
            assert_eq!(gateway.clear_call_count(), 1);
        }

        #[tokio::test]
        async fn test_unreadable_store_is_left_alone() {
            let gateway = MemoryGateway::with_snapshot(&snapshot(100, SessionState::Paused, 0));
            gateway.set_should_fail_load(true);

            let report = recover(&gateway, fixed_now()).await;

            assert!(matches!(report.outcome, RecoveryOutcome::Absent));
            assert!(report.load_error.is_some());
            assert_eq!(gateway.clear_call_count(), 0);
            assert!(gateway.raw().is_some());
        }

        #[tokio::test]
        async fn test_peek_does_not_clear() {
            let gateway = MemoryGateway::with_snapshot(&snapshot(100, SessionState::Running, 30));

            let report = peek(&gateway, fixed_now()).await;

            assert_eq!(report.outcome.recovered().unwrap().session.remaining_seconds(), 70);
            assert!(report.load_error.is_none());
            assert_eq!(gateway.clear_call_count(), 0);
            assert!(gateway.raw().is_some());
        }

        #[tokio::test]
        async fn test_peek_reports_unreadable_store() {
            let gateway = MemoryGateway::with_snapshot(&snapshot(100, SessionState::Paused, 0));
            gateway.set_should_fail_load(true);

            let report = peek(&gateway, fixed_now()).await;

            assert!(matches!(report.outcome, RecoveryOutcome::Absent));
            assert!(report.load_error.is_some_and(|err| err.is_io()));
            assert_eq!(gateway.clear_call_count(), 0);
        }

        #[tokio::test]
        async fn test_peek_discards_corrupt_record() {
            let gateway = MemoryGateway::new();
            gateway.set_raw(Some("not json".to_string()));

            let report = peek(&gateway, fixed_now()).await;

            assert!(matches!(report.outcome, RecoveryOutcome::Discarded { .. }));
            assert!(report.load_error.is_none());
            assert!(gateway.raw().is_some());
        }
    }
}
