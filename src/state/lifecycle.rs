//! Contest lifecycle state machine.
//!
//! Transitions are validated with [`ContestEntity::plan`] and then applied with
//! [`ContestEntity::apply`], which performs the timing bookkeeping
//! (end time extension on resume, frozen snapshot handling).

use std::{
    fmt,
    time::{Duration, SystemTime},
};

use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::dao::models::{ContestEntity, ContestStatus, StandingEntity};

/// Administrative actions that move the contest between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Start,
    Pause,
    Resume,
    Freeze,
    Unfreeze,
    End,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleAction::Start => "start",
            LifecycleAction::Pause => "pause",
            LifecycleAction::Resume => "resume",
            LifecycleAction::Freeze => "freeze",
            LifecycleAction::Unfreeze => "unfreeze",
            LifecycleAction::End => "end",
        };
        f.write_str(name)
    }
}

/// Fully resolved transition input, produced once the action has been planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContestEvent {
    /// Start the contest for the given duration.
    Start { duration: Duration },
    Pause,
    Resume,
    /// Freeze the public leaderboard with the standings captured at this instant.
    Freeze { standings: Vec<StandingEntity> },
    Unfreeze,
    End,
}

impl ContestEvent {
    pub fn action(&self) -> LifecycleAction {
        match self {
            ContestEvent::Start { .. } => LifecycleAction::Start,
            ContestEvent::Pause => LifecycleAction::Pause,
            ContestEvent::Resume => LifecycleAction::Resume,
            ContestEvent::Freeze { .. } => LifecycleAction::Freeze,
            ContestEvent::Unfreeze => LifecycleAction::Unfreeze,
            ContestEvent::End => LifecycleAction::End,
        }
    }
}

/// Error returned when an action is not allowed from the current status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: cannot {action} while the contest is {from:?}")]
pub struct InvalidTransition {
    /// Status the contest was in when the action was requested.
    pub from: ContestStatus,
    /// The rejected action.
    pub action: LifecycleAction,
}

/// Errors raised while planning or applying a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// The computed end time does not fit in the platform clock.
    #[error("contest duration is out of range")]
    DurationOutOfRange,
}

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub from: ContestStatus,
    pub to: ContestStatus,
    pub action: LifecycleAction,
}

/// Convert a (possibly fractional) number of hours into a whole-second duration.
///
/// Returns `None` for non-finite, non-positive or unrepresentable values.
pub fn duration_from_hours(hours: f64) -> Option<Duration> {
    if !hours.is_finite() || hours <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64((hours * 3600.0).round())
        .ok()
        .filter(|duration| !duration.is_zero())
}

/// Round an elapsed duration to whole seconds, halves rounding up.
fn round_to_secs(elapsed: Duration) -> u64 {
    let millis = elapsed.as_millis();
    u64::try_from((millis + 500) / 1000).unwrap_or(u64::MAX)
}

impl ContestEntity {
    /// Validate `action` against the current status and compute the target status.
    pub fn plan(&self, action: LifecycleAction) -> Result<Plan, InvalidTransition> {
        use ContestStatus::*;

        let invalid = || InvalidTransition {
            from: self.status,
            action,
        };

        let to = match (self.status, action) {
            (Pending, LifecycleAction::Start) => Running,
            (Running | Frozen, LifecycleAction::Pause) => Paused,
            (Paused, LifecycleAction::Resume) if self.paused_time.is_some() => {
                self.status_before_pause.unwrap_or(Running)
            }
            (Running, LifecycleAction::Freeze) => Frozen,
            (Frozen, LifecycleAction::Unfreeze) => Running,
            (Running | Paused | Frozen, LifecycleAction::End) => Finished,
            _ => return Err(invalid()),
        };

        Ok(Plan {
            from: self.status,
            to,
            action,
        })
    }

    /// Apply `event` at instant `now`, returning the executed plan.
    ///
    /// The event is re-validated against the current status, so a stale event
    /// never corrupts the record.
    pub fn apply(&mut self, event: ContestEvent, now: SystemTime) -> Result<Plan, LifecycleError> {
        let plan = self.plan(event.action())?;

        match event {
            ContestEvent::Start { duration } => {
                let end = now
                    .checked_add(duration)
                    .ok_or(LifecycleError::DurationOutOfRange)?;
                self.start_time = Some(now);
                self.end_time = Some(end);
                self.paused_time = None;
                self.total_paused_duration = 0;
                self.status_before_pause = None;
            }
            ContestEvent::Pause => {
                self.status_before_pause = Some(self.status);
                self.paused_time = Some(now);
            }
            ContestEvent::Resume => {
                let paused_at = self.paused_time.unwrap_or(now);
                let elapsed = round_to_secs(now.duration_since(paused_at).unwrap_or_default());
                let shift = Duration::from_secs(elapsed);
                self.end_time = match self.end_time {
                    Some(end) => Some(
                        end.checked_add(shift)
                            .ok_or(LifecycleError::DurationOutOfRange)?,
                    ),
                    None => None,
                };
                self.total_paused_duration = self.total_paused_duration.saturating_add(elapsed);
                self.status_before_pause = None;
                self.paused_time = None;
            }
            ContestEvent::Freeze { standings } => {
                self.frozen_leaderboard = Some(standings);
            }
            ContestEvent::Unfreeze => {
                self.frozen_leaderboard = None;
            }
            ContestEvent::End => {
                self.end_time = Some(now);
                self.status_before_pause = None;
                self.paused_time = None;
            }
        }

        self.status = plan.to;
        self.updated_at = now;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);
    const MINUTE: Duration = Duration::from_secs(60);

    fn t0() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn started(duration: Duration) -> ContestEntity {
        let mut contest = ContestEntity::pending();
        contest
            .apply(ContestEvent::Start { duration }, t0())
            .unwrap();
        contest
    }

    fn standing(name: &str, score: i32) -> StandingEntity {
        StandingEntity {
            account_id: Uuid::new_v4(),
            username: name.into(),
            team_id: Uuid::new_v4(),
            team_name: format!("team-{name}"),
            score,
        }
    }

    #[test]
    fn start_sets_timing_from_pending() {
        let contest = started(2 * HOUR);
        assert_eq!(contest.status, ContestStatus::Running);
        assert_eq!(contest.start_time, Some(t0()));
        assert_eq!(contest.end_time, Some(t0() + 2 * HOUR));
        assert_eq!(contest.total_paused_duration, 0);
        assert_eq!(contest.paused_time, None);
    }

    #[test]
    fn start_is_rejected_outside_pending() {
        let mut running = started(HOUR);
        let mut paused = running.clone();
        paused.apply(ContestEvent::Pause, t0()).unwrap();
        let mut frozen = running.clone();
        frozen
            .apply(ContestEvent::Freeze { standings: vec![] }, t0())
            .unwrap();
        let mut finished = running.clone();
        finished.apply(ContestEvent::End, t0()).unwrap();

        for contest in [&mut running, &mut paused, &mut frozen, &mut finished] {
            let before = contest.clone();
            let err = contest
                .apply(ContestEvent::Start { duration: HOUR }, t0() + HOUR)
                .unwrap_err();
            assert_eq!(
                err,
                LifecycleError::InvalidTransition(InvalidTransition {
                    from: before.status,
                    action: LifecycleAction::Start,
                })
            );
            assert_eq!(*contest, before);
        }
    }

    #[test]
    fn pause_and_resume_shift_end_time_by_whole_seconds() {
        let mut contest = started(2 * HOUR);

        contest.apply(ContestEvent::Pause, t0() + 30 * MINUTE).unwrap();
        assert_eq!(contest.status, ContestStatus::Paused);
        assert_eq!(contest.status_before_pause, Some(ContestStatus::Running));
        assert_eq!(contest.paused_time, Some(t0() + 30 * MINUTE));

        contest.apply(ContestEvent::Resume, t0() + 45 * MINUTE).unwrap();
        assert_eq!(contest.status, ContestStatus::Running);
        assert_eq!(contest.end_time, Some(t0() + 2 * HOUR + 15 * MINUTE));
        assert_eq!(contest.total_paused_duration, 900);
        assert_eq!(contest.paused_time, None);
        assert_eq!(contest.status_before_pause, None);
    }

    #[test]
    fn resume_rounds_sub_second_pauses() {
        let mut contest = started(HOUR);
        contest.apply(ContestEvent::Pause, t0()).unwrap();
        contest
            .apply(ContestEvent::Resume, t0() + Duration::from_millis(2_500))
            .unwrap();
        assert_eq!(contest.total_paused_duration, 3);
        assert_eq!(contest.end_time, Some(t0() + HOUR + Duration::from_secs(3)));
    }

    #[test]
    fn resume_returns_to_frozen_when_paused_while_frozen() {
        let mut contest = started(HOUR);
        let snapshot = vec![standing("alice", 10)];
        contest
            .apply(
                ContestEvent::Freeze {
                    standings: snapshot.clone(),
                },
                t0(),
            )
            .unwrap();
        contest.apply(ContestEvent::Pause, t0() + MINUTE).unwrap();
        contest.apply(ContestEvent::Resume, t0() + 2 * MINUTE).unwrap();

        assert_eq!(contest.status, ContestStatus::Frozen);
        assert_eq!(contest.frozen_leaderboard, Some(snapshot));
    }

    #[test]
    fn resume_without_pause_time_is_rejected() {
        let mut contest = started(HOUR);
        contest.apply(ContestEvent::Pause, t0()).unwrap();
        contest.paused_time = None;
        let err = contest.plan(LifecycleAction::Resume).unwrap_err();
        assert_eq!(err.from, ContestStatus::Paused);
    }

    #[test]
    fn freeze_and_unfreeze_manage_snapshot() {
        let mut contest = started(HOUR);
        contest
            .apply(
                ContestEvent::Freeze {
                    standings: vec![standing("bob", 5)],
                },
                t0(),
            )
            .unwrap();
        assert_eq!(contest.status, ContestStatus::Frozen);
        assert!(contest.frozen_leaderboard.is_some());

        // Freezing twice is not allowed.
        assert!(contest.plan(LifecycleAction::Freeze).is_err());

        contest.apply(ContestEvent::Unfreeze, t0()).unwrap();
        assert_eq!(contest.status, ContestStatus::Running);
        assert_eq!(contest.frozen_leaderboard, None);
    }

    #[test]
    fn end_is_allowed_from_active_states_only() {
        let pending = ContestEntity::pending();
        assert!(pending.plan(LifecycleAction::End).is_err());

        let mut paused = started(HOUR);
        paused.apply(ContestEvent::Pause, t0()).unwrap();
        paused.apply(ContestEvent::End, t0() + MINUTE).unwrap();
        assert_eq!(paused.status, ContestStatus::Finished);
        assert_eq!(paused.end_time, Some(t0() + MINUTE));
        assert_eq!(paused.paused_time, None);
        assert_eq!(paused.status_before_pause, None);

        let err = paused.plan(LifecycleAction::End).unwrap_err();
        assert_eq!(err.from, ContestStatus::Finished);
    }

    #[test]
    fn finished_is_terminal() {
        let mut contest = started(HOUR);
        contest.apply(ContestEvent::End, t0()).unwrap();
        for action in [
            LifecycleAction::Start,
            LifecycleAction::Pause,
            LifecycleAction::Resume,
            LifecycleAction::Freeze,
            LifecycleAction::Unfreeze,
            LifecycleAction::End,
        ] {
            assert!(contest.plan(action).is_err(), "{action} should be rejected");
        }
    }

    #[test]
    fn duration_from_hours_rounds_to_seconds() {
        assert_eq!(duration_from_hours(2.0), Some(2 * HOUR));
        assert_eq!(duration_from_hours(0.25), Some(15 * MINUTE));
        assert_eq!(
            duration_from_hours(1.0 / 7.0),
            Some(Duration::from_secs(514))
        );
        assert_eq!(duration_from_hours(0.0), None);
        assert_eq!(duration_from_hours(-1.0), None);
        assert_eq!(duration_from_hours(f64::NAN), None);
        assert_eq!(duration_from_hours(f64::INFINITY), None);
    }
}
