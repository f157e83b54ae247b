//! Trial scheduler state machine.
//!
//! One trial walks `Waiting -> Presented -> Feedback`, resolved either by the
//! user's input or by the response deadline. The machine owns no timers: it
//! hands the host a [`TimerCmd`] to arm, and every delayed event comes back
//! stamped with the token that was current when the timer was armed. Bumping
//! the token (pause, stop, starting over) invalidates every timer still in
//! flight, so there is no per-timer cancellation bookkeeping and a callback
//! that fires after teardown is inert.
//!
//! Exactly one outcome is committed per trial: `respond` and `on_expire` race
//! through the same `responded` latch and the loser is a no-op.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// No stimulus shown; a `Present` timer is pending.
    Waiting,
    /// Stimulus visible; waiting for input or the deadline.
    Presented,
    /// Outcome committed; short pause before the next trial.
    Feedback,
    Paused,
    Stopped,
}

/// A delayed transition the host must arm. The token must be carried back
/// verbatim into the matching event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCmd {
    Present { after: Duration, token: u64 },
    Expire { after: Duration, token: u64 },
    Next { after: Duration, token: u64 },
}

impl TimerCmd {
    pub fn after(&self) -> Duration {
        match *self {
            TimerCmd::Present { after, .. }
            | TimerCmd::Expire { after, .. }
            | TimerCmd::Next { after, .. } => after,
        }
    }
}

#[derive(Debug)]
pub struct TrialSchedule {
    phase: Phase,
    token: u64,
    responded: bool,
}

impl TrialSchedule {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            token: 0,
            responded: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    fn bump(&mut self) -> u64 {
        self.token += 1;
        self.token
    }

    /// Enter `Waiting` for a fresh trial. Invalidates anything in flight.
    pub fn begin(&mut self, delay: Duration) -> Option<TimerCmd> {
        if self.phase == Phase::Stopped {
            return None;
        }
        let token = self.bump();
        self.phase = Phase::Waiting;
        self.responded = false;
        Some(TimerCmd::Present {
            after: delay,
            token,
        })
    }

    /// The `Present` timer fired. Returns false when the event is stale.
    pub fn on_present(&mut self, token: u64) -> bool {
        if token != self.token || self.phase != Phase::Waiting {
            return false;
        }
        self.phase = Phase::Presented;
        self.responded = false;
        true
    }

    /// Arm the response deadline for the just-presented trial.
    pub fn arm_expire(&self, deadline: Duration) -> TimerCmd {
        TimerCmd::Expire {
            after: deadline,
            token: self.token,
        }
    }

    /// User input arrived. True exactly when this input commits the outcome.
    pub fn respond(&mut self) -> bool {
        if self.phase != Phase::Presented || self.responded {
            return false;
        }
        self.responded = true;
        true
    }

    /// The deadline fired. True exactly when the timeout commits the outcome.
    pub fn on_expire(&mut self, token: u64) -> bool {
        if token != self.token || self.phase != Phase::Presented || self.responded {
            return false;
        }
        self.responded = true;
        true
    }

    /// After an outcome committed: hold the feedback pause, then `Next` fires.
    pub fn enter_feedback(&mut self, pause: Duration) -> Option<TimerCmd> {
        if self.phase != Phase::Presented || !self.responded {
            return None;
        }
        self.phase = Phase::Feedback;
        Some(TimerCmd::Next {
            after: pause,
            token: self.token,
        })
    }

    /// The feedback pause elapsed; the caller follows up with `begin`.
    pub fn on_next(&mut self, token: u64) -> bool {
        token == self.token && self.phase == Phase::Feedback
    }

    /// Cancel everything in flight. No new timers are armed while paused.
    pub fn pause(&mut self) {
        if self.phase == Phase::Stopped {
            return;
        }
        self.bump();
        self.phase = Phase::Paused;
    }

    /// Restart scheduling from a clean `Waiting`, never a stale deadline.
    pub fn resume(&mut self, delay: Duration) -> Option<TimerCmd> {
        if self.phase != Phase::Paused {
            return None;
        }
        self.begin(delay)
    }

    /// Terminal. Every pending timer becomes stale before teardown.
    pub fn stop(&mut self) {
        self.bump();
        self.phase = Phase::Stopped;
    }
}

impl Default for TrialSchedule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: Duration = Duration::from_millis(100);

    fn presented() -> (TrialSchedule, u64) {
        let mut s = TrialSchedule::new();
        let cmd = s.begin(D).unwrap();
        let token = match cmd {
            TimerCmd::Present { token, .. } => token,
            other => panic!("expected Present, got {other:?}"),
        };
        assert!(s.on_present(token));
        (s, token)
    }

    #[test]
    fn walks_waiting_presented_feedback() {
        let (mut s, token) = presented();
        assert_eq!(s.phase(), Phase::Presented);
        assert!(s.respond());
        let next = s.enter_feedback(D).unwrap();
        match next {
            TimerCmd::Next { token: t, .. } => assert!(s.on_next(t)),
            other => panic!("expected Next, got {other:?}"),
        }
        assert!(s.begin(D).is_some());
        let _ = token;
    }

    #[test]
    fn exactly_one_outcome_response_first() {
        let (mut s, token) = presented();
        assert!(s.respond());
        // Deadline fires 1ms later: must be a no-op.
        assert!(!s.on_expire(token));
    }

    #[test]
    fn exactly_one_outcome_timeout_first() {
        let (mut s, token) = presented();
        assert!(s.on_expire(token));
        // Late user action on the already-resolved trial is ignored.
        assert!(!s.respond());
    }

    #[test]
    fn pause_invalidates_pending_present() {
        let mut s = TrialSchedule::new();
        let cmd = s.begin(D).unwrap();
        let stale = match cmd {
            TimerCmd::Present { token, .. } => token,
            _ => unreachable!(),
        };
        s.pause();
        // The timer armed before the pause fires anyway: it must be inert.
        assert!(!s.on_present(stale));

        let resumed = s.resume(D).unwrap();
        let fresh = match resumed {
            TimerCmd::Present { token, .. } => token,
            _ => unreachable!(),
        };
        // Only the fresh trial presents; no double stimulus, no double count.
        assert!(!s.on_present(stale));
        assert!(s.on_present(fresh));
        assert!(s.respond());
        assert!(!s.on_expire(stale));
    }

    #[test]
    fn resume_does_not_reuse_a_stale_deadline() {
        let (mut s, token) = presented();
        let expire = s.arm_expire(D);
        s.pause();
        let resumed = s.resume(D).unwrap();
        match expire {
            TimerCmd::Expire { token: t, .. } => assert!(!s.on_expire(t)),
            _ => unreachable!(),
        }
        match resumed {
            TimerCmd::Present { token: t, .. } => assert!(s.on_present(t)),
            _ => unreachable!(),
        }
        let _ = token;
    }

    #[test]
    fn stop_makes_everything_inert() {
        let (mut s, token) = presented();
        let expire = s.arm_expire(D);
        s.stop();
        assert!(!s.respond());
        assert!(!s.on_present(token));
        match expire {
            TimerCmd::Expire { token: t, .. } => assert!(!s.on_expire(t)),
            _ => unreachable!(),
        }
        assert!(s.begin(D).is_none());
        assert!(s.resume(D).is_none());
    }
}
