//! One live training session: a module plugged into the generic engine.
//!
//! The daemon owns the timers; this type owns everything else. Every method
//! that can advance the trial returns at most one `TimerCmd` for the daemon
//! to arm, and every timer-driven entry point takes the token the command
//! carried, so late callbacks die at the schedule's token check.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use neurotrain::prng::Prng;
use neurotrain::report::{finish, SessionDraft};
use neurotrain::schedule::{Phase, TimerCmd, TrialSchedule};
use neurotrain::session::{LevelPolicy, Outcome, SessionState};
use neurotrain::stats::SessionStats;
use neurotrain_modules::{Module, Stimulus, Trial};

/// What clients see of the current trial. The answer stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialView {
    pub stimulus: Stimulus,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user_id: String,
    pub module_id: String,
    pub phase: String,
    pub state: SessionState,
    pub trial: Option<TrialView>,
    pub last_outcome: Option<Outcome>,
    /// Session-wide correct rate, 0.0 before the first scored trial.
    pub accuracy: f32,
    /// Correct rate over the bounded recent-outcome window.
    pub recent_rate: f32,
    pub elapsed_seconds: u32,
}

pub struct ActiveSession {
    pub user_id: String,
    /// Host-assigned, unique per started session. Timer chains carry it so
    /// a chain armed for a discarded session never reaches its replacement;
    /// schedule tokens alone restart at 1 for every session and would alias.
    pub generation: u64,
    module: Box<dyn Module>,
    policy: LevelPolicy,
    pub state: SessionState,
    schedule: TrialSchedule,
    trial: Option<Trial>,
    presented_at: Option<Instant>,
    stats: SessionStats,
    started_at: Instant,
    prng: Prng,
    last_outcome: Option<Outcome>,
}

impl ActiveSession {
    /// Returns the session and the first timer to arm.
    pub fn start(
        user_id: String,
        module: Box<dyn Module>,
        seed: u64,
        generation: u64,
    ) -> (Self, TimerCmd) {
        let policy = module.level_policy();
        let mut session = Self {
            user_id,
            generation,
            module,
            policy,
            state: SessionState::new(),
            schedule: TrialSchedule::new(),
            trial: None,
            presented_at: None,
            stats: SessionStats::new(),
            started_at: Instant::now(),
            prng: Prng::new(seed),
            last_outcome: None,
        };
        let delay = session.sample_delay();
        let cmd = session
            .schedule
            .begin(delay)
            .expect("fresh schedule cannot be stopped");
        (session, cmd)
    }

    pub fn module_id(&self) -> &'static str {
        self.module.id()
    }

    fn sample_delay(&mut self) -> Duration {
        let (lo, hi) = self.module.timing(self.state.level).delay_ms;
        let ms = self.prng.gen_range_u32(lo, hi.max(lo) + 1);
        Duration::from_millis(ms as u64)
    }

    /// `Present` timer fired: generate and show the trial for the current
    /// level, and arm the deadline when the module has one.
    pub fn on_present(&mut self, token: u64) -> Option<TimerCmd> {
        if !self.schedule.on_present(token) {
            return None;
        }
        let timing = self.module.timing(self.state.level);
        self.trial = Some(self.module.next_trial(self.state.level));
        self.presented_at = Some(Instant::now());
        timing
            .deadline_ms
            .map(|ms| self.schedule.arm_expire(Duration::from_millis(ms as u64)))
    }

    /// User action. Ignored unless a trial is presented and unresolved.
    pub fn input(&mut self, action: &str) -> Option<TimerCmd> {
        if !self.schedule.respond() {
            return None;
        }
        let trial = self.trial.as_ref()?;
        let is_correct = action == trial.answer;
        let reaction_ms = self
            .presented_at
            .map(|t| t.elapsed().as_millis().min(u32::MAX as u128) as u32);

        let outcome = if is_correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        };
        self.commit(outcome, reaction_ms)
    }

    /// Deadline fired with no input. A miss, unless the trial rewards the
    /// withheld response (no-go).
    pub fn on_expire(&mut self, token: u64) -> Option<TimerCmd> {
        if !self.schedule.on_expire(token) {
            return None;
        }
        let outcome = match &self.trial {
            Some(t) if t.timeout_correct => Outcome::Correct,
            _ => Outcome::Miss,
        };
        self.commit(outcome, None)
    }

    fn commit(&mut self, outcome: Outcome, reaction_ms: Option<u32>) -> Option<TimerCmd> {
        self.state.apply(outcome, &self.policy);
        self.stats
            .record(outcome == Outcome::Correct, reaction_ms);
        self.last_outcome = Some(outcome);
        let feedback = self.module.timing(self.state.level).feedback_ms;
        self.schedule
            .enter_feedback(Duration::from_millis(feedback as u64))
    }

    /// Feedback pause elapsed: clear the old trial and wait for the next.
    pub fn on_next(&mut self, token: u64) -> Option<TimerCmd> {
        if !self.schedule.on_next(token) {
            return None;
        }
        self.trial = None;
        self.presented_at = None;
        let delay = self.sample_delay();
        self.schedule.begin(delay)
    }

    pub fn pause(&mut self) {
        if self.state.is_paused {
            return;
        }
        self.schedule.pause();
        self.state.is_paused = true;
        self.trial = None;
        self.presented_at = None;
    }

    pub fn resume(&mut self) -> Option<TimerCmd> {
        if !self.state.is_paused {
            return None;
        }
        self.state.is_paused = false;
        let delay = self.sample_delay();
        self.schedule.resume(delay)
    }

    /// End the session. Every pending timer is stale from here on.
    pub fn stop(&mut self) -> SessionDraft {
        self.schedule.stop();
        self.state.is_playing = false;
        finish(&self.state, &self.stats.reaction_ms)
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.started_at.elapsed().as_secs().min(u32::MAX as u64) as u32
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let phase = match self.schedule.phase() {
            Phase::Idle => "idle",
            Phase::Waiting => "waiting",
            Phase::Presented => "presented",
            Phase::Feedback => "feedback",
            Phase::Paused => "paused",
            Phase::Stopped => "stopped",
        };
        SessionSnapshot {
            user_id: self.user_id.clone(),
            module_id: self.module.id().to_string(),
            phase: phase.to_string(),
            state: self.state.clone(),
            trial: self.trial.as_ref().map(|t| TrialView {
                stimulus: t.stimulus.clone(),
                options: t.options.clone(),
            }),
            last_outcome: self.last_outcome,
            accuracy: self.stats.accuracy(),
            recent_rate: self.stats.recent_rate(),
            elapsed_seconds: self.elapsed_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurotrain::schedule::TimerCmd;

    fn start() -> (ActiveSession, u64) {
        let module = neurotrain_modules::create("reaction", 42).unwrap();
        let (session, cmd) = ActiveSession::start("u1".to_string(), module, 7, 1);
        let token = match cmd {
            TimerCmd::Present { token, .. } => token,
            other => panic!("expected Present, got {other:?}"),
        };
        (session, token)
    }

    fn answer_of(s: &ActiveSession) -> String {
        s.trial.as_ref().unwrap().answer.clone()
    }

    #[test]
    fn full_trial_round_trip_updates_state() {
        let (mut s, token) = start();
        let expire = s.on_present(token).unwrap();
        let answer = answer_of(&s);

        let next = s.input(&answer).expect("commit yields feedback timer");
        assert_eq!(s.state.score, 1);
        assert_eq!(s.state.trials, 1);
        assert_eq!(s.last_outcome, Some(Outcome::Correct));

        // The old deadline is now stale.
        if let TimerCmd::Expire { token: t, .. } = expire {
            assert!(s.on_expire(t).is_none());
        }
        assert_eq!(s.state.trials, 1);

        // Feedback elapses, a fresh trial is armed.
        if let TimerCmd::Next { token: t, .. } = next {
            assert!(s.on_next(t).is_some());
        } else {
            panic!("expected Next");
        }
        assert!(s.snapshot().trial.is_none());
    }

    #[test]
    fn snapshot_tracks_live_accuracy() {
        let (mut s, token) = start();
        assert_eq!(s.snapshot().accuracy, 0.0);
        let _ = s.on_present(token);
        let answer = answer_of(&s);
        let _ = s.input(&answer);
        let snap = s.snapshot();
        assert_eq!(snap.accuracy, 1.0);
        assert_eq!(snap.recent_rate, 1.0);
    }

    #[test]
    fn timeout_counts_exactly_one_miss() {
        let (mut s, token) = start();
        let expire = s.on_present(token).unwrap();
        let answer = answer_of(&s);
        let t = match expire {
            TimerCmd::Expire { token, .. } => token,
            other => panic!("expected Expire, got {other:?}"),
        };
        assert!(s.on_expire(t).is_some());
        assert_eq!(s.state.errors, 1);
        // The late user action changes nothing.
        assert!(s.input(&answer).is_none());
        assert_eq!(s.state.trials, 1);
        assert_eq!(s.state.score, 0);
    }

    #[test]
    fn pause_discards_trial_and_resume_rearms() {
        let (mut s, token) = start();
        let expire = s.on_present(token).unwrap();
        s.pause();
        assert!(s.state.is_paused);
        assert!(s.snapshot().trial.is_none());
        if let TimerCmd::Expire { token: t, .. } = expire {
            assert!(s.on_expire(t).is_none());
        }
        assert_eq!(s.state.trials, 0);

        let resumed = s.resume().expect("resume arms a fresh present");
        match resumed {
            TimerCmd::Present { token: t, .. } => {
                assert!(s.on_present(t).is_some());
                assert_eq!(s.snapshot().phase, "presented");
            }
            other => panic!("expected Present, got {other:?}"),
        }
        // Double-resume is a no-op.
        assert!(s.resume().is_none());
    }

    #[test]
    fn stop_drafts_once_and_deadens_timers() {
        let (mut s, token) = start();
        let expire = s.on_present(token).unwrap();
        let answer = answer_of(&s);
        let _ = s.input(&answer);
        let draft = s.stop();
        assert_eq!(draft.correct_count, 1);
        assert_eq!(draft.total_trials, 1);
        if let TimerCmd::Expire { token: t, .. } = expire {
            assert!(s.on_expire(t).is_none());
        }
        assert!(!s.state.is_playing);
    }

    #[test]
    fn no_go_timeout_scores_correct() {
        let module = neurotrain_modules::create("go_no_go", 1).unwrap();
        let (mut s, cmd) = ActiveSession::start("u1".to_string(), module, 5, 1);
        let mut token = match cmd {
            TimerCmd::Present { token, .. } => token,
            _ => unreachable!(),
        };
        // Walk trials until a no-go shows up, timing each one out.
        for _ in 0..100 {
            let expire = s.on_present(token).expect("go_no_go has a deadline");
            let timeout_correct = s.trial.as_ref().unwrap().timeout_correct;
            let et = match expire {
                TimerCmd::Expire { token, .. } => token,
                _ => unreachable!(),
            };
            let score_before = s.state.score;
            let next = s.on_expire(et).unwrap();
            if timeout_correct {
                assert_eq!(s.state.score, score_before + 1);
                return;
            }
            let nt = match next {
                TimerCmd::Next { token, .. } => token,
                _ => unreachable!(),
            };
            token = match s.on_next(nt).unwrap() {
                TimerCmd::Present { token, .. } => token,
                _ => unreachable!(),
            };
        }
        panic!("no no-go trial in 100 draws");
    }
}
