//! Session state and the outcome reducer.
//!
//! One `SessionState` lives for exactly one continuous play of a module. It
//! is mutated only by [`SessionState::apply`]; pause/stop flags are toggled by
//! the host. Invariant: `trials == score + errors` at all times.

use serde::{Deserialize, Serialize};

/// How a single trial ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Correct,
    Incorrect,
    /// The response deadline elapsed with no input.
    Miss,
}

/// Per-module adaptive leveling rule.
///
/// Modules disagree on whether errors cost a level; that divergence is
/// intentional and preserved, so the rule is data, not code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LevelPolicy {
    /// Level up after every `up_every`-th correct answer. 0 disables leveling.
    pub up_every: u32,
    /// Whether an incorrect answer or a miss drops one level (floor 1).
    pub down_on_error: bool,
    pub max_level: u32,
}

impl LevelPolicy {
    pub fn new(up_every: u32, down_on_error: bool, max_level: u32) -> Self {
        Self {
            up_every,
            down_on_error,
            max_level: max_level.max(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub level: u32,
    pub score: u32,
    pub errors: u32,
    pub trials: u32,
    pub is_playing: bool,
    pub is_paused: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            level: 1,
            score: 0,
            errors: 0,
            trials: 0,
            is_playing: true,
            is_paused: false,
        }
    }

    /// Fold one trial outcome into the session. Total function, no failure.
    pub fn apply(&mut self, outcome: Outcome, policy: &LevelPolicy) {
        match outcome {
            Outcome::Correct => {
                self.score += 1;
                self.trials += 1;
                if policy.up_every > 0
                    && self.score % policy.up_every == 0
                    && self.level < policy.max_level
                {
                    self.level += 1;
                }
            }
            Outcome::Incorrect | Outcome::Miss => {
                self.errors += 1;
                self.trials += 1;
                if policy.down_on_error && self.level > 1 {
                    self.level -= 1;
                }
            }
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trials_always_equal_score_plus_errors() {
        let policy = LevelPolicy::new(3, true, 10);
        let mut s = SessionState::new();
        let outcomes = [
            Outcome::Correct,
            Outcome::Incorrect,
            Outcome::Miss,
            Outcome::Correct,
            Outcome::Correct,
            Outcome::Correct,
        ];
        for o in outcomes {
            s.apply(o, &policy);
            assert_eq!(s.trials, s.score + s.errors);
        }
        assert_eq!(s.score, 4);
        assert_eq!(s.errors, 2);
    }

    #[test]
    fn levels_up_every_nth_correct_and_caps() {
        let policy = LevelPolicy::new(2, false, 3);
        let mut s = SessionState::new();
        for _ in 0..20 {
            s.apply(Outcome::Correct, &policy);
        }
        assert_eq!(s.level, 3);
    }

    #[test]
    fn level_never_drops_below_one() {
        let policy = LevelPolicy::new(1, true, 10);
        let mut s = SessionState::new();
        s.apply(Outcome::Miss, &policy);
        s.apply(Outcome::Incorrect, &policy);
        assert_eq!(s.level, 1);

        s.apply(Outcome::Correct, &policy);
        s.apply(Outcome::Correct, &policy);
        assert_eq!(s.level, 3);
        s.apply(Outcome::Incorrect, &policy);
        assert_eq!(s.level, 2);
    }

    #[test]
    fn errors_keep_level_when_policy_says_so() {
        let policy = LevelPolicy::new(1, false, 10);
        let mut s = SessionState::new();
        s.apply(Outcome::Correct, &policy);
        s.apply(Outcome::Correct, &policy);
        s.apply(Outcome::Miss, &policy);
        assert_eq!(s.level, 3);
    }
}
