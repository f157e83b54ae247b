//! Go/no-go: press on the go cue, withhold on the no-go cue. Letting the
//! deadline pass on a no-go trial is the correct response, so those trials
//! carry `timeout_correct`.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "go_no_go";
pub const NAME: &str = "Go / no-go";

const GO_SYMBOL: &str = "●";
const NO_GO_SYMBOL: &str = "✕";

/// Go cues dominate so that withholding takes real inhibition.
const GO_PROBABILITY: f32 = 0.7;

#[derive(Debug)]
pub struct GoNoGo {
    prng: Prng,
}

impl GoNoGo {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    pub fn deadline_ms(level: u32) -> u32 {
        1500u32.saturating_sub(40 * (level - 1)).max(600)
    }
}

impl Module for GoNoGo {
    fn id(&self) -> &'static str {
        ID
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn category(&self) -> Category {
        Category::Attention
    }

    fn level_policy(&self) -> LevelPolicy {
        LevelPolicy::new(5, false, 20)
    }

    fn timing(&self, level: u32) -> Timing {
        Timing {
            delay_ms: (900, 2600),
            deadline_ms: Some(Self::deadline_ms(level)),
            feedback_ms: 800,
        }
    }

    fn next_trial(&mut self, _level: u32) -> Trial {
        let go = self.prng.chance(GO_PROBABILITY);
        let symbol = if go { GO_SYMBOL } else { NO_GO_SYMBOL };
        let mut trial = Trial::new(
            Stimulus::Cue {
                go,
                symbol: symbol.to_string(),
            },
            vec!["press".to_string()],
            if go { "press" } else { "" },
        );
        trial.timeout_correct = !go;
        trial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_go_trials_reward_the_timeout() {
        let mut m = GoNoGo::new(23);
        let mut saw_go = false;
        let mut saw_no_go = false;
        for _ in 0..300 {
            let t = m.next_trial(1);
            match &t.stimulus {
                Stimulus::Cue { go: true, .. } => {
                    saw_go = true;
                    assert_eq!(t.answer, "press");
                    assert!(!t.timeout_correct);
                }
                Stimulus::Cue { go: false, .. } => {
                    saw_no_go = true;
                    assert!(t.answer.is_empty());
                    assert!(t.timeout_correct);
                }
                other => panic!("unexpected stimulus {other:?}"),
            }
        }
        assert!(saw_go && saw_no_go);
    }

    #[test]
    fn deadline_is_monotonic_with_floor() {
        for level in 2..=40 {
            assert!(GoNoGo::deadline_ms(level) <= GoNoGo::deadline_ms(level - 1));
        }
        assert_eq!(GoNoGo::deadline_ms(40), 600);
    }
}
