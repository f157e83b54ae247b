//! Simple reaction time: a spot appears left or right, press the matching
//! key before the deadline. Difficulty is speed only: the deadline tightens
//! as the level climbs.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "reaction";
pub const NAME: &str = "Reaction time";

#[derive(Debug)]
pub struct Reaction {
    prng: Prng,
}

impl Reaction {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    /// Monotonic non-increasing; floor 450ms.
    pub fn deadline_ms(level: u32) -> u32 {
        1500u32.saturating_sub(50 * (level - 1)).max(450)
    }
}

impl Module for Reaction {
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
        LevelPolicy::new(3, false, 20)
    }

    fn timing(&self, level: u32) -> Timing {
        Timing {
            delay_ms: (1000, 3500),
            deadline_ms: Some(Self::deadline_ms(level)),
            feedback_ms: 1000,
        }
    }

    fn next_trial(&mut self, _level: u32) -> Trial {
        let side = *self.prng.pick(&["left", "right"]);
        Trial::new(
            Stimulus::Spot {
                side: side.to_string(),
                eccentricity: 0,
            },
            vec!["left".to_string(), "right".to_string()],
            side,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_shrinks_monotonically_with_floor() {
        for level in 2..=40 {
            assert!(Reaction::deadline_ms(level) <= Reaction::deadline_ms(level - 1));
        }
        assert_eq!(Reaction::deadline_ms(40), 450);
    }

    #[test]
    fn answer_matches_spot_side() {
        let mut m = Reaction::new(3);
        for _ in 0..50 {
            let t = m.next_trial(1);
            match &t.stimulus {
                Stimulus::Spot { side, .. } => assert_eq!(side, &t.answer),
                other => panic!("unexpected stimulus {other:?}"),
            }
            assert!(t.options.contains(&t.answer));
        }
    }
}
