//! N-back: does the current letter match the one shown N items ago? The
//! module is stateful across trials within a session; the letter history is
//! the task.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "n_back";
pub const NAME: &str = "N-back";

pub const LETTERS: [&str; 8] = ["B", "F", "K", "H", "M", "Q", "R", "X"];

/// Fraction of trials that are planted matches once history allows them.
const MATCH_PROBABILITY: f32 = 0.35;

const MAX_ATTEMPTS: usize = 50;

#[derive(Debug)]
pub struct NBack {
    prng: Prng,
    history: Vec<usize>,
}

impl NBack {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
            history: Vec::new(),
        }
    }

    /// 1-back through 3-back, stepping every 5 levels.
    pub fn n(level: u32) -> u32 {
        (1 + (level - 1) / 5).min(3)
    }

    /// A letter different from the n-back target. Fallback rotates one
    /// position, which always differs.
    fn non_matching(&mut self, target: usize) -> usize {
        for _ in 0..MAX_ATTEMPTS {
            let i = self.prng.gen_range_usize(0, LETTERS.len());
            if i != target {
                return i;
            }
        }
        (target + 1) % LETTERS.len()
    }
}

impl Module for NBack {
    fn id(&self) -> &'static str {
        ID
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn category(&self) -> Category {
        Category::WorkingMemory
    }

    fn level_policy(&self) -> LevelPolicy {
        LevelPolicy::new(5, true, 15)
    }

    fn timing(&self, level: u32) -> Timing {
        let deadline = 2500u32.saturating_sub(50 * (level - 1)).max(1200);
        Timing {
            delay_ms: (800, 1600),
            deadline_ms: Some(deadline),
            feedback_ms: 700,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        let n = Self::n(level) as usize;

        let (letter_idx, is_match) = if self.history.len() < n {
            // No target yet; the only correct judgement is "no match".
            (self.prng.gen_range_usize(0, LETTERS.len()), false)
        } else {
            let target = self.history[self.history.len() - n];
            if self.prng.chance(MATCH_PROBABILITY) {
                (target, true)
            } else {
                (self.non_matching(target), false)
            }
        };

        self.history.push(letter_idx);

        Trial::new(
            Stimulus::Letter {
                letter: LETTERS[letter_idx].to_string(),
                n: n as u32,
            },
            vec!["match".to_string(), "no-match".to_string()],
            if is_match { "match" } else { "no-match" },
        )
    }
}
