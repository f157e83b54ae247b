//! Stroop: a color word printed in a conflicting ink; answer with the ink
//! color, not the word.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "stroop";
pub const NAME: &str = "Stroop";

pub const COLORS: [&str; 6] = ["red", "green", "blue", "yellow", "purple", "orange"];

const MAX_ATTEMPTS: usize = 50;

#[derive(Debug)]
pub struct Stroop {
    prng: Prng,
}

impl Stroop {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    /// Ink different from the word. Fallback rotates one position.
    fn conflicting_ink(&mut self, word: usize) -> usize {
        for _ in 0..MAX_ATTEMPTS {
            let ink = self.prng.gen_range_usize(0, COLORS.len());
            if ink != word {
                return ink;
            }
        }
        (word + 1) % COLORS.len()
    }
}

impl Module for Stroop {
    fn id(&self) -> &'static str {
        ID
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn category(&self) -> Category {
        Category::Executive
    }

    fn level_policy(&self) -> LevelPolicy {
        LevelPolicy::new(5, false, 20)
    }

    fn timing(&self, level: u32) -> Timing {
        let deadline = 3000u32.saturating_sub(100 * (level - 1)).max(1200);
        Timing {
            delay_ms: (700, 1800),
            deadline_ms: Some(deadline),
            feedback_ms: 900,
        }
    }

    fn next_trial(&mut self, _level: u32) -> Trial {
        let word = self.prng.gen_range_usize(0, COLORS.len());
        let ink = self.conflicting_ink(word);
        Trial::new(
            Stimulus::ColorWord {
                word: COLORS[word].to_string(),
                ink: COLORS[ink].to_string(),
            },
            COLORS.iter().map(|c| c.to_string()).collect(),
            COLORS[ink],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_and_ink_always_conflict() {
        let mut m = Stroop::new(17);
        for _ in 0..200 {
            let t = m.next_trial(1);
            match &t.stimulus {
                Stimulus::ColorWord { word, ink } => {
                    assert_ne!(word, ink);
                    assert_eq!(ink, &t.answer);
                }
                other => panic!("unexpected stimulus {other:?}"),
            }
        }
    }

    #[test]
    fn deadline_tightens_with_level() {
        let m = Stroop::new(1);
        for level in 2..=30 {
            assert!(m.timing(level).deadline_ms.unwrap() <= m.timing(level - 1).deadline_ms.unwrap());
        }
        assert_eq!(m.timing(30).deadline_ms, Some(1200));
    }
}
