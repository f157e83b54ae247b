//! Sequence recall: a sequence of cells lights up on a 3x3 grid; repeat it by
//! tapping the cells in order. Self-paced; the client submits the taps as one
//! dash-joined action, e.g. `"0-4-7"`.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "sequence_recall";
pub const NAME: &str = "Sequence recall";

const GRID: u32 = 3;
const MAX_ATTEMPTS: usize = 100;

#[derive(Debug)]
pub struct SequenceRecall {
    prng: Prng,
}

impl SequenceRecall {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    /// Sequence length 2..=10, one step every other level.
    pub fn sequence_len(level: u32) -> usize {
        ((2 + (level - 1) / 2) as usize).min(10)
    }

    /// Draw a cell differing from the previous one. After the attempt cap
    /// the neighbouring cell is taken, which never equals `prev`.
    fn next_cell(&mut self, prev: Option<u32>) -> u32 {
        let cells = GRID * GRID;
        for _ in 0..MAX_ATTEMPTS {
            let c = self.prng.gen_range_u32(0, cells);
            if prev != Some(c) {
                return c;
            }
        }
        (prev.unwrap_or(0) + 1) % cells
    }

    pub fn join(steps: &[u32]) -> String {
        steps
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl Module for SequenceRecall {
    fn id(&self) -> &'static str {
        ID
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn category(&self) -> Category {
        Category::Memory
    }

    fn level_policy(&self) -> LevelPolicy {
        LevelPolicy::new(1, true, 19)
    }

    fn timing(&self, _level: u32) -> Timing {
        Timing {
            delay_ms: (1000, 1800),
            deadline_ms: None,
            feedback_ms: 1500,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        let len = Self::sequence_len(level);
        let cells = GRID * GRID;
        let mut steps: Vec<u32> = Vec::with_capacity(len);
        for _ in 0..len {
            // No immediate repeats.
            let step = self.next_cell(steps.last().copied());
            steps.push(step);
        }

        let answer = Self::join(&steps);
        Trial::new(
            Stimulus::CellSequence { grid: GRID, steps },
            (0..cells).map(|c| c.to_string()).collect(),
            answer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_grows_monotonically_to_ten() {
        for level in 2..=30 {
            assert!(SequenceRecall::sequence_len(level) >= SequenceRecall::sequence_len(level - 1));
        }
        assert_eq!(SequenceRecall::sequence_len(1), 2);
        assert_eq!(SequenceRecall::sequence_len(30), 10);
    }

    #[test]
    fn next_cell_never_returns_the_previous_cell() {
        let mut m = SequenceRecall::new(7);
        for prev in 0..GRID * GRID {
            for _ in 0..20 {
                assert_ne!(m.next_cell(Some(prev)), prev);
            }
        }
    }

    #[test]
    fn no_immediate_repeats_and_answer_joins_steps() {
        let mut m = SequenceRecall::new(31);
        for level in [1, 5, 11, 19] {
            let t = m.next_trial(level);
            let steps = match &t.stimulus {
                Stimulus::CellSequence { steps, .. } => steps.clone(),
                other => panic!("unexpected stimulus {other:?}"),
            };
            assert_eq!(steps.len(), SequenceRecall::sequence_len(level));
            for pair in steps.windows(2) {
                assert_ne!(pair[0], pair[1]);
            }
            assert_eq!(t.answer, SequenceRecall::join(&steps));
            assert!(t.stimulus == Stimulus::CellSequence { grid: 3, steps });
        }
    }
}
