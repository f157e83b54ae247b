//! Trail making: advance along the alternating trail 1-A-2-B-3-C... one node
//! per trial, picking the next node among distractors drawn from elsewhere in
//! the trail. Reaching the end restarts the trail from the first node.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "trail_making";
pub const NAME: &str = "Trail making";

const OPTION_COUNT: usize = 4;

#[derive(Debug)]
pub struct TrailMaking {
    prng: Prng,
    position: usize,
}

impl TrailMaking {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
            position: 0,
        }
    }

    /// Trail length 6..=26 nodes, two more every other level.
    pub fn trail_len(level: u32) -> usize {
        ((6 + (level - 1)) as usize).min(26)
    }

    /// Node label at a trail index: 0 -> "1", 1 -> "A", 2 -> "2", 3 -> "B"...
    pub fn label(index: usize) -> String {
        if index % 2 == 0 {
            (index / 2 + 1).to_string()
        } else {
            let c = b'A' + (index / 2) as u8;
            (c as char).to_string()
        }
    }
}

impl Module for TrailMaking {
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
        LevelPolicy::new(4, false, 21)
    }

    fn timing(&self, level: u32) -> Timing {
        let deadline = 5000u32.saturating_sub(100 * (level - 1)).max(2000);
        Timing {
            delay_ms: (500, 1200),
            deadline_ms: Some(deadline),
            feedback_ms: 800,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        let len = Self::trail_len(level);
        if self.position + 1 >= len {
            self.position = 0;
        }

        let visited: Vec<String> = (0..=self.position).map(Self::label).collect();
        let next = self.position + 1;
        let answer = Self::label(next);

        // Distractors are other unvisited nodes of the same trail; all labels
        // are distinct by construction, so sampling distinct indices is
        // enough. When the tail is short, fall back to labels beyond the
        // trail, which are still never equal to the answer.
        let mut option_idx: Vec<usize> = vec![next];
        let mut probe = next + 1;
        while option_idx.len() < OPTION_COUNT {
            let candidate = if probe < len && self.prng.chance(0.7) {
                self.prng.gen_range_usize(next + 1, len)
            } else {
                probe
            };
            if !option_idx.contains(&candidate) {
                option_idx.push(candidate);
            }
            probe += 1;
        }
        let mut options: Vec<String> = option_idx.into_iter().map(Self::label).collect();
        self.prng.shuffle(&mut options);

        self.position = next;

        Trial::new(Stimulus::Trail { visited }, options, answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_alternate_numbers_and_letters() {
        assert_eq!(TrailMaking::label(0), "1");
        assert_eq!(TrailMaking::label(1), "A");
        assert_eq!(TrailMaking::label(2), "2");
        assert_eq!(TrailMaking::label(3), "B");
        assert_eq!(TrailMaking::label(8), "5");
        assert_eq!(TrailMaking::label(9), "E");
    }

    #[test]
    fn trail_len_is_monotonic_and_capped() {
        for level in 2..=30 {
            assert!(TrailMaking::trail_len(level) >= TrailMaking::trail_len(level - 1));
        }
        assert_eq!(TrailMaking::trail_len(30), 26);
    }

    #[test]
    fn answer_follows_the_visited_prefix_and_options_are_distinct() {
        let mut m = TrailMaking::new(3);
        for _ in 0..100 {
            let t = m.next_trial(5);
            let visited = match &t.stimulus {
                Stimulus::Trail { visited } => visited.clone(),
                other => panic!("unexpected stimulus {other:?}"),
            };
            assert_eq!(t.answer, TrailMaking::label(visited.len()));
            assert_eq!(t.options.len(), OPTION_COUNT);
            assert!(t.options.contains(&t.answer));
            for (i, a) in t.options.iter().enumerate() {
                for b in &t.options[i + 1..] {
                    assert_ne!(a, b);
                }
            }
        }
    }
}
