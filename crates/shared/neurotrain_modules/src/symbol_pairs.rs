//! Symbol pairs: study a small set of symbol pairings, then recall the
//! partner of a probed symbol. Self-paced.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "symbol_pairs";
pub const NAME: &str = "Symbol pairs";

pub const SYMBOLS: [&str; 16] = [
    "sun", "moon", "star", "cloud", "tree", "leaf", "wave", "stone", "bell", "key", "drum",
    "flag", "boat", "kite", "lamp", "ring",
];

#[derive(Debug)]
pub struct SymbolPairs {
    prng: Prng,
}

impl SymbolPairs {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    pub fn pair_count(level: u32) -> usize {
        ((2 + (level - 1) / 4) as usize).min(6)
    }
}

impl Module for SymbolPairs {
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
        LevelPolicy::new(4, false, 20)
    }

    fn timing(&self, _level: u32) -> Timing {
        Timing {
            delay_ms: (1200, 2200),
            deadline_ms: None,
            feedback_ms: 1200,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        let count = Self::pair_count(level);

        // Disjoint left/right sides drawn from one shuffle, so every symbol
        // appears at most once and all partners are pairwise distinct.
        let mut pool: Vec<&str> = SYMBOLS.to_vec();
        self.prng.shuffle(&mut pool);
        let pairs: Vec<(String, String)> = (0..count)
            .map(|i| (pool[2 * i].to_string(), pool[2 * i + 1].to_string()))
            .collect();

        let probe_idx = self.prng.gen_range_usize(0, count);
        let probe = pairs[probe_idx].0.clone();
        let answer = pairs[probe_idx].1.clone();

        let mut options: Vec<String> = pairs.iter().map(|p| p.1.clone()).collect();
        self.prng.shuffle(&mut options);

        Trial::new(Stimulus::PairProbe { probe, pairs }, options, answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_count_is_monotonic() {
        for level in 2..=30 {
            assert!(SymbolPairs::pair_count(level) >= SymbolPairs::pair_count(level - 1));
        }
        assert_eq!(SymbolPairs::pair_count(30), 6);
    }

    #[test]
    fn partners_are_distinct_and_answer_is_the_probes_partner() {
        let mut m = SymbolPairs::new(61);
        for level in [1, 9, 20] {
            let t = m.next_trial(level);
            let (probe, pairs) = match &t.stimulus {
                Stimulus::PairProbe { probe, pairs } => (probe.clone(), pairs.clone()),
                other => panic!("unexpected stimulus {other:?}"),
            };
            // No symbol appears twice anywhere in the pair set.
            let mut seen: Vec<&str> = Vec::new();
            for (a, b) in &pairs {
                assert!(!seen.contains(&a.as_str()));
                seen.push(a);
                assert!(!seen.contains(&b.as_str()));
                seen.push(b);
            }
            let partner = pairs.iter().find(|p| p.0 == probe).map(|p| p.1.clone());
            assert_eq!(partner.as_deref(), Some(t.answer.as_str()));
            assert!(t.options.contains(&t.answer));
        }
    }
}
