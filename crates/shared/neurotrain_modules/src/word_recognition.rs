//! Word recognition: study a short word list, then judge whether a probe
//! word was on it. Foils are drawn from the same pool but never from the
//! studied list.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "word_recognition";
pub const NAME: &str = "Word recognition";

pub const POOL: [&str; 40] = [
    "river", "candle", "garden", "mirror", "pillow", "forest", "window", "bottle", "ladder",
    "basket", "bridge", "flower", "hammer", "island", "jacket", "kettle", "lantern", "marble",
    "needle", "orange", "pencil", "quartz", "ribbon", "saddle", "teapot", "umbrella", "violin",
    "walnut", "anchor", "button", "carpet", "domino", "engine", "feather", "guitar", "helmet",
    "iceberg", "jungle", "kitten", "lemon",
];

const MAX_ATTEMPTS: usize = 200;

#[derive(Debug)]
pub struct WordRecognition {
    prng: Prng,
}

impl WordRecognition {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    pub fn list_len(level: u32) -> usize {
        ((3 + (level - 1) / 3) as usize).min(12)
    }

    /// A pool word not on the studied list. Rejection sampling with a linear
    /// scan as the deterministic fallback; the pool is always strictly larger
    /// than the list, so the scan cannot fail.
    fn foil(&mut self, studied: &[String]) -> String {
        for _ in 0..MAX_ATTEMPTS {
            let w = POOL[self.prng.gen_range_usize(0, POOL.len())];
            if !studied.iter().any(|s| s == w) {
                return w.to_string();
            }
        }
        POOL.iter()
            .find(|w| !studied.iter().any(|s| s == **w))
            .unwrap_or(&POOL[0])
            .to_string()
    }
}

impl Module for WordRecognition {
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
        LevelPolicy::new(5, false, 28)
    }

    fn timing(&self, level: u32) -> Timing {
        let deadline = 4000u32.saturating_sub(100 * (level - 1)).max(1500);
        Timing {
            delay_ms: (1200, 2400),
            deadline_ms: Some(deadline),
            feedback_ms: 1000,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        let len = Self::list_len(level);
        let mut pool: Vec<&str> = POOL.to_vec();
        self.prng.shuffle(&mut pool);
        let studied: Vec<String> = pool[..len].iter().map(|w| w.to_string()).collect();

        let from_list = self.prng.chance(0.5);
        let probe = if from_list {
            studied[self.prng.gen_range_usize(0, studied.len())].clone()
        } else {
            self.foil(&studied)
        };

        Trial::new(
            Stimulus::WordProbe { probe, studied },
            vec!["yes".to_string(), "no".to_string()],
            if from_list { "yes" } else { "no" },
        )
    }
}
