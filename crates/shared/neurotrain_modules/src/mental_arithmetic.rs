//! Mental arithmetic: evaluate a chained expression and pick its value among
//! close distractors.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "mental_arithmetic";
pub const NAME: &str = "Mental arithmetic";

const MAX_ATTEMPTS: usize = 100;
const OPTION_COUNT: usize = 4;

#[derive(Debug)]
pub struct MentalArithmetic {
    prng: Prng,
}

impl MentalArithmetic {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    /// Operator count 1..=4, one more every 4 levels.
    pub fn op_count(level: u32) -> usize {
        ((1 + (level - 1) / 4) as usize).min(4)
    }

    fn operand_max(level: u32) -> u32 {
        9 + level
    }

    /// Distractors within ±10 of the value, pairwise distinct and never equal
    /// to it. Fallback walks outward deterministically.
    fn distractors(&mut self, value: i64) -> Vec<i64> {
        let mut out: Vec<i64> = Vec::with_capacity(OPTION_COUNT - 1);
        while out.len() < OPTION_COUNT - 1 {
            let mut found = None;
            for _ in 0..MAX_ATTEMPTS {
                let offset = self.prng.gen_range_u32(1, 11) as i64;
                let candidate = if self.prng.chance(0.5) {
                    value + offset
                } else {
                    value - offset
                };
                if candidate != value && !out.contains(&candidate) {
                    found = Some(candidate);
                    break;
                }
            }
            let candidate = found.unwrap_or_else(|| {
                let mut step = 1i64;
                loop {
                    let c = value + step;
                    if !out.contains(&c) {
                        break c;
                    }
                    step += 1;
                }
            });
            out.push(candidate);
        }
        out
    }
}

impl Module for MentalArithmetic {
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
        LevelPolicy::new(3, false, 20)
    }

    fn timing(&self, level: u32) -> Timing {
        let deadline = 10_000u32.saturating_sub(300 * (level - 1)).max(4000);
        Timing {
            delay_ms: (800, 1500),
            deadline_ms: Some(deadline),
            feedback_ms: 1200,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        let ops = Self::op_count(level);
        let max = Self::operand_max(level);

        let mut value = self.prng.gen_range_u32(1, max + 1) as i64;
        let mut text = value.to_string();
        for _ in 0..ops {
            let operand = self.prng.gen_range_u32(1, max + 1) as i64;
            if self.prng.chance(0.5) {
                value += operand;
                text.push_str(&format!(" + {operand}"));
            } else {
                value -= operand;
                text.push_str(&format!(" - {operand}"));
            }
        }

        let mut options: Vec<i64> = self.distractors(value);
        options.push(value);
        // Deterministic shuffle from the module's own stream.
        let mut opts: Vec<String> = options.iter().map(|v| v.to_string()).collect();
        self.prng.shuffle(&mut opts);

        Trial::new(Stimulus::Expression { text }, opts, value.to_string())
    }
}
