//! Grid memory: a set of cells lights up briefly; recall which ones. The
//! client submits the selected cells sorted and dash-joined.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "grid_memory";
pub const NAME: &str = "Grid memory";

#[derive(Debug)]
pub struct GridMemory {
    prng: Prng,
}

impl GridMemory {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    pub fn grid_side(level: u32) -> u32 {
        (3 + (level - 1) / 6).min(6)
    }

    /// Lit-cell count grows with level but never beyond half the grid.
    pub fn lit_count(level: u32) -> usize {
        let side = Self::grid_side(level);
        let cap = ((side * side) / 2) as usize;
        ((2 + (level - 1) / 3) as usize).min(cap)
    }
}

impl Module for GridMemory {
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
        LevelPolicy::new(2, true, 24)
    }

    fn timing(&self, _level: u32) -> Timing {
        Timing {
            delay_ms: (1000, 2000),
            deadline_ms: None,
            feedback_ms: 1500,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        let side = Self::grid_side(level);
        let cells = (side * side) as usize;
        let count = Self::lit_count(level);

        // Sample without replacement by shuffling the index space; the lit
        // set is therefore distinct by construction.
        let mut all: Vec<u32> = (0..cells as u32).collect();
        self.prng.shuffle(&mut all);
        let mut lit: Vec<u32> = all[..count].to_vec();
        lit.sort_unstable();

        let answer = lit
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("-");
        Trial::new(
            Stimulus::LitCells { grid: side, lit },
            (0..cells).map(|c| c.to_string()).collect(),
            answer,
        )
    }
}
