//! Odd one out: a grid of identical glyphs with a single deviant. Early
//! levels change the color; later levels change the shape, which reads as a
//! subtler pop-out.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::visual_search::{COLORS, SHAPES};
use crate::{Category, Glyph, Module, Stimulus, Timing, Trial};

pub const ID: &str = "odd_one_out";
pub const NAME: &str = "Odd one out";

const SHAPE_DEVIANT_FROM_LEVEL: u32 = 8;

#[derive(Debug)]
pub struct OddOneOut {
    prng: Prng,
}

impl OddOneOut {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    pub fn grid_side(level: u32) -> u32 {
        (3 + (level - 1) / 4).min(7)
    }

    /// The deviant differs from the base in exactly one attribute, never in
    /// zero. Index rotation guarantees the difference without sampling.
    fn deviant(&mut self, base: &Glyph, level: u32) -> Glyph {
        if level >= SHAPE_DEVIANT_FROM_LEVEL && self.prng.chance(0.5) {
            let si = SHAPES.iter().position(|&s| s == base.shape).unwrap_or(0);
            let step = self.prng.gen_range_usize(1, SHAPES.len());
            Glyph::new(SHAPES[(si + step) % SHAPES.len()], &base.color)
        } else {
            let ci = COLORS.iter().position(|&c| c == base.color).unwrap_or(0);
            let step = self.prng.gen_range_usize(1, COLORS.len());
            Glyph::new(&base.shape, COLORS[(ci + step) % COLORS.len()])
        }
    }
}

impl Module for OddOneOut {
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
        LevelPolicy::new(4, false, 24)
    }

    fn timing(&self, level: u32) -> Timing {
        let deadline = 6000u32.saturating_sub(150 * (level - 1)).max(2500);
        Timing {
            delay_ms: (800, 2000),
            deadline_ms: Some(deadline),
            feedback_ms: 1000,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        let side = Self::grid_side(level);
        let cells = (side * side) as usize;
        let base = Glyph::new(
            SHAPES[self.prng.gen_range_usize(0, SHAPES.len())],
            COLORS[self.prng.gen_range_usize(0, COLORS.len())],
        );
        let odd = self.deviant(&base, level);
        let odd_pos = self.prng.gen_range_usize(0, cells);

        let glyphs: Vec<Glyph> = (0..cells)
            .map(|i| if i == odd_pos { odd.clone() } else { base.clone() })
            .collect();

        Trial::new(
            Stimulus::GlyphGrid {
                width: side,
                glyphs,
            },
            (0..cells).map(|i| i.to_string()).collect(),
            odd_pos.to_string(),
        )
    }
}
