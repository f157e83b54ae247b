//! Visual search: find the one glyph matching the target shape+color pair in
//! a grid of distractors. A distractor may share the target's shape or its
//! color, never both.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Glyph, Module, Stimulus, Timing, Trial};

pub const ID: &str = "visual_search";
pub const NAME: &str = "Visual search";

pub const SHAPES: [&str; 6] = ["circle", "square", "triangle", "star", "cross", "diamond"];
pub const COLORS: [&str; 6] = ["red", "green", "blue", "yellow", "purple", "orange"];

const MAX_ATTEMPTS: usize = 100;

#[derive(Debug)]
pub struct VisualSearch {
    prng: Prng,
}

impl VisualSearch {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    /// Grid side grows one step every 5 levels, 3..=8.
    pub fn grid_side(level: u32) -> u32 {
        (3 + (level - 1) / 5).min(8)
    }

    fn random_glyph(&mut self) -> Glyph {
        Glyph::new(
            SHAPES[self.prng.gen_range_usize(0, SHAPES.len())],
            COLORS[self.prng.gen_range_usize(0, COLORS.len())],
        )
    }

    /// A distractor differing from `target` in shape, color or both. Bounded
    /// rejection sampling; the fallback rotates the color, which always
    /// breaks the shape+color equivalence.
    fn distractor(&mut self, target: &Glyph) -> Glyph {
        for _ in 0..MAX_ATTEMPTS {
            let g = self.random_glyph();
            if g != *target {
                return g;
            }
        }
        let ci = COLORS.iter().position(|&c| c == target.color).unwrap_or(0);
        Glyph::new(&target.shape, COLORS[(ci + 1) % COLORS.len()])
    }
}

impl Module for VisualSearch {
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
        // One of the modules that drops a level on error.
        LevelPolicy::new(3, true, 30)
    }

    fn timing(&self, level: u32) -> Timing {
        let deadline = 8000u32.saturating_sub(250 * (level - 1)).max(3000);
        Timing {
            delay_ms: (800, 2000),
            deadline_ms: Some(deadline),
            feedback_ms: 1200,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        let side = Self::grid_side(level);
        let cells = (side * side) as usize;
        let target = self.random_glyph();
        let target_pos = self.prng.gen_range_usize(0, cells);

        let mut glyphs = Vec::with_capacity(cells);
        for i in 0..cells {
            if i == target_pos {
                glyphs.push(target.clone());
            } else {
                glyphs.push(self.distractor(&target));
            }
        }

        let options = (0..cells).map(|i| i.to_string()).collect();
        Trial::new(
            Stimulus::GlyphGrid {
                width: side,
                glyphs,
            },
            options,
            target_pos.to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_grows_monotonically_and_caps() {
        for level in 2..=60 {
            assert!(VisualSearch::grid_side(level) >= VisualSearch::grid_side(level - 1));
        }
        assert_eq!(VisualSearch::grid_side(1), 3);
        assert_eq!(VisualSearch::grid_side(60), 8);
    }

    #[test]
    fn exactly_one_glyph_matches_the_target_pair() {
        let mut m = VisualSearch::new(99);
        for level in [1, 7, 19, 30] {
            let t = m.next_trial(level);
            let (width, glyphs) = match &t.stimulus {
                Stimulus::GlyphGrid { width, glyphs } => (*width, glyphs),
                other => panic!("unexpected stimulus {other:?}"),
            };
            assert_eq!(glyphs.len(), (width * width) as usize);
            let target_pos: usize = t.answer.parse().unwrap();
            let target = &glyphs[target_pos];
            let matches = glyphs.iter().filter(|g| *g == target).count();
            assert_eq!(matches, 1, "distractor shares shape+color with target");
        }
    }

    #[test]
    fn fallback_distractor_never_equals_target() {
        let mut m = VisualSearch::new(1);
        let target = Glyph::new("star", "blue");
        for _ in 0..500 {
            assert_ne!(m.distractor(&target), target);
        }
    }
}
