//! Visual field: a brief peripheral flash left or right of fixation; report
//! the side. Eccentricity pushes outward and the flash window tightens as
//! the level climbs.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "field_spot";
pub const NAME: &str = "Visual field spot";

#[derive(Debug)]
pub struct FieldSpot {
    prng: Prng,
}

impl FieldSpot {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    /// Eccentricity 1..=9, one step out every 3 levels.
    pub fn eccentricity(level: u32) -> u32 {
        (1 + (level - 1) / 3).min(9)
    }

    pub fn deadline_ms(level: u32) -> u32 {
        1200u32.saturating_sub(30 * (level - 1)).max(500)
    }
}

impl Module for FieldSpot {
    fn id(&self) -> &'static str {
        ID
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn category(&self) -> Category {
        Category::VisualField
    }

    fn level_policy(&self) -> LevelPolicy {
        LevelPolicy::new(3, true, 30)
    }

    fn timing(&self, level: u32) -> Timing {
        Timing {
            delay_ms: (1000, 5000),
            deadline_ms: Some(Self::deadline_ms(level)),
            feedback_ms: 900,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        let side = *self.prng.pick(&["left", "right"]);
        Trial::new(
            Stimulus::Spot {
                side: side.to_string(),
                eccentricity: Self::eccentricity(level),
            },
            vec!["left".to_string(), "right".to_string()],
            side,
        )
    }
}
