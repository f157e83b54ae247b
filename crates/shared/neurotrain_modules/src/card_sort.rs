//! Card sorting: match the card to one of three key piles under a hidden
//! rule (shape, color or count). The rule switches silently after a run of
//! trials; higher levels switch more often.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "card_sort";
pub const NAME: &str = "Card sorting";

const PILE_SHAPES: [&str; 3] = ["circle", "square", "star"];
const PILE_COLORS: [&str; 3] = ["red", "green", "blue"];
const PILE_COUNTS: [u32; 3] = [1, 2, 3];
const MAX_ATTEMPTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Shape,
    Color,
    Count,
}

#[derive(Debug)]
pub struct CardSort {
    prng: Prng,
    rule: Rule,
    run: u32,
}

impl CardSort {
    pub fn new(seed: u64) -> Self {
        let mut prng = Prng::new(seed);
        let rule = Self::random_rule(&mut prng);
        Self { prng, rule, run: 0 }
    }

    fn random_rule(prng: &mut Prng) -> Rule {
        match prng.gen_range_u32(0, 3) {
            0 => Rule::Shape,
            1 => Rule::Color,
            _ => Rule::Count,
        }
    }

    /// Trials between silent rule switches; tightens with level, floor 4.
    pub fn switch_every(level: u32) -> u32 {
        10u32.saturating_sub(level / 3).max(4)
    }

    /// The cyclic successor, never equal to `old`.
    fn fallback_rule(old: Rule) -> Rule {
        match old {
            Rule::Shape => Rule::Color,
            Rule::Color => Rule::Count,
            Rule::Count => Rule::Shape,
        }
    }

    fn maybe_switch(&mut self, level: u32) {
        if self.run < Self::switch_every(level) {
            return;
        }
        self.run = 0;
        let old = self.rule;
        // Always switch to a different rule.
        for _ in 0..MAX_ATTEMPTS {
            let r = Self::random_rule(&mut self.prng);
            if r != old {
                self.rule = r;
                return;
            }
        }
        self.rule = Self::fallback_rule(old);
    }

    fn pile_label(i: usize) -> String {
        format!("{}-{}-{}", PILE_SHAPES[i], PILE_COLORS[i], PILE_COUNTS[i])
    }
}

impl Module for CardSort {
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

    fn timing(&self, _level: u32) -> Timing {
        Timing {
            delay_ms: (700, 1400),
            deadline_ms: Some(6000),
            feedback_ms: 1000,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        self.maybe_switch(level);
        self.run += 1;

        let shape_i = self.prng.gen_range_usize(0, 3);
        let color_i = self.prng.gen_range_usize(0, 3);
        let count_i = self.prng.gen_range_usize(0, 3);

        let pile = match self.rule {
            Rule::Shape => shape_i,
            Rule::Color => color_i,
            Rule::Count => count_i,
        };

        let piles: Vec<String> = (0..3).map(Self::pile_label).collect();
        Trial::new(
            Stimulus::Card {
                shape: PILE_SHAPES[shape_i].to_string(),
                color: PILE_COLORS[color_i].to_string(),
                count: PILE_COUNTS[count_i],
                piles: piles.clone(),
            },
            piles,
            Self::pile_label(pile),
        )
    }
}
