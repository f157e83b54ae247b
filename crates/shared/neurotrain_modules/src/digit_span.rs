//! Digit span: memorize a digit string and type it back. From level 10 the
//! string must be entered in reverse order. Self-paced.

use neurotrain::prng::Prng;
use neurotrain::session::LevelPolicy;

use crate::{Category, Module, Stimulus, Timing, Trial};

pub const ID: &str = "digit_span";
pub const NAME: &str = "Digit span";

const REVERSED_FROM_LEVEL: u32 = 10;
const MAX_ATTEMPTS: usize = 100;

#[derive(Debug)]
pub struct DigitSpan {
    prng: Prng,
}

impl DigitSpan {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    pub fn span(level: u32) -> usize {
        ((3 + (level - 1) / 2) as usize).min(12)
    }

    pub fn reversed(level: u32) -> bool {
        level >= REVERSED_FROM_LEVEL
    }

    /// Draw a digit differing from the previous one. After the attempt cap
    /// the successor digit is taken, which never equals `prev`.
    fn next_digit(&mut self, prev: Option<u32>) -> u32 {
        for _ in 0..MAX_ATTEMPTS {
            let d = self.prng.gen_range_u32(0, 10);
            if prev != Some(d) {
                return d;
            }
        }
        (prev.unwrap_or(0) + 1) % 10
    }
}

impl Module for DigitSpan {
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
        LevelPolicy::new(2, true, 20)
    }

    fn timing(&self, _level: u32) -> Timing {
        Timing {
            delay_ms: (1000, 2000),
            deadline_ms: None,
            feedback_ms: 1300,
        }
    }

    fn next_trial(&mut self, level: u32) -> Trial {
        let span = Self::span(level);
        let reversed = Self::reversed(level);

        let mut digits = String::with_capacity(span);
        let mut last: Option<u32> = None;
        for _ in 0..span {
            // No immediate repeats; a repeated digit reads as one long flash.
            let d = self.next_digit(last);
            last = Some(d);
            digits.push(char::from_digit(d, 10).unwrap_or('0'));
        }

        let answer = if reversed {
            digits.chars().rev().collect()
        } else {
            digits.clone()
        };

        Trial::new(
            Stimulus::DigitSpan { digits, reversed },
            Vec::new(),
            answer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_grows_monotonically_to_twelve() {
        for level in 2..=30 {
            assert!(DigitSpan::span(level) >= DigitSpan::span(level - 1));
        }
        assert_eq!(DigitSpan::span(1), 3);
        assert_eq!(DigitSpan::span(30), 12);
    }

    #[test]
    fn forward_then_reversed_answers() {
        let mut m = DigitSpan::new(19);
        let t = m.next_trial(4);
        match &t.stimulus {
            Stimulus::DigitSpan { digits, reversed } => {
                assert!(!reversed);
                assert_eq!(&t.answer, digits);
            }
            other => panic!("unexpected stimulus {other:?}"),
        }

        let t = m.next_trial(12);
        match &t.stimulus {
            Stimulus::DigitSpan { digits, reversed } => {
                assert!(reversed);
                let rev: String = digits.chars().rev().collect();
                assert_eq!(t.answer, rev);
            }
            other => panic!("unexpected stimulus {other:?}"),
        }
    }

    #[test]
    fn next_digit_never_returns_the_previous_digit() {
        let mut m = DigitSpan::new(5);
        for prev in 0..10 {
            for _ in 0..20 {
                assert_ne!(m.next_digit(Some(prev)), prev);
            }
        }
    }

    #[test]
    fn no_immediate_digit_repeats() {
        let mut m = DigitSpan::new(2);
        for _ in 0..100 {
            let t = m.next_trial(20);
            let digits = match &t.stimulus {
                Stimulus::DigitSpan { digits, .. } => digits.clone(),
                other => panic!("unexpected stimulus {other:?}"),
            };
            let chars: Vec<char> = digits.chars().collect();
            for pair in chars.windows(2) {
                assert_ne!(pair[0], pair[1]);
            }
        }
    }
}
