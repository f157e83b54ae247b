//! Dashboard analytics: fold a user's session history into a per-category
//! cognitive profile.
//!
//! The category of a session is derived from its module id by a mapping the
//! caller supplies (the module catalog lives a crate above this one).

use serde::{Deserialize, Serialize};

use crate::store::SessionResult;

/// Level attainment saturates here for scoring purposes; individual modules
/// may level higher, but the profile treats 20 as full marks.
const LEVEL_SCALE: f32 = 20.0;

const ACCURACY_WEIGHT: f32 = 0.7;
const LEVEL_WEIGHT: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub sessions: u32,
    pub total_trials: u32,
    pub best_level: u32,
    /// Trial-weighted fraction correct across the category, 0..=1.
    pub accuracy: f32,
    /// Blended 0..=100 score: accuracy and best-level attainment.
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveProfile {
    /// Session-weighted mean of the category scores, 0..=100.
    pub overall: f32,
    pub categories: Vec<CategoryScore>,
}

impl CognitiveProfile {
    pub fn from_sessions<F>(sessions: &[SessionResult], category_of: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        let mut categories: Vec<CategoryScore> = Vec::new();

        for s in sessions {
            let cat = category_of(&s.module_id);
            let entry = match categories.iter_mut().find(|c| c.category == cat) {
                Some(e) => e,
                None => {
                    categories.push(CategoryScore {
                        category: cat,
                        sessions: 0,
                        total_trials: 0,
                        best_level: 0,
                        accuracy: 0.0,
                        score: 0.0,
                    });
                    categories.last_mut().unwrap()
                }
            };
            entry.sessions += 1;
            entry.total_trials += s.total_trials;
            entry.best_level = entry.best_level.max(s.level);
            // Accumulate raw corrects in `accuracy` until the final pass.
            entry.accuracy += s.correct_count as f32;
        }

        for c in &mut categories {
            c.accuracy = if c.total_trials > 0 {
                c.accuracy / c.total_trials as f32
            } else {
                0.0
            };
            let level_part = (c.best_level as f32 / LEVEL_SCALE).min(1.0);
            c.score = 100.0 * (ACCURACY_WEIGHT * c.accuracy + LEVEL_WEIGHT * level_part);
        }
        categories.sort_by(|a, b| a.category.cmp(&b.category));

        let total_sessions: u32 = categories.iter().map(|c| c.sessions).sum();
        let overall = if total_sessions > 0 {
            categories
                .iter()
                .map(|c| c.score * c.sessions as f32)
                .sum::<f32>()
                / total_sessions as f32
        } else {
            0.0
        };

        Self {
            overall,
            categories,
        }
    }
}
