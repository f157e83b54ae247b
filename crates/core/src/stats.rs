use serde::{Deserialize, Serialize};

/// Rolling per-session accuracy and reaction-time tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub correct: u32,
    pub incorrect: u32,
    pub trials: u32,
    /// Bounded window of recent outcomes, oldest first.
    pub recent: Vec<bool>,
    /// Reaction times for responded trials, in order. Misses contribute none.
    pub reaction_ms: Vec<u32>,
}

const RECENT_CAP: usize = 200;

impl SessionStats {
    pub fn new() -> Self {
        Self {
            correct: 0,
            incorrect: 0,
            trials: 0,
            recent: Vec::with_capacity(RECENT_CAP),
            reaction_ms: Vec::new(),
        }
    }

    pub fn record(&mut self, is_correct: bool, reaction_ms: Option<u32>) {
        if is_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }

        self.recent.push(is_correct);
        if self.recent.len() > RECENT_CAP {
            self.recent.remove(0);
        }

        if let Some(rt) = reaction_ms {
            self.reaction_ms.push(rt);
        }

        self.trials += 1;
    }

    pub fn accuracy(&self) -> f32 {
        let total = self.correct + self.incorrect;
        if total == 0 {
            0.0
        } else {
            self.correct as f32 / total as f32
        }
    }

    pub fn recent_rate(&self) -> f32 {
        if self.recent.is_empty() {
            return 0.0;
        }
        let correct_count = self.recent.iter().filter(|&&x| x).count();
        correct_count as f32 / self.recent.len() as f32
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
