//! The training modules of the suite.
//!
//! Each module is one mini-game: a difficulty curve, a trial generator and a
//! handful of timing/leveling parameters plugged into the generic engine in
//! the `neurotrain` crate. Modules are deterministic given their seed; all
//! randomness comes from the seeded PRNG they own.
//!
//! The host drives a module through the object-safe [`Module`] trait: ask for
//! the timing window of the current level, pull one [`Trial`], check the
//! user's action against `Trial::answer`. Stimuli are plain serializable
//! descriptions; rendering them is entirely the client's concern.

pub mod card_sort;
pub mod digit_span;
pub mod field_spot;
pub mod go_no_go;
pub mod grid_memory;
pub mod mental_arithmetic;
pub mod n_back;
pub mod odd_one_out;
pub mod reaction;
pub mod sequence_recall;
pub mod stroop;
pub mod symbol_pairs;
pub mod trail_making;
pub mod visual_search;
pub mod word_recognition;

use neurotrain::session::LevelPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Attention,
    Memory,
    WorkingMemory,
    Executive,
    VisualField,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Attention => "attention",
            Category::Memory => "memory",
            Category::WorkingMemory => "working_memory",
            Category::Executive => "executive",
            Category::VisualField => "visual_field",
        }
    }
}

/// Timing window for one level of one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Randomized inter-trial delay window (min, max), milliseconds.
    pub delay_ms: (u32, u32),
    /// Response deadline after presentation; `None` means self-paced.
    pub deadline_ms: Option<u32>,
    /// Feedback pause before the next trial is armed.
    pub feedback_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub shape: String,
    pub color: String,
}

impl Glyph {
    pub fn new(shape: &str, color: &str) -> Self {
        Self {
            shape: shape.to_string(),
            color: color.to_string(),
        }
    }
}

/// What the client should render for one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stimulus {
    /// A spot at the given side; eccentricity 0 is central.
    Spot { side: String, eccentricity: u32 },
    GlyphGrid { width: u32, glyphs: Vec<Glyph> },
    ColorWord { word: String, ink: String },
    Cue { go: bool, symbol: String },
    CellSequence { grid: u32, steps: Vec<u32> },
    LitCells { grid: u32, lit: Vec<u32> },
    WordProbe { probe: String, studied: Vec<String> },
    PairProbe { probe: String, pairs: Vec<(String, String)> },
    Letter { letter: String, n: u32 },
    DigitSpan { digits: String, reversed: bool },
    Expression { text: String },
    Trail { visited: Vec<String> },
    Card { shape: String, color: String, count: u32, piles: Vec<String> },
}

/// One stimulus-response round. Consumed by exactly one user action or one
/// timeout, never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub stimulus: Stimulus,
    /// The actions the client should offer. Empty means free-form input.
    pub options: Vec<String>,
    pub answer: String,
    /// When set, letting the deadline elapse IS the correct response
    /// (no-go trials). Defaults to false.
    #[serde(default)]
    pub timeout_correct: bool,
}

impl Trial {
    pub fn new(stimulus: Stimulus, options: Vec<String>, answer: impl Into<String>) -> Self {
        Self {
            stimulus,
            options,
            answer: answer.into(),
            timeout_correct: false,
        }
    }
}

// Hosts hold boxed modules inside shared async state, so the trait object
// must cross and be referenced from multiple threads.
pub trait Module: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn category(&self) -> Category;
    fn level_policy(&self) -> LevelPolicy;
    fn timing(&self, level: u32) -> Timing;
    fn next_trial(&mut self, level: u32) -> Trial;
}

struct Entry {
    id: &'static str,
    name: &'static str,
    category: Category,
    build: fn(u64) -> Box<dyn Module>,
}

static REGISTRY: &[Entry] = &[
    Entry { id: reaction::ID, name: reaction::NAME, category: Category::Attention, build: |s| Box::new(reaction::Reaction::new(s)) },
    Entry { id: visual_search::ID, name: visual_search::NAME, category: Category::Attention, build: |s| Box::new(visual_search::VisualSearch::new(s)) },
    Entry { id: go_no_go::ID, name: go_no_go::NAME, category: Category::Attention, build: |s| Box::new(go_no_go::GoNoGo::new(s)) },
    Entry { id: odd_one_out::ID, name: odd_one_out::NAME, category: Category::Attention, build: |s| Box::new(odd_one_out::OddOneOut::new(s)) },
    Entry { id: sequence_recall::ID, name: sequence_recall::NAME, category: Category::Memory, build: |s| Box::new(sequence_recall::SequenceRecall::new(s)) },
    Entry { id: grid_memory::ID, name: grid_memory::NAME, category: Category::Memory, build: |s| Box::new(grid_memory::GridMemory::new(s)) },
    Entry { id: word_recognition::ID, name: word_recognition::NAME, category: Category::Memory, build: |s| Box::new(word_recognition::WordRecognition::new(s)) },
    Entry { id: symbol_pairs::ID, name: symbol_pairs::NAME, category: Category::Memory, build: |s| Box::new(symbol_pairs::SymbolPairs::new(s)) },
    Entry { id: n_back::ID, name: n_back::NAME, category: Category::WorkingMemory, build: |s| Box::new(n_back::NBack::new(s)) },
    Entry { id: digit_span::ID, name: digit_span::NAME, category: Category::WorkingMemory, build: |s| Box::new(digit_span::DigitSpan::new(s)) },
    Entry { id: mental_arithmetic::ID, name: mental_arithmetic::NAME, category: Category::WorkingMemory, build: |s| Box::new(mental_arithmetic::MentalArithmetic::new(s)) },
    Entry { id: stroop::ID, name: stroop::NAME, category: Category::Executive, build: |s| Box::new(stroop::Stroop::new(s)) },
    Entry { id: trail_making::ID, name: trail_making::NAME, category: Category::Executive, build: |s| Box::new(trail_making::TrailMaking::new(s)) },
    Entry { id: card_sort::ID, name: card_sort::NAME, category: Category::Executive, build: |s| Box::new(card_sort::CardSort::new(s)) },
    Entry { id: field_spot::ID, name: field_spot::NAME, category: Category::VisualField, build: |s| Box::new(field_spot::FieldSpot::new(s)) },
];

/// Catalog entry the host exposes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub id: String,
    pub name: String,
    pub category: String,
}

pub fn catalog() -> Vec<ModuleInfo> {
    REGISTRY
        .iter()
        .map(|e| ModuleInfo {
            id: e.id.to_string(),
            name: e.name.to_string(),
            category: e.category.label().to_string(),
        })
        .collect()
}

pub fn create(id: &str, seed: u64) -> Option<Box<dyn Module>> {
    REGISTRY.iter().find(|e| e.id == id).map(|e| (e.build)(seed))
}

pub fn category_of(id: &str) -> Option<Category> {
    REGISTRY.iter().find(|e| e.id == id).map(|e| e.category)
}

pub fn name_of(id: &str) -> Option<&'static str> {
    REGISTRY.iter().find(|e| e.id == id).map(|e| e.name)
}
