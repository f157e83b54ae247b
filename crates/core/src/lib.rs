//! # neurotrain
//!
//! Core engine for a cognitive-rehabilitation training suite.
//!
//! Every training module in the suite is one instance of the same
//! trial/session pattern: a difficulty curve maps the current level to task
//! parameters, a generator produces one stimulus-response trial, a scheduler
//! walks the trial through `waiting -> presented -> (resolved | timed-out)`,
//! and a reducer folds outcomes into the session state. This crate holds that
//! pattern once, deduplicated, plus the persistence and reporting layers that
//! surround it:
//!
//! - [`session`]: session state and the outcome reducer
//! - [`schedule`]: the token-guarded trial scheduler state machine
//! - [`stats`]: rolling accuracy and reaction-time tracking
//! - [`store`]: users/sessions persistence (flat JSON collections)
//! - [`archive`]: chunked binary backup container (LZ4)
//! - [`profile`]: per-category analytics aggregation
//! - [`report`]: session result drafting and the exported progress report
//!
//! The scheduler is deliberately clock-free: it emits [`schedule::TimerCmd`]
//! values and consumes token-stamped events, so the host owns every timer and
//! the machine itself is testable without wall-clock sleeps.

pub mod archive;
pub mod prng;
pub mod profile;
pub mod report;
pub mod schedule;
pub mod session;
pub mod stats;
pub mod store;

pub mod prelude {
    pub use crate::prng::Prng;
    pub use crate::report::{finish, SessionDraft};
    pub use crate::schedule::{Phase, TimerCmd, TrialSchedule};
    pub use crate::session::{LevelPolicy, Outcome, SessionState};
    pub use crate::stats::SessionStats;
    pub use crate::store::{SessionResult, Snapshot, TrainingStore, User};
}
