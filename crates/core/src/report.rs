//! Result drafting and the exported progress report.
//!
//! [`finish`] reduces a finished session into the persistable draft (the host
//! stamps ids, timestamps and duration). [`export_report`] renders a user's
//! full history into a formatted Markdown document and writes it under the
//! reports directory, named after the user.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profile::CognitiveProfile;
use crate::session::SessionState;
use crate::store::{SessionResult, User};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no sessions recorded for user {0}")]
    EmptyHistory(String),
}

/// Everything the session itself knows at the moment it ends. The host owns
/// identity, wall-clock and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub level: u32,
    pub correct_count: u32,
    pub error_count: u32,
    pub total_trials: u32,
    pub average_reaction_time_ms: u32,
}

/// Reduce the session state and collected reaction times into a draft.
/// An empty reaction-time list yields 0, not NaN.
pub fn finish(state: &SessionState, reaction_times_ms: &[u32]) -> SessionDraft {
    let average_reaction_time_ms = if reaction_times_ms.is_empty() {
        0
    } else {
        let sum: u64 = reaction_times_ms.iter().map(|&v| v as u64).sum();
        (sum / reaction_times_ms.len() as u64) as u32
    };

    SessionDraft {
        level: state.level,
        correct_count: state.score,
        error_count: state.errors,
        total_trials: state.trials,
        average_reaction_time_ms,
    }
}

struct ModuleRow {
    module_id: String,
    sessions: u32,
    best_level: u32,
    correct: u32,
    trials: u32,
    rt_sum: u64,
    rt_count: u32,
}

/// Render the full report document. `module_name` maps module ids to display
/// names; unknown ids fall back to the raw id.
pub fn render_markdown(
    user: &User,
    sessions: &[SessionResult],
    profile: &CognitiveProfile,
    module_name: &dyn Fn(&str) -> String,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Training report - {}\n\n", user.name));
    out.push_str(&format!(
        "Sessions on record: {}. Overall score: {:.1} / 100.\n\n",
        sessions.len(),
        profile.overall
    ));

    out.push_str("## Cognitive profile\n\n");
    out.push_str("| Category | Sessions | Best level | Accuracy | Score |\n");
    out.push_str("|---|---:|---:|---:|---:|\n");
    for c in &profile.categories {
        out.push_str(&format!(
            "| {} | {} | {} | {:.0}% | {:.1} |\n",
            c.category,
            c.sessions,
            c.best_level,
            c.accuracy * 100.0,
            c.score
        ));
    }
    out.push('\n');

    let mut rows: Vec<ModuleRow> = Vec::new();
    for s in sessions {
        let row = match rows.iter_mut().find(|r| r.module_id == s.module_id) {
            Some(r) => r,
            None => {
                rows.push(ModuleRow {
                    module_id: s.module_id.clone(),
                    sessions: 0,
                    best_level: 0,
                    correct: 0,
                    trials: 0,
                    rt_sum: 0,
                    rt_count: 0,
                });
                rows.last_mut().unwrap()
            }
        };
        row.sessions += 1;
        row.best_level = row.best_level.max(s.level);
        row.correct += s.correct_count;
        row.trials += s.total_trials;
        if s.average_reaction_time_ms > 0 {
            row.rt_sum += s.average_reaction_time_ms as u64;
            row.rt_count += 1;
        }
    }
    rows.sort_by(|a, b| a.module_id.cmp(&b.module_id));

    out.push_str("## Per-module results\n\n");
    out.push_str("| Module | Sessions | Best level | Accuracy | Mean RT |\n");
    out.push_str("|---|---:|---:|---:|---:|\n");
    for r in &rows {
        let accuracy = if r.trials > 0 {
            100.0 * r.correct as f32 / r.trials as f32
        } else {
            0.0
        };
        let rt = if r.rt_count > 0 {
            format!("{} ms", r.rt_sum / r.rt_count as u64)
        } else {
            "n/a".to_string()
        };
        out.push_str(&format!(
            "| {} | {} | {} | {:.0}% | {} |\n",
            module_name(&r.module_id),
            r.sessions,
            r.best_level,
            accuracy,
            rt
        ));
    }
    out.push('\n');

    out.push_str("## Recent sessions\n\n");
    out.push_str("| Module | Level | Correct | Errors | Trials | Mean RT |\n");
    out.push_str("|---|---:|---:|---:|---:|---:|\n");
    for s in sessions.iter().take(20) {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} ms |\n",
            module_name(&s.module_id),
            s.level,
            s.correct_count,
            s.error_count,
            s.total_trials,
            s.average_reaction_time_ms
        ));
    }
    out.push('\n');
    out
}

/// File-system-safe file stem from the user's display name.
fn sanitize_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if out.is_empty() {
        out.push_str("user");
    }
    out
}

/// Render and write the report; returns the written path.
pub fn export_report(
    dir: &Path,
    user: &User,
    sessions: &[SessionResult],
    profile: &CognitiveProfile,
    module_name: &dyn Fn(&str) -> String,
) -> Result<PathBuf, ReportError> {
    if sessions.is_empty() {
        return Err(ReportError::EmptyHistory(user.id.clone()));
    }
    let text = render_markdown(user, sessions, profile, module_name);
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}_report.md", sanitize_name(&user.name)));
    fs::write(&path, text)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(level: u32, score: u32, errors: u32) -> SessionState {
        SessionState {
            level,
            score,
            errors,
            trials: score + errors,
            is_playing: false,
            is_paused: false,
        }
    }

    #[test]
    fn finish_with_no_reaction_times_yields_zero() {
        let d = finish(&state(3, 5, 2), &[]);
        assert_eq!(d.average_reaction_time_ms, 0);
        assert_eq!(d.level, 3);
        assert_eq!(d.correct_count, 5);
        assert_eq!(d.error_count, 2);
        assert_eq!(d.total_trials, 7);
    }

    #[test]
    fn finish_averages_reaction_times() {
        let d = finish(&state(1, 3, 0), &[100, 200, 300]);
        assert_eq!(d.average_reaction_time_ms, 200);
    }

    #[test]
    fn report_contains_headings_and_module_names() {
        let user = User {
            id: "u1".to_string(),
            name: "Ana María".to_string(),
            created_at: 0,
        };
        let sessions = vec![SessionResult {
            id: "s1".to_string(),
            user_id: "u1".to_string(),
            module_id: "stroop".to_string(),
            timestamp: 99,
            duration_seconds: 120,
            level: 7,
            correct_count: 18,
            error_count: 6,
            total_trials: 24,
            average_reaction_time_ms: 710,
        }];
        let profile = CognitiveProfile::from_sessions(&sessions, |_| "executive".to_string());
        let text = render_markdown(&user, &sessions, &profile, &|id| {
            if id == "stroop" {
                "Stroop".to_string()
            } else {
                id.to_string()
            }
        });
        assert!(text.contains("# Training report - Ana María"));
        assert!(!text.contains('\u{2014}'));
        assert!(text.contains("## Cognitive profile"));
        assert!(text.contains("| executive |"));
        assert!(text.contains("| Stroop |"));
        assert!(text.contains("710 ms"));
    }

    #[test]
    fn export_refuses_empty_history_and_sanitizes_names() {
        let user = User {
            id: "u1".to_string(),
            name: "a/b c".to_string(),
            created_at: 0,
        };
        let dir = std::env::temp_dir().join("neurotrain-report-test");
        let err = export_report(&dir, &user, &[], &CognitiveProfile::from_sessions(&[], |_| String::new()), &|id| id.to_string());
        assert!(matches!(err, Err(ReportError::EmptyHistory(_))));
        assert_eq!(sanitize_name("a/b c"), "a_b_c");
        assert_eq!(sanitize_name(""), "user");
    }
}
