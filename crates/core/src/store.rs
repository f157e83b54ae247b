//! Flat persistence for users and their session results.
//!
//! Two logical collections, each a JSON array in its own file under the data
//! directory: `users.json` and `sessions.json`. The store loads both on open
//! and rewrites the touched file on every mutation. A file that is missing or
//! fails to parse is logged and treated as an empty collection; only an
//! explicit snapshot import reports malformed data to the caller.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::prng::Prng;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Unix milliseconds.
    pub created_at: u64,
}

/// Immutable record of one completed module session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub id: String,
    pub user_id: String,
    pub module_id: String,
    /// Unix milliseconds at session end.
    pub timestamp: u64,
    pub duration_seconds: u32,
    pub level: u32,
    pub correct_count: u32,
    pub error_count: u32,
    pub total_trials: u32,
    pub average_reaction_time_ms: u32,
}

/// Full-store snapshot, the exchange format for export/import and backups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub sessions: Vec<SessionResult>,
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Short unique-enough ids in the style `u-1a2b3c4d`.
#[derive(Debug)]
pub struct IdGen {
    prng: Prng,
}

impl IdGen {
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::new(seed),
        }
    }

    fn next(&mut self, prefix: char) -> String {
        let t = (now_ms() & 0xFFFF) as u32;
        let r = self.prng.next_u32();
        format!("{prefix}-{:04x}{:08x}", t, r)
    }

    pub fn user_id(&mut self) -> String {
        self.next('u')
    }

    pub fn session_id(&mut self) -> String {
        self.next('s')
    }
}

#[derive(Debug)]
pub struct TrainingStore {
    dir: PathBuf,
    users: Vec<User>,
    sessions: Vec<SessionResult>,
}

impl TrainingStore {
    /// Load both collections from `dir`, recovering silently from malformed
    /// or missing files.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let users = load_collection(&dir.join("users.json"));
        let sessions = load_collection(&dir.join("sessions.json"));
        info!(
            users = users.len(),
            sessions = sessions.len(),
            "training store opened"
        );
        Self {
            dir,
            users,
            sessions,
        }
    }

    /// In-memory store for tests and tooling; persistence calls still write
    /// under the given directory.
    pub fn empty(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            users: Vec::new(),
            sessions: Vec::new(),
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn add_user(&mut self, user: User) -> Result<(), StoreError> {
        self.users.push(user);
        self.persist_users()
    }

    /// Deletes the user and cascades to every session they own. Other users'
    /// sessions are untouched.
    pub fn delete_user(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        if self.users.len() == before {
            return Err(StoreError::UnknownUser(id.to_string()));
        }
        self.sessions.retain(|s| s.user_id != id);
        self.persist_users()?;
        self.persist_sessions()
    }

    pub fn append_session(&mut self, result: SessionResult) -> Result<(), StoreError> {
        if self.user(&result.user_id).is_none() {
            return Err(StoreError::UnknownUser(result.user_id));
        }
        self.sessions.push(result);
        self.persist_sessions()
    }

    /// All sessions for one user, newest first.
    pub fn sessions_for(&self, user_id: &str) -> Vec<SessionResult> {
        let mut out: Vec<SessionResult> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }

    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.clone(),
            sessions: self.sessions.clone(),
        }
    }

    /// Replace both collections wholesale. Unlike boot-time loading, a bad
    /// snapshot here is an error the caller sees.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<(), StoreError> {
        let mut seen: Vec<&str> = Vec::with_capacity(snapshot.users.len());
        for u in &snapshot.users {
            if u.id.is_empty() {
                return Err(StoreError::InvalidSnapshot("user with empty id".into()));
            }
            if seen.contains(&u.id.as_str()) {
                return Err(StoreError::InvalidSnapshot(format!(
                    "duplicate user id {}",
                    u.id
                )));
            }
            seen.push(&u.id);
        }
        for s in &snapshot.sessions {
            if !seen.contains(&s.user_id.as_str()) {
                return Err(StoreError::InvalidSnapshot(format!(
                    "session {} references unknown user {}",
                    s.id, s.user_id
                )));
            }
        }

        self.users = snapshot.users;
        self.sessions = snapshot.sessions;
        self.persist_users()?;
        self.persist_sessions()
    }

    fn persist_users(&self) -> Result<(), StoreError> {
        write_collection(&self.dir, "users.json", &self.users)
    }

    fn persist_sessions(&self) -> Result<(), StoreError> {
        write_collection(&self.dir, "sessions.json", &self.sessions)
    }
}

fn load_collection<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            warn!("failed to parse {:?}, starting empty: {e}", path);
            Vec::new()
        }
    }
}

fn write_collection<T: Serialize>(
    dir: &Path,
    name: &str,
    items: &[T],
) -> Result<(), StoreError> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_vec_pretty(items)?;
    fs::write(dir.join(name), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("neurotrain-store-{tag}-{}", now_ms()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            created_at: 0,
        }
    }

    fn session(id: &str, user_id: &str, timestamp: u64) -> SessionResult {
        SessionResult {
            id: id.to_string(),
            user_id: user_id.to_string(),
            module_id: "reaction".to_string(),
            timestamp,
            duration_seconds: 60,
            level: 4,
            correct_count: 12,
            error_count: 3,
            total_trials: 15,
            average_reaction_time_ms: 480,
        }
    }

    #[test]
    fn delete_user_cascades_exactly() {
        let dir = temp_dir("cascade");
        let mut store = TrainingStore::empty(&dir);
        store.add_user(user("u1", "A")).unwrap();
        store.add_user(user("u2", "B")).unwrap();
        store.append_session(session("s1", "u1", 10)).unwrap();
        store.append_session(session("s2", "u2", 20)).unwrap();
        store.append_session(session("s3", "u1", 30)).unwrap();

        store.delete_user("u1").unwrap();
        assert!(store.user("u1").is_none());
        assert!(store.sessions_for("u1").is_empty());
        let remaining = store.sessions_for("u2");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "s2");

        assert!(matches!(
            store.delete_user("u1"),
            Err(StoreError::UnknownUser(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn sessions_sorted_newest_first() {
        let dir = temp_dir("sort");
        let mut store = TrainingStore::empty(&dir);
        store.add_user(user("u1", "A")).unwrap();
        store.append_session(session("s1", "u1", 100)).unwrap();
        store.append_session(session("s2", "u1", 300)).unwrap();
        store.append_session(session("s3", "u1", 200)).unwrap();
        let ids: Vec<String> = store
            .sessions_for("u1")
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["s2", "s3", "s1"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn snapshot_round_trip_is_byte_identical() {
        let dir = temp_dir("roundtrip");
        let mut store = TrainingStore::empty(&dir);
        let snapshot = Snapshot {
            users: vec![user("u1", "A")],
            sessions: vec![session("s1", "u1", 42)],
        };
        let original = serde_json::to_string(&snapshot).unwrap();
        store.import_snapshot(snapshot).unwrap();
        let exported = serde_json::to_string(&store.export_snapshot()).unwrap();
        assert_eq!(original, exported);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn import_rejects_orphan_sessions_and_duplicate_ids() {
        let dir = temp_dir("invalid");
        let mut store = TrainingStore::empty(&dir);
        let orphan = Snapshot {
            users: vec![user("u1", "A")],
            sessions: vec![session("s1", "u9", 1)],
        };
        assert!(matches!(
            store.import_snapshot(orphan),
            Err(StoreError::InvalidSnapshot(_))
        ));
        let dup = Snapshot {
            users: vec![user("u1", "A"), user("u1", "B")],
            sessions: vec![],
        };
        assert!(matches!(
            store.import_snapshot(dup),
            Err(StoreError::InvalidSnapshot(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn reload_sees_persisted_mutations() {
        let dir = temp_dir("reload");
        {
            let mut store = TrainingStore::empty(&dir);
            store.add_user(user("u1", "A")).unwrap();
            store.append_session(session("s1", "u1", 5)).unwrap();
        }
        let store = TrainingStore::open(&dir);
        assert_eq!(store.users().len(), 1);
        assert_eq!(store.sessions_for("u1").len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_file_loads_as_empty() {
        let dir = temp_dir("malformed");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("users.json"), b"{not json").unwrap();
        let store = TrainingStore::open(&dir);
        assert!(store.users().is_empty());
        let _ = fs::remove_dir_all(&dir);
    }
}
