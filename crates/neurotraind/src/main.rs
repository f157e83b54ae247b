//! Neurotrain daemon - background training service
//!
//! The daemon owns the data store and at most one live training session,
//! and serves a JSON-line protocol over local TCP:
//! - User management and session history
//! - Session control (start, input, pause, resume, stop)
//! - Analytics, report export, snapshot exchange and binary backups
//!
//! Storage locations:
//! - Linux: ~/.local/share/neurotrain/
//! - Windows: %APPDATA%\neurotrain\
//! - MacOS: ~/Library/Application Support/neurotrain/

use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio::time;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{error, info, warn};

use neurotrain::profile::CognitiveProfile;
use neurotrain::schedule::TimerCmd;
use neurotrain::store::{
    now_ms, IdGen, SessionResult, Snapshot, StoreError, TrainingStore, User,
};
use neurotrain_modules::ModuleInfo;

mod paths;
mod session;

use paths::AppPaths;
use session::{ActiveSession, SessionSnapshot};

const LISTEN_ADDR: &str = "127.0.0.1:9941";

// ═══════════════════════════════════════════════════════════════════════════
// Protocol Messages
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Request {
    ListUsers,
    AddUser { name: String },
    DeleteUser { id: String },
    ListModules,
    StartSession { user_id: String, module_id: String },
    GetSession,
    Input { action: String },
    PauseSession,
    ResumeSession,
    StopSession,
    ListSessions { user_id: String },
    GetProfile { user_id: String },
    ExportReport { user_id: String },
    ExportSnapshot,
    ImportSnapshot { snapshot: Snapshot },
    SaveBackup,
    LoadBackup,
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Response {
    // Tagged serialization cannot carry bare sequences, so the list
    // variants wrap their payload in a field.
    Users { users: Vec<User> },
    User(User),
    Modules { modules: Vec<ModuleInfo> },
    Session(SessionSnapshot),
    Sessions { sessions: Vec<SessionResult> },
    Result(SessionResult),
    Profile(CognitiveProfile),
    Snapshot(Snapshot),
    Success { message: String },
    Error { message: String },
}

fn err(message: impl Into<String>) -> Response {
    Response::Error {
        message: message.into(),
    }
}

fn ok(message: impl Into<String>) -> Response {
    Response::Success {
        message: message.into(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Daemon State
// ═══════════════════════════════════════════════════════════════════════════

struct DaemonState {
    paths: AppPaths,
    store: TrainingStore,
    ids: IdGen,
    seeds: neurotrain::prng::Prng,
    active: Option<ActiveSession>,
    /// Monotonic; stamped into each started session and its timer chains.
    session_generation: u64,
}

impl DaemonState {
    fn new(paths: AppPaths) -> Self {
        let store = TrainingStore::open(paths.data_dir());
        let seed = now_ms();
        Self {
            paths,
            store,
            ids: IdGen::new(seed),
            seeds: neurotrain::prng::Prng::new(seed.rotate_left(17)),
            active: None,
            session_generation: 0,
        }
    }

    fn next_seed(&mut self) -> u64 {
        ((self.seeds.next_u32() as u64) << 32) | self.seeds.next_u32() as u64
    }

    fn add_user(&mut self, name: String) -> Result<User, StoreError> {
        let user = User {
            id: self.ids.user_id(),
            name,
            created_at: now_ms(),
        };
        self.store.add_user(user.clone())?;
        info!(id = %user.id, "user created");
        Ok(user)
    }

    fn delete_user(&mut self, id: &str) -> Result<(), StoreError> {
        // An in-flight session for this user dies unrecorded with them.
        if self.active.as_ref().is_some_and(|a| a.user_id == id) {
            if let Some(mut a) = self.active.take() {
                let _ = a.stop();
                warn!(user = id, "active session discarded with deleted user");
            }
        }
        self.store.delete_user(id)
    }

    /// Start a session; returns the first timer to arm. An already-active
    /// session is stopped and discarded, not recorded.
    fn start_session(&mut self, user_id: String, module_id: &str) -> Result<TimerCmd, String> {
        if self.store.user(&user_id).is_none() {
            return Err(format!("unknown user: {user_id}"));
        }
        let seed = self.next_seed();
        let module = neurotrain_modules::create(module_id, seed)
            .ok_or_else(|| format!("unknown module: {module_id}"))?;
        if let Some(mut previous) = self.active.take() {
            let _ = previous.stop();
            warn!(user = %previous.user_id, "active session replaced and discarded");
        }
        self.session_generation += 1;
        info!(user = %user_id, module = module_id, "session started");
        let (active, cmd) = ActiveSession::start(user_id, module, seed, self.session_generation);
        self.active = Some(active);
        Ok(cmd)
    }

    /// Stop the active session, stamp the draft and persist the result.
    fn stop_session(&mut self) -> Result<SessionResult, String> {
        let mut active = self
            .active
            .take()
            .ok_or_else(|| "no active session".to_string())?;
        let draft = active.stop();
        let result = SessionResult {
            id: self.ids.session_id(),
            user_id: active.user_id.clone(),
            module_id: active.module_id().to_string(),
            timestamp: now_ms(),
            duration_seconds: active.elapsed_seconds(),
            level: draft.level,
            correct_count: draft.correct_count,
            error_count: draft.error_count,
            total_trials: draft.total_trials,
            average_reaction_time_ms: draft.average_reaction_time_ms,
        };
        self.store
            .append_session(result.clone())
            .map_err(|e| e.to_string())?;
        info!(
            id = %result.id,
            trials = result.total_trials,
            level = result.level,
            "session recorded"
        );
        Ok(result)
    }

    /// A timer fired. Routes the event into the active session; a stale
    /// token, a gone session, or a chain armed for an earlier (replaced)
    /// session is silently inert.
    fn timer_fired(&mut self, generation: u64, cmd: &TimerCmd) -> Option<TimerCmd> {
        let active = self.active.as_mut()?;
        if active.generation != generation {
            return None;
        }
        match *cmd {
            TimerCmd::Present { token, .. } => active.on_present(token),
            TimerCmd::Expire { token, .. } => active.on_expire(token),
            TimerCmd::Next { token, .. } => active.on_next(token),
        }
    }

    fn profile_for(&self, user_id: &str) -> Result<CognitiveProfile, String> {
        if self.store.user(user_id).is_none() {
            return Err(format!("unknown user: {user_id}"));
        }
        let sessions = self.store.sessions_for(user_id);
        Ok(CognitiveProfile::from_sessions(&sessions, |id| {
            neurotrain_modules::category_of(id)
                .map(|c| c.label().to_string())
                .unwrap_or_else(|| "unknown".to_string())
        }))
    }

    fn export_report(&self, user_id: &str) -> Result<String, String> {
        let user = self
            .store
            .user(user_id)
            .ok_or_else(|| format!("unknown user: {user_id}"))?;
        let sessions = self.store.sessions_for(user_id);
        let profile = self.profile_for(user_id)?;
        let path = neurotrain::report::export_report(
            &self.paths.reports_dir(),
            user,
            &sessions,
            &profile,
            &|id| {
                neurotrain_modules::name_of(id)
                    .map(str::to_string)
                    .unwrap_or_else(|| id.to_string())
            },
        )
        .map_err(|e| e.to_string())?;
        Ok(path.display().to_string())
    }

    fn save_backup(&self) -> Result<String, String> {
        let path = self.paths.backup_file();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {parent:?}: {e}"))?;
        }
        let mut file =
            File::create(&path).map_err(|e| format!("failed to create {path:?}: {e}"))?;
        neurotrain::archive::write_archive(&mut file, &self.store.export_snapshot())
            .map_err(|e| format!("failed to write backup: {e}"))?;
        info!("backup written to {:?}", path);
        Ok(path.display().to_string())
    }

    fn load_backup(&mut self) -> Result<(), String> {
        let path = self.paths.backup_file();
        if !path.exists() {
            return Err(format!("backup not found: {path:?}"));
        }
        let mut file = File::open(&path).map_err(|e| format!("failed to open {path:?}: {e}"))?;
        let snapshot = neurotrain::archive::read_archive(&mut file)
            .map_err(|e| format!("failed to read backup: {e}"))?;
        self.store
            .import_snapshot(snapshot)
            .map_err(|e| e.to_string())?;
        info!("backup restored from {:?}", path);
        Ok(())
    }

    /// Called on shutdown paths. Store mutations persist as they happen;
    /// only an in-flight session still needs recording.
    fn finalize(&mut self) {
        if self.active.is_some() {
            match self.stop_session() {
                Ok(r) => info!(id = %r.id, "in-flight session recorded on shutdown"),
                Err(e) => error!("failed to record in-flight session: {e}"),
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Timers
// ═══════════════════════════════════════════════════════════════════════════

/// Arm one timer command and keep following the chain it produces. Each
/// firing re-enters the state lock with its session generation and token;
/// the daemon drops chains from replaced sessions and the schedule drops
/// anything token-stale, either of which ends the chain.
fn arm_timer(state: Arc<RwLock<DaemonState>>, generation: u64, first: TimerCmd) {
    tokio::spawn(async move {
        let mut cmd = first;
        loop {
            time::sleep(cmd.after()).await;
            let next = {
                let mut s = state.write().await;
                s.timer_fired(generation, &cmd)
            };
            match next {
                Some(n) => cmd = n,
                None => break,
            }
        }
    });
}

// ═══════════════════════════════════════════════════════════════════════════
// Client Handler
// ═══════════════════════════════════════════════════════════════════════════

async fn dispatch(state: &Arc<RwLock<DaemonState>>, request: Request) -> Response {
    match request {
        Request::ListUsers => {
            let s = state.read().await;
            Response::Users {
                users: s.store.users().to_vec(),
            }
        }
        Request::AddUser { name } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return err("user name must not be empty");
            }
            let mut s = state.write().await;
            match s.add_user(name) {
                Ok(user) => Response::User(user),
                Err(e) => err(e.to_string()),
            }
        }
        Request::DeleteUser { id } => {
            let mut s = state.write().await;
            match s.delete_user(&id) {
                Ok(()) => ok(format!("deleted user {id}")),
                Err(e) => err(e.to_string()),
            }
        }
        Request::ListModules => Response::Modules {
            modules: neurotrain_modules::catalog(),
        },
        Request::StartSession { user_id, module_id } => {
            let mut s = state.write().await;
            match s.start_session(user_id, &module_id) {
                Ok(cmd) => {
                    let generation = s.session_generation;
                    let snapshot = s.active.as_ref().map(|a| a.snapshot());
                    drop(s);
                    arm_timer(Arc::clone(state), generation, cmd);
                    match snapshot {
                        Some(snap) => Response::Session(snap),
                        None => err("session vanished during start"),
                    }
                }
                Err(e) => err(e),
            }
        }
        Request::GetSession => {
            let s = state.read().await;
            match &s.active {
                Some(a) => Response::Session(a.snapshot()),
                None => err("no active session"),
            }
        }
        Request::Input { action } => {
            let mut s = state.write().await;
            let Some(active) = s.active.as_mut() else {
                return err("no active session");
            };
            let generation = active.generation;
            let cmd = active.input(&action);
            let snapshot = active.snapshot();
            drop(s);
            if let Some(cmd) = cmd {
                arm_timer(Arc::clone(state), generation, cmd);
            }
            Response::Session(snapshot)
        }
        Request::PauseSession => {
            let mut s = state.write().await;
            match s.active.as_mut() {
                Some(a) => {
                    a.pause();
                    Response::Session(a.snapshot())
                }
                None => err("no active session"),
            }
        }
        Request::ResumeSession => {
            let mut s = state.write().await;
            let Some(active) = s.active.as_mut() else {
                return err("no active session");
            };
            let generation = active.generation;
            let cmd = active.resume();
            let snapshot = active.snapshot();
            drop(s);
            if let Some(cmd) = cmd {
                arm_timer(Arc::clone(state), generation, cmd);
            }
            Response::Session(snapshot)
        }
        Request::StopSession => {
            let mut s = state.write().await;
            match s.stop_session() {
                Ok(result) => Response::Result(result),
                Err(e) => err(e),
            }
        }
        Request::ListSessions { user_id } => {
            let s = state.read().await;
            if s.store.user(&user_id).is_none() {
                return err(format!("unknown user: {user_id}"));
            }
            Response::Sessions {
                sessions: s.store.sessions_for(&user_id),
            }
        }
        Request::GetProfile { user_id } => {
            let s = state.read().await;
            match s.profile_for(&user_id) {
                Ok(profile) => Response::Profile(profile),
                Err(e) => err(e),
            }
        }
        Request::ExportReport { user_id } => {
            let s = state.read().await;
            match s.export_report(&user_id) {
                Ok(path) => ok(format!("report written to {path}")),
                Err(e) => err(e),
            }
        }
        Request::ExportSnapshot => {
            let s = state.read().await;
            Response::Snapshot(s.store.export_snapshot())
        }
        Request::ImportSnapshot { snapshot } => {
            let mut s = state.write().await;
            match s.store.import_snapshot(snapshot) {
                Ok(()) => ok("snapshot imported"),
                Err(e) => err(e.to_string()),
            }
        }
        Request::SaveBackup => {
            let s = state.read().await;
            match s.save_backup() {
                Ok(path) => ok(format!("backup written to {path}")),
                Err(e) => err(e),
            }
        }
        Request::LoadBackup => {
            let mut s = state.write().await;
            match s.load_backup() {
                Ok(()) => ok("backup restored"),
                Err(e) => err(e),
            }
        }
        Request::Shutdown => {
            let mut s = state.write().await;
            s.finalize();
            info!("shutdown requested");
            tokio::spawn(async {
                // Give the response a moment to flush before exiting.
                time::sleep(Duration::from_millis(50)).await;
                std::process::exit(0);
            });
            ok("shutting down")
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    state: Arc<RwLock<DaemonState>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut framed = Framed::new(stream, LinesCodec::new());

    while let Some(line) = framed.next().await {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatch(&state, request).await,
            Err(e) => err(format!("invalid request: {e}")),
        };
        framed.send(serde_json::to_string(&response)?).await?;
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Main
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // NEUROTRAIN_DATA_DIR overrides the platform data directory.
    let paths = match std::env::var_os("NEUROTRAIN_DATA_DIR") {
        Some(dir) => AppPaths::at(std::path::PathBuf::from(dir))?,
        None => AppPaths::new()?,
    };
    info!("Data directory: {:?}", paths.data_dir());

    let state = Arc::new(RwLock::new(DaemonState::new(paths)));

    // Record any in-flight session if the daemon is stopped abruptly.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let mut s = state.write().await;
                s.finalize();
                info!("Ctrl-C: state persisted");
                std::process::exit(0);
            }
        });
    }

    let listener = TcpListener::bind(LISTEN_ADDR).await?;
    info!("Neurotrain daemon listening on {LISTEN_ADDR}");

    loop {
        let (stream, addr) = listener.accept().await?;
        info!("Client connected: {}", addr);
        let state_clone = Arc::clone(&state);

        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, state_clone).await {
                error!("Client handler error: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_user(tag: &str) -> (DaemonState, String, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "neurotraind-test-{tag}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        let paths = AppPaths::at(dir.clone()).unwrap();
        let mut state = DaemonState::new(paths);
        let user = state.add_user("Tester".to_string()).unwrap();
        (state, user.id, dir)
    }

    #[test]
    fn replaced_session_timers_are_inert() {
        let (mut state, user, dir) = state_with_user("replace");
        let first = state.start_session(user.clone(), "reaction").unwrap();
        let first_generation = state.session_generation;

        // Both sessions number their schedule tokens from 1, so the old
        // chain's token would be accepted by the replacement. The session
        // generation stamped into the chain is what keeps it inert.
        let _ = state.start_session(user, "stroop").unwrap();
        assert!(state.timer_fired(first_generation, &first).is_none());

        let active = state.active.as_ref().unwrap();
        assert_eq!(active.module_id(), "stroop");
        let snap = active.snapshot();
        assert!(snap.trial.is_none());
        assert_eq!(snap.state.trials, 0);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn current_session_timers_still_fire() {
        let (mut state, user, dir) = state_with_user("current");
        let first = state.start_session(user, "reaction").unwrap();
        let generation = state.session_generation;

        assert!(state.timer_fired(generation, &first).is_some());
        let snap = state.active.as_ref().unwrap().snapshot();
        assert_eq!(snap.phase, "presented");

        let _ = std::fs::remove_dir_all(dir);
    }
}
