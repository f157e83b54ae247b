//! CLI client for the `neurotraind` daemon.
//!
//! Examples:
//!   neurotrain-cli users
//!   neurotrain-cli adduser "Ana"
//!   neurotrain-cli modules
//!   neurotrain-cli start u-1a2b3c4d stroop
//!   neurotrain-cli input red
//!   neurotrain-cli stop
//!   neurotrain-cli report u-1a2b3c4d
//!
//! By default it talks to 127.0.0.1:9941; override with `--addr host:port`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::process;
use std::time::Duration;

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
    ImportSnapshot { snapshot: Value },
    SaveBackup,
    LoadBackup,
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Response {
    Users { users: Vec<UserRow> },
    User(UserRow),
    Modules { modules: Vec<ModuleRow> },
    Session(Box<SessionView>),
    Sessions { sessions: Vec<SessionRow> },
    Result(SessionRow),
    Profile(ProfileView),
    Snapshot(Value),
    Success { message: String },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRow {
    id: String,
    name: String,
    created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModuleRow {
    id: String,
    name: String,
    category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRow {
    id: String,
    user_id: String,
    module_id: String,
    timestamp: u64,
    duration_seconds: u32,
    level: u32,
    correct_count: u32,
    error_count: u32,
    total_trials: u32,
    average_reaction_time_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateView {
    level: u32,
    score: u32,
    errors: u32,
    trials: u32,
    is_playing: bool,
    is_paused: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrialRow {
    stimulus: Value,
    #[serde(default)]
    options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionView {
    user_id: String,
    module_id: String,
    phase: String,
    state: StateView,
    #[serde(default)]
    trial: Option<TrialRow>,
    #[serde(default)]
    last_outcome: Option<String>,
    #[serde(default)]
    accuracy: f32,
    #[serde(default)]
    recent_rate: f32,
    elapsed_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoryRow {
    category: String,
    sessions: u32,
    total_trials: u32,
    best_level: u32,
    accuracy: f32,
    score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileView {
    overall: f32,
    categories: Vec<CategoryRow>,
}

fn usage() -> ! {
    eprintln!("neurotrain-cli (talks to neurotraind @ 127.0.0.1:9941 by default)");
    eprintln!("Usage: neurotrain-cli [--addr host:port] <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  users                       List users");
    eprintln!("  adduser <name>              Create a user");
    eprintln!("  deluser <id>                Delete a user and their history");
    eprintln!("  modules                     List training modules");
    eprintln!("  start <user_id> <module>    Start a session");
    eprintln!("  session                     Show the active session");
    eprintln!("  input <action>              Answer the current trial");
    eprintln!("  pause | resume              Suspend / continue the session");
    eprintln!("  stop                        End the session and record it");
    eprintln!("  sessions <user_id>          List a user's session history");
    eprintln!("  profile <user_id>           Show per-category analytics");
    eprintln!("  report <user_id>            Export the progress report");
    eprintln!("  export <file>               Write a store snapshot to a JSON file");
    eprintln!("  import <file>               Replace the store from a JSON file");
    eprintln!("  backup | restore            Binary backup controls");
    eprintln!("  shutdown                    Stop the daemon");
    process::exit(1);
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let mut addr = "127.0.0.1:9941".to_string();
    if args.len() >= 2 && args[0] == "--addr" {
        addr = args[1].clone();
        args.drain(0..2);
    }

    if args.is_empty() {
        usage();
    }

    (addr, args)
}

fn send_request(addr: &str, req: &Request) -> Result<Response, String> {
    let mut stream = TcpStream::connect(addr).map_err(|e| format!("connect: {e}"))?;
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .map_err(|e| format!("set_read_timeout: {e}"))?;
    let mut reader = BufReader::new(stream.try_clone().map_err(|e| format!("clone: {e}"))?);

    let line = serde_json::to_string(req).map_err(|e| format!("serialize: {e}"))?;
    stream
        .write_all(line.as_bytes())
        .and_then(|_| stream.write_all(b"\n"))
        .map_err(|e| format!("send: {e}"))?;

    let mut resp_line = String::new();
    reader
        .read_line(&mut resp_line)
        .map_err(|e| format!("recv: {e}"))?;
    serde_json::from_str(&resp_line).map_err(|e| format!("parse response: {e}"))
}

fn print_session(s: &SessionView) {
    println!(
        "module={} phase={} level={} score={} errors={} trials={} paused={} elapsed={}s",
        s.module_id,
        s.phase,
        s.state.level,
        s.state.score,
        s.state.errors,
        s.state.trials,
        s.state.is_paused,
        s.elapsed_seconds,
    );
    if s.state.trials > 0 {
        println!(
            "accuracy: {:.0}% (recent {:.0}%)",
            s.accuracy * 100.0,
            s.recent_rate * 100.0,
        );
    }
    if let Some(outcome) = &s.last_outcome {
        println!("last outcome: {outcome}");
    }
    if let Some(trial) = &s.trial {
        println!("stimulus: {}", trial.stimulus);
        if !trial.options.is_empty() {
            println!("options: {}", trial.options.join(" | "));
        }
    }
}

fn print_result(r: &SessionRow) {
    println!(
        "session {} recorded: module={} level={} correct={} errors={} trials={} avg_rt={}ms duration={}s",
        r.id,
        r.module_id,
        r.level,
        r.correct_count,
        r.error_count,
        r.total_trials,
        r.average_reaction_time_ms,
        r.duration_seconds,
    );
}

fn main() {
    let (addr, args) = parse_args();
    let cmd = &args[0];

    let make_error = |msg: &str| -> ! {
        eprintln!("{}", msg);
        process::exit(1);
    };

    let req = match cmd.as_str() {
        "users" => Request::ListUsers,
        "adduser" => {
            if args.len() < 2 {
                usage();
            }
            Request::AddUser {
                name: args[1..].join(" "),
            }
        }
        "deluser" => {
            if args.len() < 2 {
                usage();
            }
            Request::DeleteUser {
                id: args[1].clone(),
            }
        }
        "modules" => Request::ListModules,
        "start" => {
            if args.len() < 3 {
                usage();
            }
            Request::StartSession {
                user_id: args[1].clone(),
                module_id: args[2].clone(),
            }
        }
        "session" => Request::GetSession,
        "input" => {
            if args.len() < 2 {
                usage();
            }
            Request::Input {
                action: args[1..].join(" "),
            }
        }
        "pause" => Request::PauseSession,
        "resume" => Request::ResumeSession,
        "stop" => Request::StopSession,
        "sessions" => {
            if args.len() < 2 {
                usage();
            }
            Request::ListSessions {
                user_id: args[1].clone(),
            }
        }
        "profile" => {
            if args.len() < 2 {
                usage();
            }
            Request::GetProfile {
                user_id: args[1].clone(),
            }
        }
        "report" => {
            if args.len() < 2 {
                usage();
            }
            Request::ExportReport {
                user_id: args[1].clone(),
            }
        }
        "export" => {
            if args.len() < 2 {
                usage();
            }
            Request::ExportSnapshot
        }
        "import" => {
            if args.len() < 2 {
                usage();
            }
            let text = std::fs::read_to_string(&args[1])
                .unwrap_or_else(|e| make_error(&format!("failed to read {}: {e}", args[1])));
            let snapshot: Value = serde_json::from_str(&text)
                .unwrap_or_else(|e| make_error(&format!("{} is not valid JSON: {e}", args[1])));
            Request::ImportSnapshot { snapshot }
        }
        "backup" => Request::SaveBackup,
        "restore" => Request::LoadBackup,
        "shutdown" => Request::Shutdown,
        _ => usage(),
    };

    match send_request(&addr, &req) {
        Ok(Response::Users { users }) => {
            for u in users {
                println!("{}  {}", u.id, u.name);
            }
        }
        Ok(Response::User(u)) => println!("created {}  {}", u.id, u.name),
        Ok(Response::Modules { modules }) => {
            for m in modules {
                println!("{:<18} {:<14} {}", m.id, m.category, m.name);
            }
        }
        Ok(Response::Session(s)) => print_session(&s),
        Ok(Response::Sessions { sessions }) => {
            for s in sessions {
                println!(
                    "{}  {:<18} level={:<3} correct={:<4} errors={:<4} trials={:<4} avg_rt={}ms",
                    s.id,
                    s.module_id,
                    s.level,
                    s.correct_count,
                    s.error_count,
                    s.total_trials,
                    s.average_reaction_time_ms,
                );
            }
        }
        Ok(Response::Result(r)) => print_result(&r),
        Ok(Response::Profile(p)) => {
            println!("overall score: {:.1} / 100", p.overall);
            for c in p.categories {
                println!(
                    "{:<16} sessions={:<4} best_level={:<3} accuracy={:.0}% score={:.1}",
                    c.category,
                    c.sessions,
                    c.best_level,
                    c.accuracy * 100.0,
                    c.score,
                );
            }
        }
        Ok(Response::Snapshot(snapshot)) => {
            // `export <file>` is the only command that yields a snapshot.
            let path = &args[1];
            let text = serde_json::to_string_pretty(&snapshot)
                .unwrap_or_else(|e| make_error(&format!("serialize snapshot: {e}")));
            std::fs::write(path, text)
                .unwrap_or_else(|e| make_error(&format!("failed to write {path}: {e}")));
            println!("snapshot written to {path}");
        }
        Ok(Response::Success { message }) => println!("{message}"),
        Ok(Response::Error { message }) => {
            eprintln!("Error: {message}");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed: {e}");
            process::exit(1);
        }
    }
}
