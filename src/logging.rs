//! Structured JSON logging.
//!
//! Every entry is one JSON object per line, written to stderr and appended
//! to a run-scoped events.jsonl so a session can be replayed after the
//! fact. Level and domain filtering come from the environment (LOG_LEVEL,
//! LOG_DOMAINS) so noisy domains can be silenced per run.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Match,   // match lifecycle: record, delete, recalculation
    Rating,  // skill updates
    Store,   // database open/init/clear
    Predict, // win-probability runs
    Page,    // dashboard generation
    System,  // startup, config, errors
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Match => "match",
            Domain::Rating => "rating",
            Domain::Store => "store",
            Domain::Predict => "predict",
            Domain::Page => "page",
            Domain::System => "system",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list, or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let base = std::env::var("LOG_DIR").unwrap_or_else(|_| "out/runs".to_string());
        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);

        let events = match create_dir_all(&run_dir) {
            Ok(()) => {
                let _ = std::fs::write(
                    run_dir.join("manifest.json"),
                    json!({
                        "run_id": run_id,
                        "ts": ts_now(),
                        "pid": process::id(),
                        "log_dir": run_dir.to_string_lossy(),
                    })
                    .to_string(),
                );
                File::create(run_dir.join("events.jsonl"))
                    .ok()
                    .map(|f| Mutex::new(BufWriter::new(f)))
            }
            Err(err) => {
                eprintln!("[log] failed to create run dir: {}", err);
                None
            }
        };

        RunContext { run_id, events }
    })
}

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry.
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }

    let ctx = ensure_run_context();
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("domain".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("data".to_string(), Value::Object(fields));

    let line = Value::Object(entry).to_string();
    if let Some(events) = &ctx.events {
        if let Ok(mut w) = events.lock() {
            let _ = writeln!(w, "{}", line);
            let _ = w.flush();
        }
    }
    eprintln!("{}", line);
}

// ---------------------------------------------------------------------------
// Domain helpers
// ---------------------------------------------------------------------------

pub fn log_match_recorded(match_id: i64, p1: i64, p2: i64, score1: i64, score2: i64) {
    log(
        Level::Info,
        Domain::Match,
        "match_recorded",
        obj(&[
            ("match_id", json!(match_id)),
            ("player1_id", json!(p1)),
            ("player2_id", json!(p2)),
            ("score1", json!(score1)),
            ("score2", json!(score2)),
        ]),
    );
}

pub fn log_rating_update(player_id: i64, old_mu: f64, new_mu: f64, new_sigma: f64) {
    log(
        Level::Debug,
        Domain::Rating,
        "rating_update",
        obj(&[
            ("player_id", json!(player_id)),
            ("old_mu", v_num(old_mu)),
            ("new_mu", v_num(new_mu)),
            ("new_sigma", v_num(new_sigma)),
        ]),
    );
}

pub fn log_recalculation(replayed: usize) {
    log(
        Level::Info,
        Domain::Match,
        "ratings_recalculated",
        obj(&[("matches_replayed", json!(replayed))]),
    );
}

pub fn log_dashboard_written(dir: &str, pages: usize) {
    log(
        Level::Info,
        Domain::Page,
        "dashboard_written",
        obj(&[("dir", v_str(dir)), ("pages", json!(pages))]),
    );
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_obj_helper() {
        let m = obj(&[("key", v_str("value")), ("num", v_num(42.0))]);
        assert_eq!(m.get("key").unwrap(), "value");
        assert_eq!(m.get("num").unwrap(), 42.0);
    }

    #[test]
    fn test_seq_increments() {
        let s1 = next_seq();
        let s2 = next_seq();
        assert!(s2 > s1);
    }
}
