//! Structured JSON-lines logging.
//!
//! Every record carries a run id, a sequence number, a level and a domain.
//! Records go to stderr (stdout is reserved for command output) and, when
//! `LOG_DIR` is set, to `events.jsonl` / `trace.jsonl` under `LOG_DIR/<run_id>`.
//!
//! Environment:
//! - `LOG_LEVEL`: trace, debug, info (default), warn, error
//! - `LOG_DOMAINS`: comma-separated domains or `all` (default)
//! - `LOG_DIR`: enables the file sink
//! - `RUN_ID`: overrides the generated run id

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

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
        Self::parse(std::env::var("LOG_LEVEL").as_deref().unwrap_or("info"))
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "trace" => Level::Trace,
            "debug" => Level::Debug,
            "warn" => Level::Warn,
            "error" => Level::Error,
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

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Session, // Form validation, login, logout, route guard
    Upload,  // File selection, prediction results
    Http,    // Requests to the prediction service
    System,  // Startup, config
    Profile, // Timings
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Session => "session",
            Domain::Upload => "upload",
            Domain::Http => "http",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct FileSink {
    events: Mutex<BufWriter<File>>,
    trace: Mutex<BufWriter<File>>,
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    files: Option<FileSink>,
}

fn open_file_sink(run_id: &str) -> Option<FileSink> {
    let base = std::env::var("LOG_DIR").ok()?;
    let mut run_dir = PathBuf::from(base);
    run_dir.push(run_id);
    if let Err(err) = create_dir_all(&run_dir) {
        eprintln!("[log] failed to create run dir: {}", err);
        return None;
    }
    let open = |name: &str| match File::create(run_dir.join(name)) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", name, err);
            None
        }
    };
    Some(FileSink {
        events: open("events.jsonl")?,
        trace: open("trace.jsonl")?,
    })
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let files = open_file_sink(&run_id);
        RunContext { run_id, files }
    })
}

pub fn run_id() -> String {
    ensure_run_context().run_id.clone()
}

const REDACTED_KEYS: [&str; 5] = [
    "password",
    "confirm_password",
    "email",
    "authorization",
    "Authorization",
];

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in REDACTED_KEYS {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["upload_id", "file", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Mutex<BufWriter<File>>, line: &str) {
    if let Ok(mut w) = writer.lock() {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    let ctx = ensure_run_context();
    let line = format_record(&ctx.run_id, next_seq(), level, domain, event, fields);
    if let Some(files) = &ctx.files {
        match level {
            Level::Trace | Level::Debug => write_line(&files.trace, &line),
            _ => write_line(&files.events, &line),
        }
    }
    eprintln!("{}", line);
}

fn format_record(
    run_id: &str,
    seq: u64,
    level: Level,
    domain: Domain,
    event: &str,
    fields: Map<String, Value>,
) -> String {
    let fields = sanitize_fields(fields);
    let (mut top, data) = split_fields(fields);

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(seq));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));
    Value::Object(entry).to_string()
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_form_rejected(mode: &str, fields: &[&str]) {
    log(
        Level::Info,
        Domain::Session,
        "form_rejected",
        obj(&[
            ("mode", v_str(mode)),
            ("fields", Value::Array(fields.iter().map(|f| v_str(f)).collect())),
        ]),
    );
}

pub fn log_login() {
    log(Level::Info, Domain::Session, "login", obj(&[("msg", v_str("session flag set"))]));
}

pub fn log_signup() {
    log(
        Level::Info,
        Domain::Session,
        "signup",
        obj(&[("msg", v_str("account created locally, no backend call"))]),
    );
}

pub fn log_logout(was_authenticated: bool) {
    log(
        Level::Info,
        Domain::Session,
        "logout",
        obj(&[("was_authenticated", Value::Bool(was_authenticated))]),
    );
}

pub fn log_guard(view: &str, allowed: bool) {
    log(
        if allowed { Level::Debug } else { Level::Info },
        Domain::Session,
        "guard",
        obj(&[("view", v_str(view)), ("allowed", Value::Bool(allowed))]),
    );
}

pub fn log_file_selected(file: &str, size: usize, upload_id: &str) {
    log(
        Level::Debug,
        Domain::Upload,
        "file_selected",
        obj(&[
            ("file", v_str(file)),
            ("upload_id", v_str(upload_id)),
            ("bytes", json!(size)),
        ]),
    );
}

pub fn log_upload_skipped(reason: &str) {
    log(Level::Warn, Domain::Upload, "upload_skipped", obj(&[("reason", v_str(reason))]));
}

pub fn log_request(method: &str, url: &str, upload_id: Option<&str>) {
    let mut fields = obj(&[("method", v_str(method)), ("url", v_str(url))]);
    if let Some(id) = upload_id {
        fields.insert("upload_id".to_string(), v_str(id));
    }
    log(Level::Debug, Domain::Http, "request", fields);
}

pub fn log_request_failed(url: &str, detail: &str) {
    log(
        Level::Error,
        Domain::Http,
        "request_failed",
        obj(&[("url", v_str(url)), ("msg", v_str(detail))]),
    );
}

pub fn log_predictions(upload_id: &str, total: u64, fraud: u64, safe: u64, accuracy: Option<f64>) {
    log(
        Level::Info,
        Domain::Upload,
        "predictions",
        obj(&[
            ("upload_id", v_str(upload_id)),
            ("total", json!(total)),
            ("fraud", json!(fraud)),
            ("safe", json!(safe)),
            ("accuracy", accuracy.map(v_num).unwrap_or(Value::Null)),
        ]),
    );
}

pub fn log_system(event: &str, fields: &[(&str, Value)]) {
    log(Level::Info, Domain::System, event, obj(fields));
}

// =============================================================================
// Helpers
// =============================================================================

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

// =============================================================================
// Profiling Scope
// =============================================================================

/// Emits a trace record with the elapsed time on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Map<String, Value>,
    started: Instant,
}

impl ProfileScope {
    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: obj(fields),
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = std::mem::take(&mut self.context);
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}
