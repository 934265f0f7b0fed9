//! Shelfmark RPC server: JSON-RPC over stdin/stdout for a UI shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.save", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Queued persistence writes are flushed after every request. Logs go to
//! stderr, filtered by `SHELFMARK_LOG`.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use shelfmark::app::App;
use shelfmark::rpc_handler::{handle_method, RpcContext};
use shelfmark::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

const LOG_ENV: &str = "SHELFMARK_LOG";

/// Fixed one-second window request limiter.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn emit(value: &Value) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{}", value);
    let _ = out.flush();
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let mut settings = SettingsEngine::new(None);
    let loaded = match settings.load() {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, path = %settings.get_config_path().display(), "settings unreadable, using defaults");
            settings.get_settings().clone()
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let app = match App::open(loaded) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to open local store");
            return ExitCode::FAILURE;
        }
    };
    let mut ctx = RpcContext::new(app, settings);
    let source = runtime.block_on(ctx.app.load());
    info!(?source, "shelfmark ready");

    emit(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));

    let mut rate_limiter = RateLimiter::new(200);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit(&json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            emit(&json!({"id": id, "error": "rate limit exceeded"}));
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let result = runtime.block_on(handle_method(&mut ctx, method, &params));
        let response = match result {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit(&response);

        let report = runtime.block_on(ctx.app.flush());
        if !report.failed.is_empty() {
            warn!(failed = ?report.failed, resynced = report.resynced, "flush had failures");
        }
    }

    runtime.block_on(ctx.app.shutdown());
    ExitCode::SUCCESS
}
