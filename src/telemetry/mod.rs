//! Logging setup and per-process call counters
//!
//! Logs always go to stderr; stdout belongs to the protocol stream.

use crate::cli::Verbosity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity flags. Calling this twice
/// is harmless; the second install is ignored.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cli_vision_mcp={}", verbosity.log_level())));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

/// Telemetry statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub calls_started: usize,
    pub calls_succeeded: usize,
    pub calls_failed: usize,
    pub protocol_errors: usize,
}

#[derive(Debug, Default)]
struct Counters {
    started: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    protocol_errors: AtomicUsize,
}

/// Lock-free counters shared by every request task
#[derive(Debug, Clone)]
pub struct TelemetryCollector {
    counters: Arc<Counters>,
    start_time: Instant,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            start_time: Instant::now(),
        }
    }

    pub fn call_started(&self) {
        self.counters.started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn call_finished(&self, success: bool) {
        let counter = if success {
            &self.counters.succeeded
        } else {
            &self.counters.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Malformed request, unknown method or unknown tool
    pub fn protocol_error(&self) {
        self.counters.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> CallStats {
        CallStats {
            calls_started: self.counters.started.load(Ordering::Relaxed),
            calls_succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            calls_failed: self.counters.failed.load(Ordering::Relaxed),
            protocol_errors: self.counters.protocol_errors.load(Ordering::Relaxed),
        }
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Fraction of finished calls that succeeded, 1.0 when none finished
    pub fn success_rate(&self) -> f64 {
        let stats = self.get_stats();
        let total = stats.calls_succeeded + stats.calls_failed;
        if total == 0 {
            1.0
        } else {
            stats.calls_succeeded as f64 / total as f64
        }
    }

    /// One-line summary for the shutdown log
    pub fn summary(&self) -> String {
        let stats = self.get_stats();
        format!(
            "served {} tool calls in {:?} ({} ok, {} failed, {:.1}% success, {} protocol errors)",
            stats.calls_started,
            self.elapsed(),
            stats.calls_succeeded,
            stats.calls_failed,
            self.success_rate() * 100.0,
            stats.protocol_errors
        )
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}
