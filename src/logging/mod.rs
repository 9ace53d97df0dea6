//! Logging infrastructure - structured tracing throughout the runtime
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Zero-cost when no subscriber is installed
//! - Configurable level, JSON output and span events
//! - Optional non-blocking file output
//!
//! The runtime never installs a subscriber on its own; hosts call [`init`]
//! (or `runtime_init`) when they want output.

use std::io;
use std::path::Path;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

pub use tracing::{debug, error, info, trace, warn, Level};

static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Keeps the file writer thread alive until `shutdown`
static FILE_GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Log file path; console (stderr) when unset
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // ANYRT_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level) = std::env::var("ANYRT_LOG_LEVEL") {
            config.level = parse_level(&level).unwrap_or(Level::INFO);
        }

        // ANYRT_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("ANYRT_LOG_FILE") {
            if !path.is_empty() {
                config.log_path = Some(path);
            }
        }

        config.json_format = std::env::var("ANYRT_LOG_JSON").is_ok();
        config.show_spans = std::env::var("ANYRT_LOG_SPANS").is_ok();

        config
    }

    /// Errors only
    pub fn quiet() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Everything, including per-object allocation events
    pub fn verbose() -> Self {
        Self {
            level: Level::TRACE,
            show_spans: true,
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }
}

/// Parse a level name case-insensitively
pub fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration
///
/// Only the first call has an effect. If the host already installed a
/// global subscriber, that one is kept.
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("anyrt={}", config.level.as_str().to_lowercase()))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let (writer, guard) = match config.log_path.as_deref() {
            Some(path) => {
                let path = Path::new(path);
                let directory = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                let file_name = path
                    .file_name()
                    .map(|n| n.to_os_string())
                    .unwrap_or_else(|| "anyrt.log".into());
                tracing_appender::non_blocking(tracing_appender::rolling::never(
                    directory, file_name,
                ))
            }
            None => tracing_appender::non_blocking(io::stderr()),
        };
        *FILE_GUARD.lock() = Some(guard);

        let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_span_events(span_events)
                .with_target(true)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(writer)
                .with_ansi(config.log_path.is_none())
                .with_span_events(span_events)
                .with_target(true)
                .with_line_number(cfg!(debug_assertions))
                .boxed()
        };

        let installed = tracing_subscriber::registry()
            .with(fmt_layer)
            .with(env_filter)
            .try_init()
            .is_ok();

        if installed {
            log_runtime_init();
        }
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

/// Flush buffered output and stop the writer thread
pub fn shutdown() {
    if FILE_GUARD.lock().is_some() {
        log_runtime_shutdown();
    }
    // Dropping the guard flushes pending lines
    drop(FILE_GUARD.lock().take());
}

// ============================================================================
// Runtime-specific logging functions
// ============================================================================

/// Log object allocation
#[inline]
pub fn log_allocation(size: usize, ptr: *const u8) {
    trace!(
        event = "allocation",
        size_bytes = size,
        address = ?ptr,
        "object allocated"
    );
}

/// Log object deallocation
#[inline]
pub fn log_deallocation(ptr: *const u8) {
    trace!(event = "deallocation", address = ?ptr, "object freed");
}

/// Log a dict growing its slot array
pub fn log_dict_rehash(old_capacity: usize, new_capacity: usize, size: usize) {
    debug!(
        event = "dict_rehash",
        old_capacity,
        new_capacity,
        size,
        "dict rehashed"
    );
}

/// Log a new type registration
pub fn log_type_registered(key: &str, index: i32) {
    debug!(event = "type_registered", key, index, "type registered");
}

/// Log a cross-tag numeric conversion
#[inline]
pub fn log_type_conversion(from_type: &str, to_type: &str) {
    trace!(
        event = "type_conversion",
        from = from_type,
        to = to_type,
        "type conversion performed"
    );
}

/// Log an error raised at a C boundary
pub fn log_ffi_error(fn_name: &str, error: &str) {
    error!(
        event = "ffi_error",
        function = fn_name,
        error,
        "FFI function error"
    );
}

/// Log a runtime error that cannot be reported through a `Result`
pub fn log_runtime_error(error: &str, location: &str) {
    error!(
        event = "runtime_error",
        error,
        location,
        "runtime error occurred"
    );
}

pub fn log_runtime_warning(warning: &str) {
    warn!(event = "runtime_warning", warning, "runtime warning");
}

pub fn log_runtime_init() {
    info!(event = "runtime_init", "anyrt runtime initializing");
}

pub fn log_runtime_shutdown() {
    info!(event = "runtime_shutdown", "anyrt runtime shutting down");
}
