//! Per-process log file setup.
//!
//! [`LogContext::init`] creates `<log_dir>/<MM_DD_YYYY_HH_MM_SS>.log` and a
//! `tracing` dispatcher that writes every event to it as
//!
//! ```text
//! [ 2026-10-16 09:30:12,345 ] 87 exam_preprocessing::pipeline::builder - INFO - Numerical columns: [...]
//! ```
//!
//! Nothing is installed globally. The binary enters the context once at
//! start-up with [`LogContext::enter`]; library components that receive a
//! context run their work inside it with [`LogContext::in_scope`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use exam_preprocessing::logging::LogContext;
//!
//! let logs = LogContext::init(&config.logging)?;
//! let _guard = logs.enter();
//! tracing::info!("Started");
//! ```

use crate::config::LoggingConfig;
use crate::error::{PreprocessingError, Result};
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::dispatcher::{self, DefaultGuard, Dispatch};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{self as fmt_layer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _};

const FILE_NAME_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Log file name for a process started at `started`.
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("{}.log", started.format(FILE_NAME_FORMAT))
}

/// Event formatter producing
/// `[ <timestamp> ] <line-number> <logger-name> - <LEVEL> - <message>`.
///
/// The logger name is the event's tracing target (the module path unless
/// overridden).
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "[ {} ] {} {} - {} - ",
            Local::now().format(TIMESTAMP_FORMAT),
            meta.line().unwrap_or_default(),
            meta.target(),
            meta.level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Handle to the process log file and the dispatcher writing to it.
///
/// Cloning is cheap; clones share the same file.
#[derive(Clone)]
pub struct LogContext {
    log_file: PathBuf,
    dispatch: Dispatch,
}

impl std::fmt::Debug for LogContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogContext")
            .field("log_file", &self.log_file)
            .finish_non_exhaustive()
    }
}

impl LogContext {
    /// Create the log directory and file, and build the dispatcher.
    ///
    /// The filter comes from `RUST_LOG` when set, otherwise from
    /// `config.level`. Re-initializing within the same second appends to
    /// the same file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created, or if
    /// the level is not a valid filter directive.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        fs::create_dir_all(&config.log_dir)?;
        let log_file = config.log_dir.join(log_file_name(Local::now()));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .map_err(|e| {
                PreprocessingError::InvalidConfig(format!(
                    "invalid log level '{}': {}",
                    config.level, e
                ))
            })?;

        let file_layer = fmt_layer::layer()
            .event_format(LineFormat)
            .with_ansi(false)
            .with_writer(Mutex::new(file));

        let console_layer = config.console.then(|| {
            fmt_layer::layer()
                .event_format(LineFormat)
                .with_writer(std::io::stderr)
        });

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer);

        let context = Self {
            log_file,
            dispatch: Dispatch::new(subscriber),
        };
        context.in_scope(|| {
            tracing::debug!("Logging to {}", context.log_file.display());
        });
        Ok(context)
    }

    /// Path of the log file.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Make this context the current thread's default until the guard drops.
    pub fn enter(&self) -> DefaultGuard {
        dispatcher::set_default(&self.dispatch)
    }

    /// Run `f` with this context as the current dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, f)
    }
}

/// Run `f` inside `context` when one was provided, otherwise as-is.
pub fn scoped<T>(context: Option<&LogContext>, f: impl FnOnce() -> T) -> T {
    match context {
        Some(context) => context.in_scope(f),
        None => f(),
    }
}
