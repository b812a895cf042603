//! Logging configuration for FlatStore
//!
//! FlatStore emits `tracing` events: `debug` for every sub-store operation,
//! `info` for catalog and sub-store creation, `trace` for key-set rewrites.
//! This module installs a subscriber for applications that do not bring
//! their own.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log file name used when the configured path has none
const DEFAULT_LOG_FILE: &str = "flatstore.log";

/// Log output destination
#[derive(Debug, Clone)]
pub enum LogOutput {
    /// Output to stdout
    Stdout,
    /// Output to a daily rotated file
    File(PathBuf),
    /// Output to both stdout and file
    Both(PathBuf),
}

/// Log format style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable format
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive, e.g. `"info"` or `"flatstore_storage=debug"`
    pub level: String,
    /// Output destination
    pub output: LogOutput,
    /// Format style
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::Stdout,
            format: LogFormat::Compact,
        }
    }
}

impl LogConfig {
    /// Info level, stdout
    pub fn info() -> Self {
        Self::default()
    }

    /// Debug level: logs every insert, fetch and delete
    pub fn debug() -> Self {
        Self::default().with_level("debug")
    }

    /// Trace level: also logs key-set rewrites
    pub fn trace() -> Self {
        Self::default().with_level("trace")
    }

    /// Write to a daily rotated file instead of stdout
    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::File(path.into());
        self
    }

    /// Write to stdout and a daily rotated file
    pub fn with_both<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::Both(path.into());
        self
    }

    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the filter directive
    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self
    }

    /// Builds the filter: `RUST_LOG` wins over the configured level.
    fn filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| invalid_config(format!("bad log filter {:?}: {}", self.level, e)))
    }

    /// Installs the global subscriber.
    ///
    /// Returns a guard for file output that must be kept alive; dropping it
    /// stops the background writer. Fails if the filter is invalid or a
    /// global subscriber is already installed.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use flatstore::logging::LogConfig;
    ///
    /// let _guard = LogConfig::debug().init()?;
    /// # Ok::<(), flatstore::Error>(())
    /// ```
    pub fn init(self) -> Result<Option<WorkerGuard>> {
        let filter = self.filter()?;
        let registry = tracing_subscriber::registry().with(filter);

        let (file_writer, guard) = match &self.output {
            LogOutput::Stdout => (None, None),
            LogOutput::File(path) | LogOutput::Both(path) => {
                let (writer, guard) = tracing_appender::non_blocking(rolling_appender(path));
                (Some(writer), Some(guard))
            }
        };
        let to_stdout = matches!(self.output, LogOutput::Stdout | LogOutput::Both(_));

        let stdout_layer = to_stdout.then(|| match self.format {
            LogFormat::Pretty => fmt::layer().pretty().boxed(),
            LogFormat::Compact => fmt::layer().compact().boxed(),
        });
        let file_layer = file_writer.map(|writer| match self.format {
            LogFormat::Pretty => fmt::layer().with_writer(writer).with_ansi(false).pretty().boxed(),
            LogFormat::Compact => fmt::layer().with_writer(writer).with_ansi(false).compact().boxed(),
        });

        registry
            .with(stdout_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| invalid_config(format!("cannot install log subscriber: {}", e)))?;

        Ok(guard)
    }
}

fn rolling_appender(path: &Path) -> tracing_appender::rolling::RollingFileAppender {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    tracing_appender::rolling::daily(dir, file)
}

fn invalid_config(msg: String) -> Error {
    Error::InvalidOperation(msg)
}
