//! Explicit logging context.
//!
//! Pipeline components never log through a process-wide singleton. Each one
//! receives an `Arc<dyn Logger>` when it is built and logs through it, so a
//! component can be exercised in isolation with a silent or capturing logger.
//!
//! - [`TracingLogger`] forwards to the `tracing` crate (used by the binary)
//! - [`NoOpLogger`] discards everything
//! - [`MemoryLogger`] records messages so tests can assert on them
//!
//! ```
//! use std::sync::Arc;
//! use terrain_mosaic::log::{Logger, NoOpLogger};
//! use terrain_mosaic::log_info;
//!
//! let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
//! log_info!(logger, "fetching {} tiles", 16);
//! ```

mod adapters;

pub use adapters::{MemoryLogger, NoOpLogger, TracingLogger};

use std::fmt::Arguments;
use std::sync::Arc;

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Logging interface handed to pipeline components.
///
/// Implementations must be `Send + Sync`; a single logger is shared by every
/// concurrent tile conversion of a run.
pub trait Logger: Send + Sync {
    /// Log a message at the specified level.
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

/// Shared handle type used throughout the crate.
pub type SharedLogger = Arc<dyn Logger>;

/// Returns a logger that discards everything.
pub fn silent() -> SharedLogger {
    Arc::new(NoOpLogger)
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format_args!($($arg)*))
    };
}
