//! A context-injected replacement for the reference implementation's
//! global function-pointer log callback.
//!
//! The original C daemon calls a single process-wide
//! `lssdp_log_callback`, set once via `lssdp_set_log_callback`. That
//! doesn't compose: two engines in one process would fight over the
//! same global. Here, anything that wants log output implements
//! [`LogSink`] (or just passes a closure, which is blanket-implemented)
//! and hands it to the enumerator or engine that should use it.

use std::fmt;

/// Severity of a logged event, in the same three tiers the reference
/// implementation uses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// One log event, carrying the same call-site detail the reference
/// implementation's macros embedded (`__FILE__`, `__LINE__`, etc) so a
/// sink can reproduce its log format without reaching back into this
/// crate.
#[derive(Debug, Clone)]
pub struct LogRecord<'a> {
    pub level: LogLevel,
    pub file: &'static str,
    pub line: u32,
    pub func: &'static str,
    pub message: &'a str,
}

impl fmt::Display for LogRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}][{}:{}][{}] {}",
            self.level, self.file, self.line, self.func, self.message
        )
    }
}

/// Destination for log events.
///
/// Implemented for any `Fn(&LogRecord)`, so a plain closure (or
/// `eprintln!`-wrapping function) is usually all a caller needs to
/// write.
pub trait LogSink {
    fn log(&self, record: &LogRecord<'_>);
}

impl<F: Fn(&LogRecord<'_>)> LogSink for F {
    fn log(&self, record: &LogRecord<'_>) {
        self(record)
    }
}

/// Logs to stderr in the reference implementation's own
/// `[LEVEL][file:line][func] message` shape. Useful as a default in
/// examples and tests.
pub struct StderrLog;

impl LogSink for StderrLog {
    fn log(&self, record: &LogRecord<'_>) {
        eprintln!("{record}");
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_record {
    ($level:expr, $message:expr) => {{
        $crate::LogRecord {
            level: $level,
            file: file!(),
            line: line!(),
            func: "",
            message: &$message,
        }
    }};
}

/// Logs a debug-level record to `$sink: Option<&dyn LogSink>`.
#[macro_export]
macro_rules! log_debug {
    ($sink:expr, $($arg:tt)*) => {
        if let Some(sink) = $sink {
            sink.log(&$crate::log_record!($crate::LogLevel::Debug, format!($($arg)*)));
        }
    };
}

/// Logs a warn-level record to `$sink: Option<&dyn LogSink>`.
#[macro_export]
macro_rules! log_warn {
    ($sink:expr, $($arg:tt)*) => {
        if let Some(sink) = $sink {
            sink.log(&$crate::log_record!($crate::LogLevel::Warn, format!($($arg)*)));
        }
    };
}

/// Logs an error-level record to `$sink: Option<&dyn LogSink>`.
#[macro_export]
macro_rules! log_error {
    ($sink:expr, $($arg:tt)*) => {
        if let Some(sink) = $sink {
            sink.log(&$crate::log_record!($crate::LogLevel::Error, format!($($arg)*)));
        }
    };
}
