//! Leveled JSON logging.
//!
//! A [`Logger`] owns a `tracing` dispatcher that writes one JSON object per
//! record, e.g.
//!
//! ```text
//! {"time":"2024-05-01T10:00:00.000000Z","level":"INFO","msg":"starting","service":"order","port":8002}
//! ```
//!
//! Event fields are flattened next to `time`, `level` and `msg`; span
//! context and the event target are not written.
//!
//! Building a logger has no process-wide effect. Callers either scope it
//! with [`Logger::in_scope`] or install it once with [`Logger::install_global`].

use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;
#[cfg(any(test, feature = "testing"))]
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, MakeWriter};
use tracing_subscriber::registry::LookupSpan;

const TIME_KEY: &str = "time";
const LEVEL_KEY: &str = "level";
const MESSAGE_KEY: &str = "msg";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = s.to_lowercase();
        match level.as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(LoggerError::InvalidLevel(level)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        LevelFilter::from_level(level.into())
    }
}

#[derive(Clone)]
pub struct Logger {
    level: LogLevel,
    dispatch: Dispatch,
    // flushes the background stdout writer once the last clone is dropped
    _guard: Option<Arc<WorkerGuard>>,
}

impl Logger {
    /// Build a logger writing to standard output.
    ///
    /// `level` is matched case-insensitively against `debug`, `info`,
    /// `warn` and `error`.
    pub fn new(level: &str) -> Result<Self, LoggerError> {
        let level: LogLevel = level.parse()?;
        let (writer, guard) = tracing_appender::non_blocking(io::stdout());
        Ok(Self::build(level, writer, Some(Arc::new(guard))))
    }

    /// Build a logger writing to `make_writer` instead of standard output.
    pub fn with_writer<W>(level: &str, make_writer: W) -> Result<Self, LoggerError>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let level: LogLevel = level.parse()?;
        Ok(Self::build(level, make_writer, None))
    }

    fn build<W>(level: LogLevel, make_writer: W, guard: Option<Arc<WorkerGuard>>) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .event_format(JsonRecord)
            .with_max_level(LevelFilter::from(level))
            .with_writer(make_writer)
            .finish();

        Self {
            level,
            dispatch: Dispatch::new(subscriber),
            _guard: guard,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Run `f` with this logger as the current thread's default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Make this logger the process-wide default.
    ///
    /// Only the first install in a process succeeds.
    pub fn install_global(&self) -> Result<(), LoggerError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| LoggerError::GlobalAlreadySet)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// Writes each event as a single JSON object keyed `time`, `level`, `msg`.
struct JsonRecord;

impl<S, N> FormatEvent<S, N> for JsonRecord
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut record = Map::new();
        event.record(&mut RecordVisitor(&mut record));

        let mut time = String::new();
        SystemTime.format_time(&mut format::Writer::new(&mut time))?;
        record.insert(TIME_KEY.to_string(), Value::String(time));
        record.insert(
            LEVEL_KEY.to_string(),
            Value::String(event.metadata().level().to_string()),
        );
        record
            .entry(MESSAGE_KEY.to_string())
            .or_insert_with(|| Value::String(String::new()));

        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

struct RecordVisitor<'a>(&'a mut Map<String, Value>);

impl RecordVisitor<'_> {
    fn insert(&mut self, field: &Field, value: Value) {
        let key = match field.name() {
            "message" => MESSAGE_KEY,
            name => name,
        };
        self.0.insert(key.to_string(), value);
    }
}

impl Visit for RecordVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{:?}", value)));
    }
}

/// An in-memory log sink, handy for asserting on emitted records.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

#[cfg(any(test, feature = "testing"))]
impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(any(test, feature = "testing"))]
impl io::Write for MemoryWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(any(test, feature = "testing"))]
impl<'a> MakeWriter<'a> for MemoryWriter {
    type Writer = MemoryWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("invalid log level: {0}")]
    InvalidLevel(String),
    #[error("a global logger has already been installed")]
    GlobalAlreadySet,
}
