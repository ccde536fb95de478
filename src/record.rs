use std::fmt;

use crate::arg_buffer::{ArgBuffer, Args};
use crate::clock;
use crate::loggable::Loggable;
use crate::render;

/// The outward-facing unit of the logging system: a deferred, buffer-backed
/// log entry.
///
/// A record captures a format pattern, source-location metadata and an
/// argument buffer at the call site; the expensive work of turning all that
/// into text happens later, possibly on another thread after the record has
/// been handed off.

/// Severity of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deferred log record: pattern, metadata and exactly one argument buffer.
///
/// Records are built by the single thread that creates them (`arg` appends,
/// the buffer grows as needed), then treated as read-only: `render` may run
/// any number of times and always produces the same text. Dropping the record
/// destroys every owned argument exactly once.
///
/// A record is `Send`; moving it to another thread transfers the whole
/// ownership chain, so formatting and I/O can happen off the producing path:
///
/// ```
/// use std::sync::mpsc;
/// use std::thread;
/// use deferred_log::{record, Level, Record};
///
/// let (tx, rx) = mpsc::channel::<Record>();
/// let writer = thread::spawn(move || {
///     let rec = rx.recv().unwrap();
///     rec.render()
/// });
///
/// tx.send(record!(Level::Info, "Temperature: {} C", 25.5)).unwrap();
/// assert_eq!(writer.join().unwrap(), "Temperature: 25.5 C");
/// ```
pub struct Record {
    level: Level,
    file: &'static str,
    line: u32,
    target: &'static str,
    pattern: &'static str,
    timestamp: u64,
    args: ArgBuffer,
}

impl Record {
    /// Begins a record. Usually invoked through the [`record!`](crate::record)
    /// macro, which fills in the source location.
    pub fn new(
        level: Level,
        file: &'static str,
        line: u32,
        target: &'static str,
        pattern: &'static str,
    ) -> Self {
        Self {
            level,
            file,
            line,
            target,
            pattern,
            timestamp: clock::now(),
            args: ArgBuffer::new(),
        }
    }

    /// Streams one argument into the record.
    ///
    /// Dispatch between the byte-relocatable and owned buffer paths happens
    /// in the argument type's [`Loggable`] impl. Returns `&mut Self` so
    /// appends chain.
    pub fn arg<T: Loggable>(&mut self, value: T) -> &mut Self {
        value.append_to(&mut self.args);
        self
    }

    /// Runs the decode/render loop: walks the buffer, reconstructs a
    /// render-ready handle per argument and interpolates them into the
    /// pattern.
    ///
    /// Read-only and idempotent; rendering twice yields identical text.
    pub fn render(&self) -> String {
        render::render_pattern(self.pattern, self.args.iter())
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Module path of the logging call site.
    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Raw monotonic timestamp captured when the record was created.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Number of arguments appended so far.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Render-ready handles for the buffered arguments, in append order.
    pub fn args(&self) -> Args<'_> {
        self.args.iter()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("level", &self.level)
            .field("file", &self.file)
            .field("line", &self.line)
            .field("target", &self.target)
            .field("pattern", &self.pattern)
            .field("args", &self.args.len())
            .finish()
    }
}

/// Builds a [`Record`] from a severity, a pattern literal and zero or more
/// arguments, capturing the source location of the call site.
///
/// # Examples
///
/// ```
/// use deferred_log::{record, Level};
///
/// let rec = record!(Level::Info, "Status: {}, Count: {}", true, 42);
/// assert_eq!(rec.render(), "Status: true, Count: 42");
/// ```
#[macro_export]
macro_rules! record {
    ($level:expr, $pattern:literal $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut rec = $crate::Record::new(
            $level,
            ::core::file!(),
            ::core::line!(),
            ::core::module_path!(),
            $pattern,
        );
        $( rec.arg($arg); )*
        rec
    }};
}
