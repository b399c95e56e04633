//! Trace sinks for use/unuse/erase transitions.
//!
//! A [`RefCache`](crate::RefCache) reports one line per lifecycle transition
//! to an injected [`TraceSink`]. Without a sink nothing is formatted, so the
//! default cache pays only for a `None` check.
//!
//! | Sink            | Destination                                     |
//! |-----------------|-------------------------------------------------|
//! | [`NoopSink`]    | Discards everything                             |
//! | [`TracingSink`] | `tracing::trace!` under target `refcache`       |
//! | [`WriterSink`]  | Any `io::Write` behind a mutex (stderr, buffer) |
//!
//! ## Example Usage
//!
//! ```
//! use refcache::RefCacheBuilder;
//! use refcache::sink::WriterSink;
//!
//! let cache = RefCacheBuilder::new(1)
//!     .trace_sink(WriterSink::new(Vec::new()))
//!     .build::<u32, u32>();
//!
//! drop(cache.emplace(1, 10));
//! ```

use std::fmt;
use std::io::Write;

use parking_lot::Mutex;

/// Lifecycle transition being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// First handle acquired on an unused entry.
    Use,
    /// Last handle dropped; the key joined the unused queue.
    Unuse,
    /// Entry removed from the map, by eviction, `erase` or `clear`.
    Erase,
}

impl TraceEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            TraceEvent::Use => "use",
            TraceEvent::Unuse => "unuse",
            TraceEvent::Erase => "erase",
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives human-readable trace lines from a cache.
///
/// Called with the queue lock held; implementations must not call back into
/// the cache that owns them.
pub trait TraceSink: Send + Sync {
    fn trace(&self, event: TraceEvent, line: fmt::Arguments<'_>);
}

/// Sink that drops every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    #[inline]
    fn trace(&self, _event: TraceEvent, _line: fmt::Arguments<'_>) {}
}

/// Forwards lines to `tracing` at `TRACE` level.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[cfg(feature = "tracing")]
impl TraceSink for TracingSink {
    fn trace(&self, event: TraceEvent, line: fmt::Arguments<'_>) {
        tracing::trace!(target: "refcache", event = event.as_str(), "{}", line);
    }
}

/// Writes each line, newline-terminated, to a shared writer.
///
/// Write errors are ignored; tracing must never fail a cache operation.
#[derive(Debug)]
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Runs `f` against the underlying writer.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.writer.lock())
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl WriterSink<std::io::Stderr> {
    /// Sink writing to standard error.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> TraceSink for WriterSink<W> {
    fn trace(&self, _event: TraceEvent, line: fmt::Arguments<'_>) {
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "{}", line);
    }
}
