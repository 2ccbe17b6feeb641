#![forbid(unsafe_code)]

//! Event sinks: where intercepted reads and writes are reported.
//!
//! The sink is injected into the [`Observer`](crate::Observer) and shared by
//! every accessor it installs. Sinks are called synchronously, in operation
//! order, with no container or accessor borrow held.
//!
//! Any `Fn(&AccessEvent)` closure is a sink. The provided implementations
//! cover the common cases:
//!
//! | Sink | Use |
//! |------|-----|
//! | [`NullSink`] | Discard everything |
//! | [`RecordingSink`] | Keep events in memory (tests, summaries) |
//! | [`TracingSink`] | Forward to `tracing` |
//! | [`WriterSink`] | One line per event on an `io::Write` |
//! | [`FanoutSink`] | Forward to several sinks in order |

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::Rc;

use crate::event::{AccessEvent, AccessKind};

/// Receiver of access events.
pub trait EventSink {
    fn emit(&self, event: &AccessEvent);
}

impl<F> EventSink for F
where
    F: Fn(&AccessEvent),
{
    fn emit(&self, event: &AccessEvent) {
        self(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &AccessEvent) {}
}

/// Keeps every event in memory.
///
/// Cloning a `RecordingSink` creates a new handle to the **same** log, so a
/// test can hand one clone to the observer and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<AccessEvent>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<AccessEvent> {
        self.events.borrow().clone()
    }

    /// Kinds only, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<AccessKind> {
        self.events.borrow().iter().map(|event| event.kind).collect()
    }

    #[must_use]
    pub fn count(&self, kind: AccessKind) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.kind == kind)
            .count()
    }

    #[must_use]
    pub fn reads(&self) -> usize {
        self.count(AccessKind::Read)
    }

    #[must_use]
    pub fn writes(&self) -> usize {
        self.count(AccessKind::Write)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Drain the log, returning what was recorded.
    pub fn take(&self) -> Vec<AccessEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &AccessEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Forwards events to `tracing` under the `propwatch::access` target.
///
/// Reads are logged at `TRACE`, writes at `DEBUG`, since reads dominate any
/// realistic event stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &AccessEvent) {
        match event.kind {
            AccessKind::Read => tracing::trace!(
                target: "propwatch::access",
                kind = event.kind.as_str(),
                path = %event.path,
                "entry.read"
            ),
            AccessKind::Write => tracing::debug!(
                target: "propwatch::access",
                kind = event.kind.as_str(),
                path = %event.path,
                "entry.write"
            ),
        }
    }
}

/// Line format used by [`WriterSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFormat {
    /// The bare kind: `read` / `write`.
    #[default]
    Plain,
    /// Kind and install path: `write $[3]`.
    Verbose,
    /// One JSON object per line.
    Json,
    /// Nothing is written for events.
    Silent,
}

/// Writes one line per event to an [`io::Write`](std::io::Write).
///
/// `emit` cannot fail, so write errors are counted and reported through
/// `tracing`; check [`failures`](Self::failures) after a run.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: RefCell<W>,
    format: EventFormat,
    failures: Cell<usize>,
}

impl<W: Write> WriterSink<W> {
    #[must_use]
    pub fn new(writer: W, format: EventFormat) -> Self {
        Self {
            writer: RefCell::new(writer),
            format,
            failures: Cell::new(0),
        }
    }

    #[must_use]
    pub fn format(&self) -> EventFormat {
        self.format
    }

    /// Number of events that could not be written.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures.get()
    }

    /// Borrow the writer, e.g. to append output after the events.
    ///
    /// # Panics
    ///
    /// Panics if called from inside `emit` on the same sink (re-entrant
    /// borrow).
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut *self.writer.borrow_mut())
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_event(&self, event: &AccessEvent) -> std::io::Result<()> {
        let mut writer = self.writer.borrow_mut();
        match self.format {
            EventFormat::Plain => writeln!(writer, "{}", event.kind),
            EventFormat::Verbose => writeln!(writer, "{event}"),
            EventFormat::Json => {
                serde_json::to_writer(&mut *writer, event)?;
                writeln!(writer)
            }
            EventFormat::Silent => Ok(()),
        }
    }
}

impl<W: Write> EventSink for WriterSink<W> {
    fn emit(&self, event: &AccessEvent) {
        if let Err(error) = self.write_event(event) {
            self.failures.set(self.failures.get() + 1);
            tracing::warn!(%error, path = %event.path, "event write failed");
        }
    }
}

/// Forwards each event to every inner sink, in insertion order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Rc<dyn EventSink>>,
}

impl FanoutSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink and return `self` for chaining.
    #[must_use]
    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Rc::new(sink));
        self
    }

    /// Add an already shared sink.
    pub fn push(&mut self, sink: Rc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &AccessEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}
