#![forbid(unsafe_code)]

//! Intercepting accessors.
//!
//! An [`Accessor`] replaces a plain container slot. It owns the entry's value
//! cell and reports every read, and every write that changes the value, to
//! the sink it was installed with.
//!
//! Cloning an `Accessor` creates a new handle to the **same** cell, so a
//! handle obtained through [`Container::entry`](crate::Container::entry)
//! sees exactly what reads through the container see.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::event::{AccessEvent, AccessKind};
use crate::key::KeyPath;
use crate::sink::EventSink;
use crate::value::Value;

struct AccessorInner {
    cell: RefCell<Value>,
    /// Where the accessor was installed. Reported with every event.
    path: KeyPath,
    sink: Rc<dyn EventSink>,
}

/// Read/write interception for a single entry.
#[derive(Clone)]
pub struct Accessor {
    inner: Rc<AccessorInner>,
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("path", &self.inner.path)
            .field("value", &self.inner.cell.borrow().type_name())
            .finish()
    }
}

impl Accessor {
    pub(crate) fn install(value: Value, path: KeyPath, sink: Rc<dyn EventSink>) -> Self {
        Self {
            inner: Rc::new(AccessorInner {
                cell: RefCell::new(value),
                path,
                sink,
            }),
        }
    }

    /// Emit a `read` event, then return the current value.
    pub fn read(&self) -> Value {
        self.emit(AccessKind::Read);
        self.inner.cell.borrow().clone()
    }

    /// Store `value` if it is strictly unequal to the current one, then emit
    /// a `write` event.
    ///
    /// Returns whether the value changed. A strictly equal write neither
    /// updates the cell nor emits.
    pub fn write(&self, value: Value) -> bool {
        {
            let mut cell = self.inner.cell.borrow_mut();
            if cell.strict_eq(&value) {
                return false;
            }
            *cell = value;
        }
        self.emit(AccessKind::Write);
        true
    }

    /// The current value, without emitting anything.
    #[must_use]
    pub fn peek(&self) -> Value {
        self.inner.cell.borrow().clone()
    }

    #[must_use]
    pub fn path(&self) -> &KeyPath {
        &self.inner.path
    }

    /// Whether both handles share one cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Accessor) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn emit(&self, kind: AccessKind) {
        let event = AccessEvent::new(kind, self.inner.path.clone());
        self.inner.sink.emit(&event);
    }
}
