#![forbid(unsafe_code)]

//! Read/write interception over list and map value trees.
//!
//! This crate provides the pieces needed to observe every entry of a
//! container, recursively:
//!
//! - [`Value`]: a closed set of primitives and shared [`Container`] handles.
//! - [`Container`]: an ordered list or insertion-ordered map whose slots are
//!   either plain values or intercepted [`Accessor`]s.
//! - [`Observer`]: walks a container depth-first and installs an accessor on
//!   every key present at the time of the walk.
//! - [`EventSink`]: the injected capability that receives one
//!   [`AccessEvent`] per intercepted read or effective write.
//!
//! # Architecture
//!
//! Containers use `Rc<RefCell<..>>` for single-threaded shared ownership, so
//! cloning a [`Value`] that holds a container clones the handle, not the
//! contents. Accessors own their value cell and a shared handle to the sink
//! they were installed with.
//!
//! # Invariants
//!
//! 1. A read through an accessor emits exactly one `read` event and returns
//!    the last value written through that accessor.
//! 2. A write of a strictly equal value is a no-op: no update, no event.
//! 3. Nested containers are observed before the parent key holding them
//!    receives its accessor.
//! 4. Keys added after observation are plain and never emit events.
//! 5. No borrow of a container or accessor is held while a sink runs, so a
//!    sink may read or write the tree it observes.

pub mod accessor;
pub mod config;
pub mod container;
pub mod error;
pub mod event;
pub mod key;
pub mod observer;
pub mod sink;
pub mod value;

pub use accessor::Accessor;
pub use config::{CyclePolicy, ObserverConfig, ParsePolicyError, RemovalPolicy};
pub use container::{Container, ContainerKind};
pub use error::{PropwatchError, Result};
pub use event::{AccessEvent, AccessKind};
pub use key::{Key, KeyPath};
pub use observer::{ObserveReport, Observer, observe};
pub use sink::{EventFormat, EventSink, FanoutSink, NullSink, RecordingSink, TracingSink, WriterSink};
pub use value::{Primitive, Value};
