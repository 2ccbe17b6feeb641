#![forbid(unsafe_code)]

//! Lists and maps whose slots can be intercepted.
//!
//! # Design
//!
//! A [`Container`] is a shared handle (`Rc<RefCell<..>>`) to an ordered list
//! or an insertion-ordered map. Each slot holds either a plain [`Value`] or an
//! [`Accessor`]. Callers go through [`get`](Container::get) and
//! [`set`](Container::set); for intercepted slots these delegate to the
//! accessor and produce events, for plain slots they are silent.
//!
//! # Invariants
//!
//! 1. No `RefCell` borrow of the container is held while an accessor runs,
//!    so sinks may access the container they observe.
//! 2. `push`, `insert` and `set` on a missing key always create plain slots.
//! 3. List keys are dense: valid indices are exactly `0..len`.
//!
//! # Failure Modes
//!
//! - **Self-reference**: storing a container inside itself creates an `Rc`
//!   cycle. It is observed and snapshotted safely, but it is never freed
//!   unless the back-reference is removed.
//! - **Re-entrant structural change**: a sink that removes entries while a
//!   [`RemovalPolicy::ShiftThrough`] removal is shifting values causes the
//!   removal to stop with [`PropwatchError::IndexOutOfBounds`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashSet;
use indexmap::IndexMap;

use crate::accessor::Accessor;
use crate::config::RemovalPolicy;
use crate::error::{PropwatchError, Result};
use crate::key::Key;
use crate::value::Value;

const CIRCULAR_MARKER: &str = "[Circular]";

/// Shape of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    Map,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "list",
            Self::Map => "map",
        })
    }
}

/// Identity of a live container, used for cycle tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ContainerId(usize);

#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Plain(Value),
    Intercepted(Accessor),
}

impl Slot {
    fn peek(&self) -> Value {
        match self {
            Self::Plain(value) => value.clone(),
            Self::Intercepted(accessor) => accessor.peek(),
        }
    }
}

enum Entries {
    List(Vec<Slot>),
    Map(IndexMap<String, Slot>),
}

impl Entries {
    fn kind(&self) -> ContainerKind {
        match self {
            Self::List(_) => ContainerKind::List,
            Self::Map(_) => ContainerKind::Map,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::List(slots) => slots.len(),
            Self::Map(slots) => slots.len(),
        }
    }

    fn slots(&self) -> Box<dyn Iterator<Item = &Slot> + '_> {
        match self {
            Self::List(slots) => Box::new(slots.iter()),
            Self::Map(slots) => Box::new(slots.values()),
        }
    }
}

struct ContainerInner {
    entries: Entries,
    removal_policy: RemovalPolicy,
}

/// Shared handle to a list or map of entries.
///
/// Cloning a `Container` creates a new handle to the **same** entries.
#[derive(Clone)]
pub struct Container {
    inner: Rc<RefCell<ContainerInner>>,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let intercepted = inner
            .entries
            .slots()
            .filter(|slot| matches!(slot, Slot::Intercepted(_)))
            .count();
        f.debug_struct("Container")
            .field("kind", &inner.entries.kind())
            .field("len", &inner.entries.len())
            .field("intercepted", &intercepted)
            .field("removal_policy", &inner.removal_policy)
            .finish()
    }
}

impl Container {
    fn from_entries(entries: Entries) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ContainerInner {
                entries,
                removal_policy: RemovalPolicy::default(),
            })),
        }
    }

    /// A list of plain slots.
    pub fn list<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::from_entries(Entries::List(
            values
                .into_iter()
                .map(|value| Slot::Plain(value.into()))
                .collect(),
        ))
    }

    /// A map of plain slots in iteration order. A repeated name keeps its
    /// first position and its last value.
    pub fn map<K: Into<String>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::from_entries(Entries::Map(
            entries
                .into_iter()
                .map(|(name, value)| (name.into(), Slot::Plain(value.into())))
                .collect(),
        ))
    }

    #[must_use]
    pub fn empty_list() -> Self {
        Self::from_entries(Entries::List(Vec::new()))
    }

    #[must_use]
    pub fn empty_map() -> Self {
        Self::from_entries(Entries::Map(IndexMap::new()))
    }

    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        self.inner.borrow().entries.kind()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys present right now, in order.
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        match &self.inner.borrow().entries {
            Entries::List(slots) => (0..slots.len()).map(Key::Index).collect(),
            Entries::Map(slots) => slots.keys().cloned().map(Key::Name).collect(),
        }
    }

    #[must_use]
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.slot(&key.into()).is_ok()
    }

    /// Whether both handles refer to the same container.
    #[must_use]
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Policy [`remove`](Self::remove) applies. Set by the observer that
    /// last visited this container; [`RemovalPolicy::Rebind`] otherwise.
    #[must_use]
    pub fn removal_policy(&self) -> RemovalPolicy {
        self.inner.borrow().removal_policy
    }

    pub fn set_removal_policy(&self, policy: RemovalPolicy) {
        self.inner.borrow_mut().removal_policy = policy;
    }

    /// Read an entry. Intercepted entries emit a `read` event.
    pub fn get(&self, key: impl Into<Key>) -> Result<Value> {
        match self.slot(&key.into())? {
            Slot::Plain(value) => Ok(value),
            Slot::Intercepted(accessor) => Ok(accessor.read()),
        }
    }

    /// Read an entry without emitting anything.
    pub fn peek(&self, key: impl Into<Key>) -> Result<Value> {
        Ok(self.slot(&key.into())?.peek())
    }

    /// Write an entry and return whether its value changed.
    ///
    /// Intercepted entries delegate to [`Accessor::write`]. Existing plain
    /// entries are replaced silently. A missing map name, or the list index
    /// equal to the current length, appends a new plain entry.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<bool> {
        let key = key.into();
        let value = value.into();
        let accessor = {
            let mut inner = self.inner.borrow_mut();
            let kind = inner.entries.kind();
            match (&mut inner.entries, &key) {
                (Entries::List(slots), Key::Index(index)) => {
                    let len = slots.len();
                    match slots.get_mut(*index) {
                        Some(Slot::Intercepted(accessor)) => accessor.clone(),
                        Some(Slot::Plain(current)) => return Ok(replace_plain(current, value)),
                        None if *index == len => {
                            slots.push(Slot::Plain(value));
                            return Ok(true);
                        }
                        None => {
                            return Err(PropwatchError::IndexOutOfBounds { index: *index, len });
                        }
                    }
                }
                (Entries::Map(slots), Key::Name(name)) => match slots.get_mut(name.as_str()) {
                    Some(Slot::Intercepted(accessor)) => accessor.clone(),
                    Some(Slot::Plain(current)) => return Ok(replace_plain(current, value)),
                    None => {
                        slots.insert(name.clone(), Slot::Plain(value));
                        return Ok(true);
                    }
                },
                _ => {
                    return Err(PropwatchError::KindMismatch {
                        key: key.clone(),
                        found: kind,
                    });
                }
            }
        };
        Ok(accessor.write(value))
    }

    /// Append a plain entry to a list.
    pub fn push(&self, value: impl Into<Value>) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        match &mut inner.entries {
            Entries::List(slots) => {
                slots.push(Slot::Plain(value.into()));
                Ok(())
            }
            Entries::Map(slots) => Err(PropwatchError::KindMismatch {
                key: Key::Index(slots.len()),
                found: ContainerKind::Map,
            }),
        }
    }

    /// Set a map entry by name; a new name becomes a plain entry.
    pub fn insert(&self, name: impl Into<String>, value: impl Into<Value>) -> Result<bool> {
        self.set(Key::Name(name.into()), value)
    }

    /// Remove an entry using this container's [`removal_policy`](Self::removal_policy).
    pub fn remove(&self, key: impl Into<Key>) -> Result<Value> {
        let policy = self.removal_policy();
        self.remove_with(key, policy)
    }

    /// Remove an entry and return its value.
    ///
    /// Map removal always drops the slot, accessor included. For lists see
    /// [`RemovalPolicy`].
    pub fn remove_with(&self, key: impl Into<Key>, policy: RemovalPolicy) -> Result<Value> {
        let key = key.into();
        match (&key, policy) {
            (Key::Index(index), RemovalPolicy::ShiftThrough)
                if self.kind() == ContainerKind::List =>
            {
                self.remove_shift_through(*index)
            }
            _ => self.remove_slot(&key),
        }
    }

    /// The accessor installed on `key`, if the entry is intercepted.
    pub fn entry(&self, key: impl Into<Key>) -> Result<Option<Accessor>> {
        match self.slot(&key.into())? {
            Slot::Intercepted(accessor) => Ok(Some(accessor)),
            Slot::Plain(_) => Ok(None),
        }
    }

    /// Whether `key` exists and is intercepted.
    #[must_use]
    pub fn is_intercepted(&self, key: impl Into<Key>) -> bool {
        matches!(self.slot(&key.into()), Ok(Slot::Intercepted(_)))
    }

    /// Number of intercepted entries at this level (not recursive).
    #[must_use]
    pub fn intercepted_count(&self) -> usize {
        self.inner
            .borrow()
            .entries
            .slots()
            .filter(|slot| matches!(slot, Slot::Intercepted(_)))
            .count()
    }

    /// Render the tree as JSON without emitting any access events.
    ///
    /// A container that is its own ancestor renders as `"[Circular]"`.
    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        let mut ancestors = AHashSet::new();
        self.snapshot_with(&mut ancestors)
    }

    fn snapshot_with(&self, ancestors: &mut AHashSet<ContainerId>) -> serde_json::Value {
        let id = self.id();
        if !ancestors.insert(id) {
            return serde_json::Value::String(CIRCULAR_MARKER.to_owned());
        }

        let kind = self.kind();
        let entries: Vec<(Key, Value)> = {
            let inner = self.inner.borrow();
            match &inner.entries {
                Entries::List(slots) => slots
                    .iter()
                    .enumerate()
                    .map(|(index, slot)| (Key::Index(index), slot.peek()))
                    .collect(),
                Entries::Map(slots) => slots
                    .iter()
                    .map(|(name, slot)| (Key::Name(name.clone()), slot.peek()))
                    .collect(),
            }
        };

        let render = |value: &Value, ancestors: &mut AHashSet<ContainerId>| match value {
            Value::Primitive(primitive) => primitive.to_json(),
            Value::Container(container) => container.snapshot_with(ancestors),
        };

        let json = match kind {
            ContainerKind::List => serde_json::Value::Array(
                entries
                    .iter()
                    .map(|(_, value)| render(value, ancestors))
                    .collect(),
            ),
            ContainerKind::Map => {
                let mut fields = serde_json::Map::new();
                for (key, value) in &entries {
                    if let Key::Name(name) = key {
                        fields.insert(name.clone(), render(value, ancestors));
                    }
                }
                serde_json::Value::Object(fields)
            }
        };

        ancestors.remove(&id);
        json
    }

    pub(crate) fn id(&self) -> ContainerId {
        ContainerId(Rc::as_ptr(&self.inner).addr())
    }

    pub(crate) fn slot(&self, key: &Key) -> Result<Slot> {
        let inner = self.inner.borrow();
        match (&inner.entries, key) {
            (Entries::List(slots), Key::Index(index)) => {
                slots
                    .get(*index)
                    .cloned()
                    .ok_or(PropwatchError::IndexOutOfBounds {
                        index: *index,
                        len: slots.len(),
                    })
            }
            (Entries::Map(slots), Key::Name(name)) => slots
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| PropwatchError::KeyNotFound { key: key.clone() }),
            (entries, _) => Err(PropwatchError::KindMismatch {
                key: key.clone(),
                found: entries.kind(),
            }),
        }
    }

    /// Replace the slot at `key` with `accessor`.
    pub(crate) fn install(&self, key: &Key, accessor: Accessor) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let kind = inner.entries.kind();
        let slot = match (&mut inner.entries, key) {
            (Entries::List(slots), Key::Index(index)) => {
                let len = slots.len();
                slots
                    .get_mut(*index)
                    .ok_or(PropwatchError::IndexOutOfBounds { index: *index, len })?
            }
            (Entries::Map(slots), Key::Name(name)) => slots
                .get_mut(name.as_str())
                .ok_or_else(|| PropwatchError::KeyNotFound { key: key.clone() })?,
            _ => {
                return Err(PropwatchError::KindMismatch {
                    key: key.clone(),
                    found: kind,
                });
            }
        };
        *slot = Slot::Intercepted(accessor);
        Ok(())
    }

    fn remove_slot(&self, key: &Key) -> Result<Value> {
        let mut inner = self.inner.borrow_mut();
        let kind = inner.entries.kind();
        let slot = match (&mut inner.entries, key) {
            (Entries::List(slots), Key::Index(index)) => {
                if *index >= slots.len() {
                    return Err(PropwatchError::IndexOutOfBounds {
                        index: *index,
                        len: slots.len(),
                    });
                }
                slots.remove(*index)
            }
            (Entries::Map(slots), Key::Name(name)) => slots
                .shift_remove(name.as_str())
                .ok_or_else(|| PropwatchError::KeyNotFound { key: key.clone() })?,
            _ => {
                return Err(PropwatchError::KindMismatch {
                    key: key.clone(),
                    found: kind,
                });
            }
        };
        Ok(slot.peek())
    }

    fn remove_shift_through(&self, index: usize) -> Result<Value> {
        let len = self.len();
        if index >= len {
            return Err(PropwatchError::IndexOutOfBounds { index, len });
        }

        let removed = self.get(index)?;
        for position in index..len - 1 {
            let next = self.get(position + 1)?;
            self.set(position, next)?;
        }

        let trailing = match &mut self.inner.borrow_mut().entries {
            Entries::List(slots) => slots.pop(),
            Entries::Map(_) => None,
        };
        drop(trailing);
        Ok(removed)
    }
}

fn replace_plain(current: &mut Value, value: Value) -> bool {
    if current.strict_eq(&value) {
        return false;
    }
    *current = value;
    true
}
