#![forbid(unsafe_code)]

//! The recursive observer.
//!
//! # Design
//!
//! [`Observer::observe`] walks a container depth-first. For every key present
//! when the walk reaches the container it captures the slot's value,
//! observes that value first if it is itself a container, and then replaces
//! the slot with an [`Accessor`] bound to the observer's sink.
//!
//! Containers are tracked by identity during a pass:
//!
//! - a container that is an ancestor of the current position is a cycle and
//!   is handled per [`CyclePolicy`];
//! - a container already observed elsewhere in the same pass (shared, not
//!   cyclic) is not walked again.
//!
//! # Invariants
//!
//! 1. Every key present at visit time ends up intercepted, unless the pass
//!    fails.
//! 2. A nested container's keys are installed before the parent key that
//!    holds it (pre-order with respect to installation).
//! 3. Observation emits no access events; capturing a value peeks it.
//! 4. Already intercepted slots keep their accessor. Their current value is
//!    still walked, so a container written into an entry after a previous
//!    pass gets observed on the next one.
//!
//! # Failure Modes
//!
//! - **Cycle under [`CyclePolicy::Reject`]**: the pass stops with
//!   [`PropwatchError::CycleDetected`]. Entries installed before the error
//!   stay intercepted.
//! - **Depth limit**: [`PropwatchError::DepthExceeded`], same partial state.

use std::rc::Rc;

use ahash::AHashSet;

use crate::accessor::Accessor;
use crate::config::{CyclePolicy, ObserverConfig};
use crate::container::{Container, ContainerId, Slot};
use crate::error::{PropwatchError, Result};
use crate::key::KeyPath;
use crate::sink::EventSink;
use crate::value::Value;

/// Outcome of one observation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserveReport {
    /// Paths that received a new accessor, in installation order.
    pub installed: Vec<KeyPath>,
    /// Distinct containers walked.
    pub containers: usize,
    /// Back-references to an ancestor that were skipped.
    pub cycles_skipped: usize,
    /// Repeat references to a container already walked in this pass.
    pub shared_skipped: usize,
    /// Entries that were already intercepted before this pass.
    pub already_intercepted: usize,
}

impl ObserveReport {
    /// Whether `path` received an accessor in this pass.
    #[must_use]
    pub fn installed_at(&self, path: &KeyPath) -> bool {
        self.installed.iter().any(|installed| installed == path)
    }

    /// Position of `path` in installation order.
    #[must_use]
    pub fn install_order(&self, path: &KeyPath) -> Option<usize> {
        self.installed.iter().position(|installed| installed == path)
    }
}

/// Installs accessors over a container tree.
///
/// The sink is shared by every accessor this observer installs; it outlives
/// the observer for as long as any observed container holds one of them.
#[derive(Clone)]
pub struct Observer {
    sink: Rc<dyn EventSink>,
    config: ObserverConfig,
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Observer {
    /// Create an observer reporting to `sink`, with default configuration.
    pub fn new(sink: impl EventSink + 'static) -> Self {
        Self::with_shared_sink(Rc::new(sink))
    }

    /// Create an observer from a sink the caller keeps a handle to.
    #[must_use]
    pub fn with_shared_sink(sink: Rc<dyn EventSink>) -> Self {
        Self {
            sink,
            config: ObserverConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ObserverConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Intercept every entry of `container`, recursively.
    pub fn observe(&self, container: &Container) -> Result<ObserveReport> {
        let span = tracing::debug_span!(
            "observe",
            kind = %container.kind(),
            len = container.len(),
            cycle_policy = %self.config.cycle_policy,
            removal_policy = %self.config.removal_policy,
        );
        let _enter = span.enter();

        let mut walk = Walk {
            observer: self,
            visited: AHashSet::new(),
            ancestors: AHashSet::new(),
            report: ObserveReport::default(),
        };
        walk.visit(container, &KeyPath::root(), 0)?;

        let report = walk.report;
        tracing::debug!(
            installed = report.installed.len(),
            containers = report.containers,
            cycles_skipped = report.cycles_skipped,
            shared_skipped = report.shared_skipped,
            "observe.done"
        );
        Ok(report)
    }

    /// Like [`observe`](Self::observe), for a value that may not be a
    /// container.
    pub fn observe_value(&self, value: &Value) -> Result<ObserveReport> {
        match value {
            Value::Container(container) => self.observe(container),
            Value::Primitive(_) => Err(PropwatchError::NotAContainer),
        }
    }
}

/// Observe `container` with default configuration.
pub fn observe(container: &Container, sink: impl EventSink + 'static) -> Result<ObserveReport> {
    Observer::new(sink).observe(container)
}

struct Walk<'a> {
    observer: &'a Observer,
    visited: AHashSet<ContainerId>,
    ancestors: AHashSet<ContainerId>,
    report: ObserveReport,
}

impl Walk<'_> {
    fn visit(&mut self, container: &Container, path: &KeyPath, depth: usize) -> Result<()> {
        let id = container.id();
        if self.ancestors.contains(&id) {
            return match self.observer.config.cycle_policy {
                CyclePolicy::Skip => {
                    tracing::debug!(path = %path, "observe.skip_cycle");
                    self.report.cycles_skipped += 1;
                    Ok(())
                }
                CyclePolicy::Reject => Err(PropwatchError::CycleDetected { path: path.clone() }),
            };
        }
        if self.visited.contains(&id) {
            tracing::trace!(path = %path, "observe.skip_shared");
            self.report.shared_skipped += 1;
            return Ok(());
        }
        if let Some(limit) = self.observer.config.max_depth
            && depth > limit
        {
            return Err(PropwatchError::DepthExceeded {
                limit,
                path: path.clone(),
            });
        }

        self.visited.insert(id);
        self.ancestors.insert(id);
        self.report.containers += 1;
        container.set_removal_policy(self.observer.config.removal_policy);

        for key in container.keys() {
            let child_path = path.child(key.clone());
            match container.slot(&key)? {
                Slot::Intercepted(accessor) => {
                    self.report.already_intercepted += 1;
                    if let Value::Container(child) = accessor.peek() {
                        self.visit(&child, &child_path, depth + 1)?;
                    }
                }
                Slot::Plain(value) => {
                    if let Value::Container(child) = &value {
                        self.visit(child, &child_path, depth + 1)?;
                    }
                    tracing::trace!(path = %child_path, value = value.type_name(), "observe.install");
                    let accessor =
                        Accessor::install(value, child_path.clone(), Rc::clone(&self.observer.sink));
                    container.install(&key, accessor)?;
                    self.report.installed.push(child_path);
                }
            }
        }

        self.ancestors.remove(&id);
        Ok(())
    }
}
