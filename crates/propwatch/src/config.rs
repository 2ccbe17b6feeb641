#![forbid(unsafe_code)]

//! Observer configuration.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// What the observer does when it reaches a container that is already an
/// ancestor on the current walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// Leave the back-reference entry without descending again.
    #[default]
    Skip,
    /// Abort the walk with [`PropwatchError::CycleDetected`](crate::PropwatchError::CycleDetected).
    Reject,
}

/// How removing a list position treats the accessors bound to later
/// positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// Later slots move down together with their accessors. An accessor keeps
    /// following its own value; no events are emitted.
    #[default]
    Rebind,
    /// Accessors stay bound to positions. Each later value is read from
    /// position `k + 1` and written into position `k` through the accessors,
    /// emitting their events, then the trailing slot is dropped.
    ShiftThrough,
}

/// Error returned when a policy name does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} policy '{value}' (expected one of: {expected})")]
pub struct ParsePolicyError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl CyclePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for CyclePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CyclePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "reject" | "error" => Ok(Self::Reject),
            _ => Err(ParsePolicyError {
                kind: "cycle",
                value: s.to_owned(),
                expected: "skip, reject",
            }),
        }
    }
}

impl RemovalPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rebind => "rebind",
            Self::ShiftThrough => "shift-through",
        }
    }
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemovalPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rebind" => Ok(Self::Rebind),
            "shift-through" | "shift_through" | "shift" => Ok(Self::ShiftThrough),
            _ => Err(ParsePolicyError {
                kind: "removal",
                value: s.to_owned(),
                expected: "rebind, shift-through",
            }),
        }
    }
}

/// Settings for an [`Observer`](crate::Observer) pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserverConfig {
    pub cycle_policy: CyclePolicy,
    /// Applied to every container the observer visits.
    pub removal_policy: RemovalPolicy,
    /// Deepest container nesting accepted, the root being depth 0.
    /// `None` means unlimited.
    pub max_depth: Option<usize>,
}

impl ObserverConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    #[must_use]
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}
