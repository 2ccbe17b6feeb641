#![forbid(unsafe_code)]

//! Error type shared by observation and container access.

use thiserror::Error;

use crate::container::ContainerKind;
use crate::key::{Key, KeyPath};

pub type Result<T> = std::result::Result<T, PropwatchError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropwatchError {
    #[error("value is a primitive, not a list or map")]
    NotAContainer,

    #[error("cycle detected: container at {path} is its own ancestor")]
    CycleDetected { path: KeyPath },

    #[error("nesting depth limit {limit} exceeded at {path}")]
    DepthExceeded { limit: usize, path: KeyPath },

    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("key not found: {}", .key.bare())]
    KeyNotFound { key: Key },

    #[error("key {} does not address a {found}", .key.bare())]
    KindMismatch { key: Key, found: ContainerKind },
}

impl PropwatchError {
    /// The key path this error refers to, when it has one.
    #[must_use]
    pub fn path(&self) -> Option<&KeyPath> {
        match self {
            Self::CycleDetected { path } | Self::DepthExceeded { path, .. } => Some(path),
            _ => None,
        }
    }
}
