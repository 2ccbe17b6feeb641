#![forbid(unsafe_code)]

//! Access events emitted by intercepted entries.

use std::fmt;

use serde::Serialize;

use crate::key::KeyPath;

/// What happened to an intercepted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    /// The entry was read.
    Read,
    /// The entry was written with a value different from its current one.
    Write,
}

impl AccessKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One intercepted access.
///
/// `path` is where the accessor was installed, which is not necessarily
/// where its value lives now if the container was structurally changed
/// under [`RemovalPolicy::Rebind`](crate::RemovalPolicy::Rebind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessEvent {
    pub kind: AccessKind,
    pub path: KeyPath,
}

impl AccessEvent {
    #[must_use]
    pub fn new(kind: AccessKind, path: KeyPath) -> Self {
        Self { kind, path }
    }

    #[must_use]
    pub fn read(path: KeyPath) -> Self {
        Self::new(AccessKind::Read, path)
    }

    #[must_use]
    pub fn write(path: KeyPath) -> Self {
        Self::new(AccessKind::Write, path)
    }
}

impl fmt::Display for AccessEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path)
    }
}
