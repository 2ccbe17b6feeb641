#![forbid(unsafe_code)]

//! Entry keys and the paths that locate an entry inside a value tree.
//!
//! A [`KeyPath`] renders as `$` for the root, `[i]` for list positions and
//! `.name` for map keys, e.g. `$.items[2].label`. Names that are not plain
//! identifiers render bracket-quoted: `$["two words"]`.

use std::fmt;

use serde::{Serialize, Serializer};
use smallvec::SmallVec;

/// Key of a single entry: a list position or a map name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Name(_) => None,
        }
    }

    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    /// The key on its own, outside a path: `3` or `"name"`.
    #[must_use]
    pub fn bare(&self) -> impl fmt::Display + '_ {
        BareKey(self)
    }
}

struct BareKey<'a>(&'a Key);

impl fmt::Display for BareKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Key::Index(index) => write!(f, "{index}"),
            Key::Name(name) => write_quoted(f, name),
        }
    }
}

/// JSON string quoting, as used in bracket path segments.
fn write_quoted(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let quoted = serde_json::to_string(name).map_err(|_| fmt::Error)?;
    f.write_str(&quoted)
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Name(name) if is_identifier(name) => write!(f, ".{name}"),
            Self::Name(name) => {
                f.write_str("[")?;
                write_quoted(f, name)?;
                f.write_str("]")
            }
        }
    }
}

/// Location of an entry, from the observed root down.
///
/// Most trees are shallow, so up to four segments are stored inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: SmallVec<[Key; 4]>,
}

impl KeyPath {
    /// The empty path, addressing the root container itself.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// A new path extending `self` by one key.
    #[must_use]
    pub fn child(&self, key: Key) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key);
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[Key] {
        &self.segments
    }

    #[must_use]
    pub fn last(&self) -> Option<&Key> {
        self.segments.last()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `self` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &KeyPath) -> bool {
        self.segments.len() > ancestor.segments.len()
            && self.segments[..ancestor.segments.len()] == ancestor.segments[..]
    }
}

impl FromIterator<Key> for KeyPath {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for key in &self.segments {
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

impl Serialize for KeyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
