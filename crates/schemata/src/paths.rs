//! Instance and keyword locations as JSON Pointers.
//!
//! During evaluation, paths are tracked with [`LazyLocation`], a parent-linked
//! chain of borrowed segments that lives on the stack and allocates nothing
//! until a result is actually recorded. [`Location`] is the owned, resolved
//! form stored in results.

use std::fmt;
use std::sync::Arc;

use schemata_referencing::escape_segment;

/// A single path segment: an object property or an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSegment<'a> {
    Property(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for LocationSegment<'a> {
    fn from(value: &'a str) -> LocationSegment<'a> {
        LocationSegment::Property(value)
    }
}

impl<'a> From<&'a String> for LocationSegment<'a> {
    fn from(value: &'a String) -> LocationSegment<'a> {
        LocationSegment::Property(value)
    }
}

impl From<usize> for LocationSegment<'_> {
    fn from(value: usize) -> LocationSegment<'static> {
        LocationSegment::Index(value)
    }
}

impl fmt::Display for LocationSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationSegment::Property(property) => f.write_str(&escape_segment(property)),
            LocationSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// An owned JSON Pointer. The root is the empty string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Location(Arc<str>);

impl Location {
    #[must_use]
    pub fn new() -> Location {
        Location(Arc::from(""))
    }

    /// Append one segment, escaping `~` and `/` per RFC 6901.
    #[must_use]
    pub fn join<'a>(&self, segment: impl Into<LocationSegment<'a>>) -> Location {
        Location(Arc::from(format!("{}/{}", self.0, segment.into())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `root` for the empty pointer, `` `pointer` `` otherwise; used in error
    /// messages.
    #[must_use]
    pub fn formatted(&self) -> String {
        if self.0.is_empty() {
            "root".to_string()
        } else {
            format!("`{}`", self.0)
        }
    }
}

impl Default for Location {
    fn default() -> Location {
        Location::new()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Location {
        Location(Arc::from(value))
    }
}

/// A lazily-resolved location: a chain of borrowed segments from the root of
/// the current evaluation.
///
/// Children borrow their parent, so a chain never outlives the evaluation
/// frame that built it.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LazyLocation<'a, 'b> {
    Root,
    Node {
        segment: LocationSegment<'a>,
        parent: &'b LazyLocation<'a, 'b>,
    },
}

impl<'a> LazyLocation<'a, '_> {
    pub(crate) fn new() -> LazyLocation<'static, 'static> {
        LazyLocation::Root
    }

    pub(crate) fn push(&self, segment: impl Into<LocationSegment<'a>>) -> LazyLocation<'a, '_> {
        LazyLocation::Node {
            segment: segment.into(),
            parent: self,
        }
    }

    /// Materialize the chain into an owned pointer string.
    pub(crate) fn resolve(&self) -> Location {
        let mut segments = Vec::new();
        let mut current = self;
        while let LazyLocation::Node { segment, parent } = current {
            segments.push(*segment);
            current = *parent;
        }
        if segments.is_empty() {
            return Location::new();
        }
        let mut output = String::new();
        for segment in segments.iter().rev() {
            output.push('/');
            match segment {
                LocationSegment::Property(property) => output.push_str(&escape_segment(property)),
                LocationSegment::Index(index) => {
                    let mut buffer = itoa::Buffer::new();
                    output.push_str(buffer.format(*index));
                }
            }
        }
        Location(Arc::from(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_resolves_to_empty() {
        assert_eq!(LazyLocation::new().resolve().as_str(), "");
        assert_eq!(Location::new().as_str(), "");
        assert_eq!(Location::new().formatted(), "root");
    }

    #[test]
    fn chains_resolve_in_order() {
        let root = LazyLocation::new();
        let properties = root.push("properties");
        let name = properties.push("a/b");
        let index = name.push(3);
        assert_eq!(index.resolve().as_str(), "/properties/a~1b/3");
        assert_eq!(index.resolve().formatted(), "`/properties/a~1b/3`");
    }

    #[test]
    fn join_escapes_tokens() {
        let location = Location::new().join("x~y").join(0usize);
        assert_eq!(location.as_str(), "/x~0y/0");
    }
}
