//! Locations within schemas and validated instances.
use std::{fmt, fmt::Write, slice::Iter};

/// JSON Pointer to a location inside a schema or an instance.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JsonPointer(Vec<PathChunk>);

impl JsonPointer {
    /// Create an empty pointer.
    pub(crate) const fn empty() -> Self {
        JsonPointer(Vec::new())
    }

    /// Iterate over the path segments.
    pub fn iter(&self) -> Iter<'_, PathChunk> {
        self.0.iter()
    }

    /// The last path segment, if any.
    #[must_use]
    pub fn last(&self) -> Option<&PathChunk> {
        self.0.last()
    }

    /// Each segment rendered as a `String`. Consumes the pointer.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
            .into_iter()
            .map(|chunk| match chunk {
                PathChunk::Property(property) => property.into_string(),
                PathChunk::Index(index) => index.to_string(),
                PathChunk::Keyword(keyword) => keyword.to_string(),
            })
            .collect()
    }

    pub(crate) fn join(&self, chunk: impl Into<PathChunk>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(chunk.into());
        JsonPointer(segments)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in &self.0 {
            f.write_char('/')?;
            match chunk {
                PathChunk::Property(property) => {
                    for ch in property.chars() {
                        match ch {
                            '~' => f.write_str("~0")?,
                            '/' => f.write_str("~1")?,
                            _ => f.write_char(ch)?,
                        }
                    }
                }
                PathChunk::Index(index) => f.write_str(itoa::Buffer::new().format(*index))?,
                PathChunk::Keyword(keyword) => f.write_str(keyword)?,
            }
        }
        Ok(())
    }
}

impl serde::Serialize for JsonPointer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A single step on the way to a value: an object key, an array index, or a
/// schema keyword.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathChunk {
    /// Property name within a JSON object.
    Property(Box<str>),
    /// Index within a JSON array.
    Index(usize),
    /// JSON Schema keyword.
    Keyword(&'static str),
}

impl From<String> for PathChunk {
    #[inline]
    fn from(value: String) -> Self {
        PathChunk::Property(value.into_boxed_str())
    }
}

impl From<&'static str> for PathChunk {
    #[inline]
    fn from(value: &'static str) -> Self {
        PathChunk::Keyword(value)
    }
}

impl From<usize> for PathChunk {
    #[inline]
    fn from(value: usize) -> Self {
        PathChunk::Index(value)
    }
}

/// A borrowed segment of an instance location.
#[derive(Copy, Clone, Debug)]
pub(crate) enum SegmentRef<'a> {
    Key(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for SegmentRef<'a> {
    #[inline]
    fn from(value: &'a str) -> Self {
        SegmentRef::Key(value)
    }
}

impl From<usize> for SegmentRef<'_> {
    #[inline]
    fn from(value: usize) -> Self {
        SegmentRef::Index(value)
    }
}

/// Linked list of instance path segments.
///
/// Descending into a member pushes a stack-allocated node that borrows its
/// parent, so tracking the current location costs nothing unless an error is
/// actually constructed.
#[derive(Clone, Debug, Default)]
pub(crate) struct InstancePath<'a> {
    segment: Option<SegmentRef<'a>>,
    parent: Option<&'a InstancePath<'a>>,
}

impl<'a> InstancePath<'a> {
    pub(crate) const fn new() -> Self {
        InstancePath {
            segment: None,
            parent: None,
        }
    }

    #[inline]
    pub(crate) fn push(&'a self, segment: impl Into<SegmentRef<'a>>) -> InstancePath<'a> {
        InstancePath {
            segment: Some(segment.into()),
            parent: Some(self),
        }
    }

    pub(crate) fn to_pointer(&self) -> JsonPointer {
        let mut segments = Vec::new();
        let mut node = Some(self);
        while let Some(current) = node {
            if let Some(segment) = current.segment {
                segments.push(match segment {
                    SegmentRef::Key(key) => PathChunk::Property(key.into()),
                    SegmentRef::Index(index) => PathChunk::Index(index),
                });
            }
            node = current.parent;
        }
        segments.reverse();
        JsonPointer(segments)
    }
}

impl From<&InstancePath<'_>> for JsonPointer {
    #[inline]
    fn from(path: &InstancePath<'_>) -> Self {
        path.to_pointer()
    }
}

impl From<&[PathChunk]> for JsonPointer {
    #[inline]
    fn from(chunks: &[PathChunk]) -> Self {
        JsonPointer(chunks.to_vec())
    }
}
