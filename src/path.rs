//! # Field Paths
//!
//! A [`FieldPath`] identifies a location inside the source document. Every
//! diagnostic carries one so callers can point a content producer at the exact
//! offending value.
//!
//! Two renderings are supported:
//!
//! * `Display`: a dotted, human readable form such as `links[0].href`
//! * [`FieldPath::to_pointer`]: a JSON pointer such as `/links/0/href`, used
//!   when errors are serialized

use std::fmt;

use serde::{Serialize, Serializer};

/// Single step inside a JSON document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Ordered sequence of keys and indices from the document root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path extended by an object key
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.push(PathSegment::Key(key.into()))
    }

    /// Returns a new path extended by an array index
    pub fn index(&self, index: usize) -> Self {
        self.push(PathSegment::Index(index))
    }

    fn push(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last object key of the path, skipping trailing indices
    pub fn last_key(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            PathSegment::Key(key) => Some(key.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Renders the path as an RFC 6901 JSON pointer (`/links/0/href`).
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for segment in &self.segments {
            pointer.push('/');
            match segment {
                PathSegment::Key(key) => {
                    pointer.push_str(&key.replace('~', "~0").replace('/', "~1"))
                }
                PathSegment::Index(index) => pointer.push_str(&index.to_string()),
            }
        }
        pointer
    }

    /// Parses a JSON pointer back into a path.
    ///
    /// Purely numeric tokens are read as array indices, which is how schema
    /// validators report positions inside arrays.
    pub fn from_pointer(pointer: &str) -> Self {
        let segments = pointer
            .split('/')
            .skip(1)
            .map(|token| {
                let token = token.replace("~1", "/").replace("~0", "~");
                match token.parse::<usize>() {
                    Ok(index) if !token.starts_with('+') => PathSegment::Index(index),
                    _ => PathSegment::Key(token),
                }
            })
            .collect();
        Self { segments }
    }

    /// Display form, with the root spelled out
    pub fn label(&self) -> String {
        if self.is_root() {
            "document root".to_string()
        } else {
            self.to_string()
        }
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '@')
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if is_plain_key(key) => {
                    if position > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", key)?;
                }
                PathSegment::Key(key) => write!(f, "[{:?}]", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FromIterator<PathSegment> for FieldPath {
    fn from_iter<T: IntoIterator<Item = PathSegment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_pointer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let path = FieldPath::root().key("links").index(0).key("href");
        assert_eq!(path.to_string(), "links[0].href");

        let path = FieldPath::root().key("metadata").key("@type");
        assert_eq!(path.to_string(), "metadata.@type");

        // keys that would be ambiguous in dotted form are quoted
        let path = FieldPath::root()
            .key("properties")
            .key("http://example.org/x");
        assert_eq!(path.to_string(), "properties[\"http://example.org/x\"]");

        assert_eq!(FieldPath::root().to_string(), "");
        assert_eq!(FieldPath::root().label(), "document root");
    }

    #[test]
    fn test_pointer() {
        let path = FieldPath::root().key("links").index(0).key("href");
        assert_eq!(path.to_pointer(), "/links/0/href");
        assert_eq!(FieldPath::from_pointer("/links/0/href"), path);

        let path = FieldPath::root().key("a/b").key("c~d");
        assert_eq!(path.to_pointer(), "/a~1b/c~0d");
        assert_eq!(FieldPath::from_pointer("/a~1b/c~0d"), path);

        assert_eq!(FieldPath::from_pointer(""), FieldPath::root());
        assert_eq!(FieldPath::root().to_pointer(), "");
    }

    #[test]
    fn test_navigation() {
        let path = FieldPath::root().key("publications").index(3);
        assert_eq!(path.last_key(), Some("publications"));
        assert_eq!(path.parent(), Some(FieldPath::root().key("publications")));
        assert!(path.starts_with(&FieldPath::root().key("publications")));
        assert_eq!(FieldPath::root().parent(), None);
    }

    #[test]
    fn test_serialize() {
        let path = FieldPath::root().key("links").index(1);
        assert_eq!(
            serde_json::to_value(&path).unwrap(),
            serde_json::json!("/links/1")
        );
    }
}
