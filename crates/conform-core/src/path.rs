//! # Failure Paths
//!
//! A [`Path`] addresses a failure site from the root of the validated value:
//! mapping keys, sequence indices, object attributes, and the synthetic group
//! segments used by exclusion/inclusion constraints.
//!
//! Paths render as `data['a'][0]['name'][<group>]`. Group segments render in
//! angle brackets so they cannot be mistaken for a text key of the same name.

use std::fmt;

use crate::value::Value;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A mapping key.
    Key(Value),
    /// A position in a list or tuple.
    Index(usize),
    /// An object attribute name.
    Attr(String),
    /// A named exclusion/inclusion group.
    Group(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Attr(name) => write!(f, "{}", Value::Str(name.clone())),
            PathSegment::Group(name) => write!(f, "<{name}>"),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(Value::from(key))
    }
}

impl From<Value> for PathSegment {
    fn from(key: Value) -> Self {
        PathSegment::Key(key)
    }
}

/// Root-to-leaf sequence of [`PathSegment`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The empty path, addressing the root value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Append a segment at the leaf end.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Insert a segment at the root end.
    pub fn prepend(&mut self, segment: PathSegment) {
        self.0.insert(0, segment);
    }

    /// Iterate segments, root first.
    pub fn iter(&self) -> std::slice::Iter<'_, PathSegment> {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("data")?;
        for segment in &self.0 {
            write!(f, "[{segment}]")?;
        }
        Ok(())
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Path(segments)
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_rendering() {
        let path: Path = vec![
            PathSegment::from("adict"),
            PathSegment::Index(0),
            PathSegment::Key(Value::Int(10)),
            PathSegment::Attr("name".into()),
        ]
        .into();
        assert_eq!(path.to_string(), "data['adict'][0][10]['name']");
    }

    #[test]
    fn test_group_segment_is_distinct_from_key() {
        let group = PathSegment::Group("angles".into());
        let key = PathSegment::from("angles");
        assert_ne!(group, key);
        assert_eq!(group.to_string(), "<angles>");
        assert_eq!(key.to_string(), "'angles'");
    }

    #[test]
    fn test_prepend_grows_at_root() {
        let mut path = Path::root();
        path.push(1usize);
        path.prepend(PathSegment::from("items"));
        assert_eq!(path.len(), 2);
        assert_eq!(path.to_string(), "data['items'][1]");
    }
}
