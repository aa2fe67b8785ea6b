//! Navigable paths: positions in the object domain such as `p.address.city`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of a [`NavigablePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    /// Entity name for the root segment, attribute name otherwise.
    pub name: String,
    /// Explicit alias given in the query, if any.
    pub alias: Option<String>,
}

/// Hierarchical identifier of a from-element or attribute chain.
///
/// Two paths are equal when every segment (name and alias) is equal, so a
/// root `Person(p)` and a root `Person(q)` are distinct from-elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavigablePath {
    segments: Vec<PathSegment>,
}

impl NavigablePath {
    /// A root path for an entity with an optional alias.
    #[must_use]
    pub fn root(entity: impl Into<String>, alias: Option<&str>) -> Self {
        Self {
            segments: vec![PathSegment {
                name: entity.into(),
                alias: alias.map(str::to_owned),
            }],
        }
    }

    /// Extend this path by an attribute.
    #[must_use]
    pub fn append(&self, attribute: impl Into<String>) -> Self {
        self.append_segment(attribute.into(), None)
    }

    /// Extend this path by an aliased attribute (an explicit join).
    #[must_use]
    pub fn append_aliased(&self, attribute: impl Into<String>, alias: &str) -> Self {
        self.append_segment(attribute.into(), Some(alias.to_owned()))
    }

    fn append_segment(&self, name: String, alias: Option<String>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(PathSegment { name, alias });
        Self { segments }
    }

    /// The path this one extends, `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Whether this path denotes a root from-element.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.len() <= 1
    }

    /// Name of the last segment (attribute name, or entity name for a root).
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.segments.last().map_or("", |s| s.name.as_str())
    }

    /// Alias of the last segment.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.segments.last().and_then(|s| s.alias.as_deref())
    }

    /// Entity name of the root segment.
    #[must_use]
    pub fn root_name(&self) -> &str {
        self.segments.first().map_or("", |s| s.name.as_str())
    }

    /// All segments, root first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Attribute names below the root.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().skip(1).map(|s| s.name.as_str())
    }

    /// Replace the entity name of the root segment, keeping its alias and
    /// every attribute below it.
    #[must_use]
    pub fn with_root_entity(&self, entity: &str) -> Self {
        let mut segments = self.segments.clone();
        if let Some(first) = segments.first_mut() {
            first.name = entity.to_owned();
        }
        Self { segments }
    }
}

impl fmt::Display for NavigablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&seg.name)?;
            if let Some(alias) = &seg.alias {
                write!(f, "({alias})")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_and_children() {
        let root = NavigablePath::root("Person", Some("p"));
        let city = root.append("address").append("city");
        assert!(root.is_root());
        assert!(!city.is_root());
        assert_eq!(city.local_name(), "city");
        assert_eq!(city.root_name(), "Person");
        assert_eq!(city.to_string(), "Person(p).address.city");
        assert_eq!(city.attribute_names().collect::<Vec<_>>(), ["address", "city"]);
    }

    #[test]
    fn parent_walks_up() {
        let root = NavigablePath::root("Person", Some("p"));
        let addr = root.append("address");
        assert_eq!(addr.parent(), Some(root.clone()));
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn alias_distinguishes_paths() {
        let p = NavigablePath::root("Person", Some("p"));
        let q = NavigablePath::root("Person", Some("q"));
        assert_ne!(p, q);
        let j1 = p.append_aliased("friends", "f");
        let j2 = p.append("friends");
        assert_ne!(j1, j2);
        assert_eq!(j1.alias(), Some("f"));
    }

    #[test]
    fn root_entity_substitution_keeps_tail() {
        let path = NavigablePath::root("Animal", Some("a")).append("name");
        let swapped = path.with_root_entity("Dog");
        assert_eq!(swapped.to_string(), "Dog(a).name");
    }
}
