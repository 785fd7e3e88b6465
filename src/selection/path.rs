//! Interned path segments
//!
//! Hierarchical positions (archetype → stage → stage, sphere → move) are
//! stored as short vectors of `SegmentId`s pointing into an arena owned by
//! the catalog. Cascade matching is a prefix test over ids.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Index of an interned path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

/// Arena of path segment names
#[derive(Debug, Clone, Default)]
pub struct SegmentArena {
    names: Vec<String>,
    index: AHashMap<String, SegmentId>,
}

impl SegmentArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a segment, returning the existing id if already present
    pub fn intern(&mut self, name: &str) -> SegmentId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = SegmentId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    /// Look up a segment without interning it
    pub fn lookup(&self, name: &str) -> Option<SegmentId> {
        self.index.get(name).copied()
    }

    /// Resolve a segment id back to its name
    pub fn name(&self, id: SegmentId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Position of an ability in its lineage's hierarchy
///
/// Never empty: the first segment is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityPath(Vec<SegmentId>);

impl AbilityPath {
    /// Build a path; returns None for an empty segment list
    pub fn new(segments: Vec<SegmentId>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self(segments))
        }
    }

    pub fn root(&self) -> SegmentId {
        self.0[0]
    }

    /// Path length minus one (0 for a root)
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    pub fn segments(&self) -> &[SegmentId] {
        &self.0
    }

    /// Segments of the parent node (None for a root)
    pub fn parent(&self) -> Option<&[SegmentId]> {
        if self.0.len() > 1 {
            Some(&self.0[..self.0.len() - 1])
        } else {
            None
        }
    }

    /// True if `prefix` is a leading slice of this path (or equal to it)
    pub fn starts_with(&self, prefix: &[SegmentId]) -> bool {
        self.0.starts_with(prefix)
    }

    /// Render the path with names from the arena, e.g. `sentinel→alpha`
    pub fn display(&self, arena: &SegmentArena) -> String {
        self.0
            .iter()
            .map(|id| arena.name(*id).unwrap_or("?"))
            .collect::<Vec<_>>()
            .join("→")
    }
}
