//! Path Reconstruction
//!
//! A path is the transient, ordered list of non-pivot vertices between the
//! source and destination of one successful search, rebuilt from the
//! predecessor map and discarded after consumption.

use crate::vertex::VertexId;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    vertices: Vec<VertexId>,
}

impl Path {
    /// Walk the predecessor chain back from `goal` and return it in
    /// source-to-destination order, with pivots filtered out.
    pub fn from_predecessors(
        goal: &VertexId,
        predecessors: &HashMap<VertexId, VertexId>,
        mut is_pivot: impl FnMut(&VertexId) -> bool,
    ) -> Self {
        let mut vertices = Vec::new();
        let mut cur = goal;
        while let Some(prev) = predecessors.get(cur) {
            cur = prev;
            if !is_pivot(cur) {
                vertices.push(cur.clone());
            }
        }
        vertices.reverse();
        Self { vertices }
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// First hop of the path, the contact the router should forward on.
    pub fn first_hop(&self) -> Option<&VertexId> {
        self.vertices.first()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.vertices.iter().map(|v| v.as_str()).collect();
        write!(f, "[{}]", ids.join(" -> "))
    }
}
