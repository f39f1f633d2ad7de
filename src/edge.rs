//! Edge: a Directed, Temporally-Feasible Link Between Vertices
//!
//! Edges reference vertices by id only; the graph owns all vertex storage.
//! An edge from `source` to `destination` exists when the two vertices share
//! a host and `source.adjusted_begin() < destination.end()`, i.e. something
//! received during `source` can still be forwarded during `destination`.
//! Multiple edges between the same pair across different windows are normal.

use crate::vertex::{Vertex, VertexId};

#[derive(Debug, Clone)]
pub struct Edge {
    id: String,
    source: VertexId,
    destination: VertexId,
}

impl Edge {
    pub fn new(source: VertexId, destination: VertexId) -> Self {
        let id = format!("{}_{}", source, destination);
        Self {
            id,
            source,
            destination,
        }
    }

    /// Whether a directed edge between these two vertices is valid.
    pub fn is_feasible(source: &Vertex, destination: &Vertex) -> bool {
        source.common_host(destination).is_some()
            && source.adjusted_begin() < destination.end()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &VertexId {
        &self.source
    }

    pub fn destination(&self) -> &VertexId {
        &self.destination
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "edge_{}", self.id)
    }
}
