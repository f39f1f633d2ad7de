//! The Time-Expanded Contact Graph
//!
//! Owns every vertex and the adjacency lists; everything else refers to
//! vertices by id. The graph is long-lived per routing node and mutated in
//! place across searches: vertices are pruned once their window has passed,
//! split when a reservation carves out the middle of a contact, and extended
//! when another node's knowledge is merged in.
//!
//! Ordered maps everywhere: iteration order feeds candidate discovery and
//! tie-breaking, which must be deterministic across runs.

use crate::contact::round2;
use crate::edge::Edge;
use crate::message::Message;
use crate::path::Path;
use crate::vertex::{Vertex, VertexId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: BTreeMap<VertexId, Vertex>,
    edges: BTreeMap<VertexId, Vec<Edge>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &BTreeMap<VertexId, Vertex> {
        &self.vertices
    }

    pub fn vertex(&self, id: &VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn vertex_mut(&mut self, id: &VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Outgoing edges of a vertex, empty if it has none.
    pub fn outgoing(&self, id: &VertexId) -> &[Edge] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Insert a vertex and wire feasible edges to and from every vertex
    /// sharing a host with it. Re-inserting a known id replaces the vertex
    /// without rewiring.
    pub fn insert_vertex(&mut self, vertex: Vertex) {
        let id = vertex.id().clone();
        if self.vertices.contains_key(&id) {
            self.vertices.insert(id, vertex);
            return;
        }

        let peers: Vec<VertexId> = self
            .vertices
            .values()
            .filter(|peer| vertex.common_host(peer).is_some())
            .map(|peer| peer.id().clone())
            .collect();

        self.vertices.insert(id.clone(), vertex);
        for peer in peers {
            self.add_edge(&id, &peer);
            self.add_edge(&peer, &id);
        }
    }

    /// Insert a pivot vertex without wiring any edges; the search attaches
    /// its edges explicitly so they can be detached just as explicitly.
    pub fn insert_pivot(&mut self, pivot: Vertex) {
        let id = pivot.id().clone();
        self.vertices.insert(id.clone(), pivot);
        self.edges.entry(id).or_default();
    }

    /// Add a directed edge if it is temporally feasible; returns whether an
    /// edge was added.
    pub fn add_edge(&mut self, source: &VertexId, destination: &VertexId) -> bool {
        let (src, dst) = match (self.vertices.get(source), self.vertices.get(destination)) {
            (Some(s), Some(d)) => (s, d),
            _ => return false,
        };
        if !Edge::is_feasible(src, dst) {
            return false;
        }
        self.edges
            .entry(source.clone())
            .or_default()
            .push(Edge::new(source.clone(), destination.clone()));
        true
    }

    /// Remove a vertex together with its whole adjacency list. Incoming
    /// edges are left to the caller (prune scans for them, pivot detachment
    /// knows them exactly).
    pub fn remove_vertex(&mut self, id: &VertexId) -> Option<Vertex> {
        self.edges.remove(id);
        self.vertices.remove(id)
    }

    /// Remove every `source -> destination` edge from one adjacency list.
    pub fn remove_edges_between(&mut self, source: &VertexId, destination: &VertexId) {
        if let Some(list) = self.edges.get_mut(source) {
            list.retain(|e| e.destination() != destination);
        }
    }

    /// Merge another node's knowledge: import every vertex we have not seen
    /// yet, wiring edges to and from everything sharing a host.
    pub fn merge(&mut self, other: &Graph) {
        for vertex in other.vertices.values() {
            if !self.vertices.contains_key(vertex.id()) {
                self.insert_vertex(vertex.clone());
            }
        }
    }

    /// Delete every vertex that can never be used again (`end < now`) and
    /// every pivot left over from a search that failed to clean up, plus all
    /// edges referencing them.
    pub fn prune(&mut self, now: f64) {
        let stale: BTreeSet<VertexId> = self
            .vertices
            .values()
            .filter(|v| v.end() < now || v.is_pivot())
            .map(|v| v.id().clone())
            .collect();
        if stale.is_empty() {
            return;
        }

        for id in &stale {
            self.vertices.remove(id);
            self.edges.remove(id);
        }
        for list in self.edges.values_mut() {
            list.retain(|e| !stale.contains(e.destination()));
        }
        debug!(pruned = stale.len(), "pruned stale vertices");
    }

    /// Reserve the message's transmission time on every vertex of the path.
    ///
    /// Walks the path keeping a running `comm_start`. A hop whose reservation
    /// begins exactly at the contact's unconsumed point just advances
    /// `adjusted_begin`; a hop whose reservation begins later keeps its free
    /// prefix and is split, with the residual tail materialized as a new
    /// vertex when it is worth keeping (see [`Graph::split_vertex`]).
    ///
    /// Vertices other than the ones on the path are never touched, so calling
    /// this again after a partial teardown cannot corrupt the graph.
    pub fn consume_path(&mut self, path: &Path, message: &Message, epsilon: f64) {
        let mut comm_start = 0.0_f64;
        for id in path.vertices() {
            let (adjusted_begin, end, speed) = {
                let v = self
                    .vertices
                    .get(id)
                    .expect("path references a vertex missing from the graph");
                (v.adjusted_begin(), v.end(), v.transmission_speed())
            };
            comm_start = comm_start.max(adjusted_begin);
            // begins may carry more than two decimals; rounding a
            // sub-centisecond transmission must not move the cursor backward
            let comm_end = round2(comm_start + message.size() as f64 / speed).max(comm_start);

            if comm_start > adjusted_begin && comm_start < end {
                // an earlier part of the contact stays genuinely free
                self.split_vertex(id, comm_start, comm_end, epsilon);
            } else {
                let v = self
                    .vertices
                    .get_mut(id)
                    .expect("path references a vertex missing from the graph");
                // the search does not bound arrival by the contact end, so a
                // reservation may overrun the window; it then takes all of it
                v.set_adjusted_begin(comm_end.min(end));
            }
            comm_start = comm_end;
        }
        debug!(message = message.id(), hops = path.len(), "consumed path");
    }

    /// Split a vertex around a consumed window `[cut, tail_begin)`.
    ///
    /// The original is truncated to end at `cut` and keeps representing the
    /// untouched prefix. If the residual tail `[tail_begin, original_end)`
    /// exceeds epsilon (milliseconds), it becomes a new vertex that inherits
    /// every outgoing edge of the original and every edge pointing into it,
    /// so future searches still reach the remaining capacity through the
    /// same predecessors. A sub-epsilon tail is dropped.
    ///
    /// Returns the id of the tail vertex, if one was created.
    pub fn split_vertex(
        &mut self,
        id: &VertexId,
        cut: f64,
        tail_begin: f64,
        epsilon: f64,
    ) -> Option<VertexId> {
        let (original_end, tail) = {
            let v = self
                .vertices
                .get_mut(id)
                .expect("split target missing from the graph");
            let original_end = v.end();
            v.set_end(cut);
            if tail_begin + epsilon * 1e-3 >= original_end {
                debug!(vertex = %id, "residual tail below epsilon, dropped");
                return None;
            }
            (original_end, Vertex::split(v, tail_begin, original_end))
        };

        let tail_id = tail.id().clone();
        debug!(original = %id, tail = %tail_id, "split vertex");
        self.vertices.insert(tail_id.clone(), tail);

        let outgoing: Vec<VertexId> = self
            .outgoing(id)
            .iter()
            .map(|e| e.destination().clone())
            .collect();
        for dst in outgoing {
            self.add_edge(&tail_id, &dst);
        }

        let incoming: Vec<VertexId> = self
            .edges
            .values()
            .flatten()
            .filter(|e| e.destination() == id)
            .map(|e| e.source().clone())
            .collect();
        for src in incoming {
            self.add_edge(&src, &tail_id);
        }

        Some(tail_id)
    }
}
