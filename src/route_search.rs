//! Route Search: Modified Dijkstra over the Contact Graph
//!
//! One `search()` call runs a full state machine: prune the graph, discover
//! source and destination candidate contacts, attach zero-cost pivot anchors,
//! relax edges with a pluggable distance metric until the destination pivot
//! settles, detach the pivots, and enforce the message deadline on the final
//! arrival time. All per-edge filters fail closed; only the `Option` result
//! communicates failure.
//!
//! Determinism: the frontier is ordered by `(distance, id)` and every
//! iteration source is an ordered map, so two searches over identical graphs
//! and inputs return identical results.

use crate::contact::Contact;
use crate::graph::Graph;
use crate::host::{HostId, HostTable};
use crate::message::Message;
use crate::path::Path;
use crate::predictions::PredictionProvider;
use crate::vertex::{Vertex, VertexId};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Relative weight of predicted free capacity in [`DistanceMetric::FairDistribution`]
const CAP_WEIGHT: f64 = 0.5;
/// Relative weight of predicted contact frequency in [`DistanceMetric::FairDistribution`]
const FREQ_WEIGHT: f64 = 0.5;

/// The distance function used during relaxation.
///
/// A closed set of strategies dispatched explicitly; selecting a variant
/// always takes effect. Pivots cost nothing extra under every metric.
pub enum DistanceMetric {
    /// Earliest arrival: `max(distance[cur], neighbor.adjusted_begin()) +
    /// size / speed`. The default.
    LeastLatency,
    /// Fewest contacts: `distance[cur] + 1`.
    HopCount,
    /// Prefer contacts with high predicted free capacity and frequent
    /// recurrence, weighting both against the graph-wide averages. Consumes
    /// externally supplied predictions; a vertex without usable predictions
    /// is unreachable under this metric.
    FairDistribution(Box<dyn PredictionProvider>),
}

impl std::fmt::Debug for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LeastLatency => write!(f, "LeastLatency"),
            Self::HopCount => write!(f, "HopCount"),
            Self::FairDistribution(_) => write!(f, "FairDistribution"),
        }
    }
}

/// Frontier key: distance first, vertex id as the deterministic tie-break.
#[derive(Debug, Clone, PartialEq)]
struct FrontierKey {
    distance: f64,
    id: VertexId,
}

impl Eq for FrontierKey {}

impl Ord for FrontierKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for FrontierKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-node search orchestrator. Reusable across calls; all per-search state
/// is reset on entry.
pub struct RouteSearch {
    metric: DistanceMetric,
    distances: HashMap<VertexId, f64>,
    hops: HashMap<VertexId, u32>,
    predecessors: HashMap<VertexId, VertexId>,
    settled: HashSet<VertexId>,
    unsettled: BTreeSet<FrontierKey>,
    expire_time: f64,
    pivot_begin: Option<VertexId>,
    pivot_end: Option<VertexId>,
    avg_capacity: f64,
    avg_frequency: f64,
}

impl RouteSearch {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            distances: HashMap::new(),
            hops: HashMap::new(),
            predecessors: HashMap::new(),
            settled: HashSet::new(),
            unsettled: BTreeSet::new(),
            expire_time: f64::INFINITY,
            pivot_begin: None,
            pivot_end: None,
            avg_capacity: 0.0,
            avg_frequency: 0.0,
        }
    }

    pub fn metric(&self) -> &DistanceMetric {
        &self.metric
    }

    pub fn set_metric(&mut self, metric: DistanceMetric) {
        self.metric = metric;
    }

    /// Find the best path for `message` from `current` at simulated time
    /// `now`.
    ///
    /// Returns the destination pivot's id on success; its predecessor chain
    /// (via [`RouteSearch::path`]) is the usable path. Returns `None` when no
    /// temporally and capacity-feasible path exists or the best one arrives
    /// after the message expires.
    pub fn search(
        &mut self,
        graph: &mut Graph,
        hosts: &HostTable,
        current: &HostId,
        now: f64,
        message: &Message,
    ) -> Option<VertexId> {
        self.expire_time = message.expiration(now);
        graph.prune(now);

        let (sources, destinations) = self.find_candidates(graph, current, now, message);
        if sources.is_empty() || destinations.is_empty() {
            debug!(
                message = message.id(),
                sources = sources.len(),
                destinations = destinations.len(),
                "no pivot candidates, no route"
            );
            return None;
        }

        let (pivot_begin, pivot_end) =
            self.attach_pivots(graph, current, message.to(), &sources, &destinations);

        let mut blacklist: Vec<HostId> = message.visited().to_vec();
        blacklist.retain(|h| h != current);

        let goal = self.run_dijkstra(graph, hosts, &pivot_begin, &pivot_end, now, message, &blacklist);

        self.detach_pivots(graph, &pivot_begin, &pivot_end, &destinations);

        let goal = goal?;
        if self.final_distance(&goal) > self.expire_time {
            debug!(message = message.id(), "path found but message expires first");
            return None;
        }
        Some(goal)
    }

    /// Reconstruct the path of the last successful search.
    pub fn path(&self, goal: &VertexId) -> Path {
        Path::from_predecessors(goal, &self.predecessors, |id| {
            Some(id) == self.pivot_begin.as_ref() || Some(id) == self.pivot_end.as_ref()
        })
    }

    /// Arrival time (or metric cost) at the goal's predecessor, the value
    /// the deadline check compares against.
    fn final_distance(&self, goal: &VertexId) -> f64 {
        self.predecessors
            .get(goal)
            .and_then(|pred| self.distances.get(pred))
            .copied()
            .unwrap_or(0.0)
    }

    /// Collect non-pivot vertices with enough residual capacity, still open
    /// at `now`, that contain the current host (sources) or the destination
    /// host (destinations), each ordered by `(adjusted_begin, id)`.
    fn find_candidates(
        &self,
        graph: &Graph,
        current: &HostId,
        now: f64,
        message: &Message,
    ) -> (Vec<VertexId>, Vec<VertexId>) {
        let size = message.size() as f64;
        let mut sources: Vec<(f64, VertexId)> = Vec::new();
        let mut destinations: Vec<(f64, VertexId)> = Vec::new();

        for v in graph.vertices().values() {
            if v.is_pivot() || v.current_capacity() <= size || v.end() <= now {
                continue;
            }
            if v.contains_host(current) {
                sources.push((v.adjusted_begin(), v.id().clone()));
            }
            if v.contains_host(message.to()) {
                destinations.push((v.adjusted_begin(), v.id().clone()));
            }
        }

        let by_begin_then_id = |a: &(f64, VertexId), b: &(f64, VertexId)| {
            a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1))
        };
        sources.sort_by(by_begin_then_id);
        destinations.sort_by(by_begin_then_id);

        (
            sources.into_iter().map(|(_, id)| id).collect(),
            destinations.into_iter().map(|(_, id)| id).collect(),
        )
    }

    /// Create both pivots and wire their edges: begin pivot to every source
    /// candidate, every destination candidate to the end pivot. The edges
    /// are recorded by candidate list so detachment never scans the graph.
    fn attach_pivots(
        &mut self,
        graph: &mut Graph,
        current: &HostId,
        destination: &HostId,
        sources: &[VertexId],
        destinations: &[VertexId],
    ) -> (VertexId, VertexId) {
        let begin_id = VertexId::new(format!("pivot_src_{current}"));
        let end_id = VertexId::new(format!("pivot_dst_{destination}"));

        let mut pivot_begin = Vertex::pivot(begin_id.clone(), Contact::pivot(current));
        pivot_begin.set_receiver(current.clone());
        pivot_begin.set_sender(current.clone());
        let mut pivot_end = Vertex::pivot(end_id.clone(), Contact::pivot(destination));
        pivot_end.set_receiver(destination.clone());

        graph.insert_pivot(pivot_begin);
        graph.insert_pivot(pivot_end);

        for src in sources {
            graph.add_edge(&begin_id, src);
        }
        for dst in destinations {
            graph.add_edge(dst, &end_id);
        }

        self.pivot_begin = Some(begin_id.clone());
        self.pivot_end = Some(end_id.clone());
        (begin_id, end_id)
    }

    /// Undo exactly what [`RouteSearch::attach_pivots`] did, leaving the
    /// graph reusable for the next search.
    fn detach_pivots(
        &mut self,
        graph: &mut Graph,
        pivot_begin: &VertexId,
        pivot_end: &VertexId,
        destinations: &[VertexId],
    ) {
        graph.remove_vertex(pivot_begin);
        graph.remove_vertex(pivot_end);
        for dst in destinations {
            graph.remove_edges_between(dst, pivot_end);
        }
    }

    fn init(&mut self, graph: &Graph, pivot_begin: &VertexId, now: f64) {
        self.distances.clear();
        self.hops.clear();
        self.predecessors.clear();
        self.settled.clear();
        self.unsettled.clear();

        for id in graph.vertices().keys() {
            self.distances.insert(id.clone(), f64::INFINITY);
            self.hops.insert(id.clone(), u32::MAX);
        }
        self.distances.insert(pivot_begin.clone(), now);
        self.hops.insert(pivot_begin.clone(), 0);
        self.unsettled.insert(FrontierKey {
            distance: now,
            id: pivot_begin.clone(),
        });

        // graph-wide prediction averages feed the fairness weights
        let mut averages = None;
        if let DistanceMetric::FairDistribution(provider) = &self.metric {
            let (mut cap_sum, mut cap_n, mut freq_sum, mut freq_n) = (0.0, 0u32, 0.0, 0u32);
            for v in graph.vertices().values().filter(|v| !v.is_pivot()) {
                let pair = v.pair_id();
                if let Some(cap) = provider.free_capacity(&pair) {
                    if cap > 0.0 {
                        cap_sum += cap;
                        cap_n += 1;
                    }
                }
                if let Some(freq) = provider.time_between_contacts(&pair) {
                    if freq > 0.0 {
                        freq_sum += freq;
                        freq_n += 1;
                    }
                }
            }
            let avg_cap = if cap_n > 0 { cap_sum / f64::from(cap_n) } else { 0.0 };
            let avg_freq = if freq_n > 0 { freq_sum / f64::from(freq_n) } else { 0.0 };
            averages = Some((avg_cap, avg_freq));
        }
        if let Some((cap, freq)) = averages {
            self.avg_capacity = cap;
            self.avg_frequency = freq;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_dijkstra(
        &mut self,
        graph: &mut Graph,
        hosts: &HostTable,
        pivot_begin: &VertexId,
        pivot_end: &VertexId,
        now: f64,
        message: &Message,
        blacklist: &[HostId],
    ) -> Option<VertexId> {
        self.init(graph, pivot_begin, now);

        while let Some(key) = self.unsettled.pop_first() {
            if key.id == *pivot_end {
                return Some(key.id);
            }
            self.relax(graph, hosts, &key.id, message, blacklist);
            self.settled.insert(key.id);
        }
        None
    }

    /// Relax every outgoing edge of `cur_id`. Each filter fails closed: a
    /// skipped edge is simply not relaxed.
    fn relax(
        &mut self,
        graph: &mut Graph,
        hosts: &HostTable,
        cur_id: &VertexId,
        message: &Message,
        blacklist: &[HostId],
    ) {
        let cur = match graph.vertex(cur_id) {
            Some(v) => v.clone(),
            None => return,
        };
        let size = message.size() as f64;
        let outgoing: Vec<VertexId> = graph
            .outgoing(cur_id)
            .iter()
            .map(|e| e.destination().clone())
            .collect();

        for n_id in outgoing {
            let neighbor = match graph.vertex(&n_id) {
                Some(v) => v,
                None => continue,
            };
            if self.settled.contains(&n_id) {
                continue;
            }
            // loop avoidance: never revisit a host the message passed through
            if neighbor.hosts().into_iter().any(|h| blacklist.contains(h)) {
                continue;
            }
            // deadline horizon: contacts starting at or after expiration are useless
            if neighbor.begin() >= self.expire_time {
                continue;
            }

            let mut endpoints = None;
            if !neighbor.is_pivot() {
                if neighbor.current_capacity() <= size {
                    continue;
                }
                let common = match cur.common_host(neighbor) {
                    Some(h) => h.clone(),
                    None => continue,
                };
                let receiver = neighbor.other_host(&common).clone();
                // admission: declared free buffer minus capacity already
                // virtually planned on this vertex
                let reserved =
                    (neighbor.adjusted_begin() - neighbor.begin()) * neighbor.transmission_speed();
                let free = hosts
                    .get(&receiver)
                    .map(|h| h.free_buffer())
                    .unwrap_or(f64::INFINITY);
                if free - reserved < size {
                    continue;
                }
                endpoints = Some((common, receiver));
            }

            let cost = self.cost(&cur, neighbor, message);
            let known = *self.distances.get(&n_id).unwrap_or(&f64::INFINITY);
            let cur_hops = *self.hops.get(cur_id).unwrap_or(&u32::MAX);

            if cost < known {
                if known.is_finite() {
                    self.unsettled.remove(&FrontierKey {
                        distance: known,
                        id: n_id.clone(),
                    });
                }
                self.unsettled.insert(FrontierKey {
                    distance: cost,
                    id: n_id.clone(),
                });
                self.distances.insert(n_id.clone(), cost);
                self.hops.insert(n_id.clone(), cur_hops.saturating_add(1));
                self.predecessors.insert(n_id.clone(), cur_id.clone());
                if let Some((sender, receiver)) = endpoints {
                    let v = graph
                        .vertex_mut(&n_id)
                        .expect("relaxed vertex missing from the graph");
                    v.set_sender(sender);
                    v.set_receiver(receiver);
                }
            } else if cost == known && known.is_finite() {
                // equal distance: prefer the path with fewer hops
                let n_hops = *self.hops.get(&n_id).unwrap_or(&u32::MAX);
                if cur_hops.saturating_add(1) < n_hops {
                    self.hops.insert(n_id.clone(), cur_hops.saturating_add(1));
                    self.predecessors.insert(n_id.clone(), cur_id.clone());
                }
            }
        }
    }

    /// Candidate cost of reaching `neighbor` through `cur` under the active
    /// metric. Pivots inherit the current distance unchanged.
    fn cost(&self, cur: &Vertex, neighbor: &Vertex, message: &Message) -> f64 {
        let d_cur = *self.distances.get(cur.id()).unwrap_or(&f64::INFINITY);
        if neighbor.is_pivot() {
            return d_cur;
        }
        let size = message.size() as f64;
        match &self.metric {
            DistanceMetric::LeastLatency => {
                d_cur.max(neighbor.adjusted_begin()) + size / neighbor.transmission_speed()
            }
            DistanceMetric::HopCount => d_cur + 1.0,
            DistanceMetric::FairDistribution(provider) => {
                let pair = neighbor.pair_id();
                let free = provider.free_capacity(&pair);
                let between = provider.time_between_contacts(&pair);
                match (free, between) {
                    (Some(cap), Some(freq)) if cap > 0.0 && freq > 0.0 => {
                        if cap < size {
                            return f64::INFINITY;
                        }
                        d_cur
                            + (self.avg_capacity / cap) * CAP_WEIGHT
                            + (self.avg_frequency / freq) * FREQ_WEIGHT
                    }
                    // statistics not collected yet
                    _ => f64::INFINITY,
                }
            }
        }
    }
}
