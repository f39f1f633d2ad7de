//! End-to-end routing scenarios
//!
//! Each test drives the public interface the router collaborator uses:
//! `search` -> `path` -> `consume_path`, over small hand-built schedules.

use cgr::contact::Contact;
use cgr::graph::Graph;
use cgr::host::{host_table, Host, HostId, HostTable, Location};
use cgr::message::Message;
use cgr::route_search::{DistanceMetric, RouteSearch};
use cgr::vertex::{Vertex, VertexId};

fn hid(s: &str) -> HostId {
    HostId::new(s)
}

fn bare_host(id: &str) -> Host {
    Host::new(hid(id), Location::new(0.0, 0.0))
}

fn vertex(a: &str, b: &str, begin: f64, end: f64, speed: f64) -> Vertex {
    Vertex::new(Contact::from_parts(hid(a), hid(b), begin, end, speed))
}

fn graph_of(vertices: impl IntoIterator<Item = Vertex>) -> Graph {
    let mut g = Graph::new();
    for v in vertices {
        g.insert_vertex(v);
    }
    g
}

fn hosts_of(ids: &[&str]) -> HostTable {
    host_table(ids.iter().map(|id| bare_host(id)))
}

/// Single contact (h1,h2) over [20,30) at speed 10; a 10-unit message from
/// h1 to h2 finds the one-hop path, and consuming it advances the contact's
/// adjusted_begin to 21.
#[test]
fn single_contact_route_and_consume() {
    let mut g = graph_of([vertex("h1", "h2", 20.0, 30.0, 10.0)]);
    let hosts = hosts_of(&["h1", "h2"]);
    let m = Message::new("m1", hid("h1"), hid("h2"), 10);

    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);
    let goal = rs.search(&mut g, &hosts, &hid("h1"), 0.0, &m).expect("route");
    let path = rs.path(&goal);
    assert_eq!(path.len(), 1);
    let end_vertex = g.vertex(path.first_hop().unwrap()).unwrap();
    assert!(end_vertex.contains_host(&hid("h2")));

    g.consume_path(&path, &m, 10.0);
    let v = g.vertex(path.first_hop().unwrap()).unwrap();
    assert_eq!(v.adjusted_begin(), 21.0);
}

/// Two-contact chain h0-h1 [0,10) then h1-h2 [20,30): a message from h0 to
/// h2 routes across both, in order.
#[test]
fn two_hop_chain() {
    let v1 = vertex("h0", "h1", 0.0, 10.0, 10.0);
    let v2 = vertex("h1", "h2", 20.0, 30.0, 10.0);
    let (id1, id2) = (v1.id().clone(), v2.id().clone());
    let mut g = graph_of([v1, v2]);
    let hosts = hosts_of(&["h0", "h1", "h2"]);
    let m = Message::new("m1", hid("h0"), hid("h2"), 10);

    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);
    let goal = rs.search(&mut g, &hosts, &hid("h0"), 0.0, &m).expect("route");
    let path = rs.path(&goal);
    assert_eq!(path.vertices(), &[id1, id2]);
}

/// A host already on the message's visited list is never relaxed into, even
/// when it is the only (and otherwise optimal) relay.
#[test]
fn blacklisted_host_is_never_used() {
    let mut g = graph_of([
        vertex("h0", "h1", 0.0, 10.0, 10.0),
        vertex("h1", "h2", 20.0, 30.0, 10.0),
    ]);
    let hosts = hosts_of(&["h0", "h1", "h2"]);
    let mut m = Message::new("m1", hid("h0"), hid("h2"), 10);
    m.record_visit(hid("h1"));

    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);
    assert!(rs.search(&mut g, &hosts, &hid("h0"), 0.0, &m).is_none());
}

/// Insufficient capacity at every candidate vertex yields NoRoute.
#[test]
fn capacity_exhaustion_is_no_route() {
    // capacity (30-20)*10 = 100, not strictly greater than the message size
    let mut g = graph_of([vertex("h1", "h2", 20.0, 30.0, 10.0)]);
    let hosts = hosts_of(&["h1", "h2"]);
    let m = Message::new("m1", hid("h1"), hid("h2"), 100);

    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);
    assert!(rs.search(&mut g, &hosts, &hid("h1"), 0.0, &m).is_none());
}

/// Splitting a contact [100,110) at speed 10 for a 40-unit reservation that
/// starts exactly at adjusted_begin produces a tail vertex [104,110) while
/// the original is truncated to [100,104).
#[test]
fn split_produces_residual_tail() {
    let v = vertex("h1", "h2", 100.0, 110.0, 10.0);
    let id = v.id().clone();
    let mut g = graph_of([v]);

    let tail_id = g.split_vertex(&id, 104.0, 104.0, 10.0).expect("tail vertex");
    let original = g.vertex(&id).unwrap();
    let tail = g.vertex(&tail_id).unwrap();
    assert_eq!((original.begin(), original.end()), (100.0, 104.0));
    assert_eq!((tail.begin(), tail.end()), (104.0, 110.0));
    assert_eq!(tail.transmission_speed(), 10.0);
}

/// After any search, success or failure, the graph's vertex and edge counts
/// are back to their pre-call values: pivots never leak.
#[test]
fn pivots_never_leak() {
    let mut g = graph_of([
        vertex("h0", "h1", 0.0, 10.0, 10.0),
        vertex("h1", "h2", 20.0, 30.0, 10.0),
    ]);
    let hosts = hosts_of(&["h0", "h1", "h2"]);
    let (vcount, ecount) = (g.vertex_count(), g.edge_count());
    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);

    // success
    let m = Message::new("m1", hid("h0"), hid("h2"), 10);
    assert!(rs.search(&mut g, &hosts, &hid("h0"), 0.0, &m).is_some());
    assert_eq!((g.vertex_count(), g.edge_count()), (vcount, ecount));

    // failure: unknown destination
    let m = Message::new("m2", hid("h0"), hid("h9"), 10);
    assert!(rs.search(&mut g, &hosts, &hid("h0"), 0.0, &m).is_none());
    assert_eq!((g.vertex_count(), g.edge_count()), (vcount, ecount));

    // failure: deadline
    let m = Message::new("m3", hid("h0"), hid("h2"), 10).with_ttl_minutes(0);
    assert!(rs.search(&mut g, &hosts, &hid("h0"), 0.0, &m).is_none());
    assert_eq!((g.vertex_count(), g.edge_count()), (vcount, ecount));
}

/// TTL is enforced on the final arrival time: a path that exists graph-wise
/// but arrives too late is NoRoute.
#[test]
fn deadline_discards_late_paths() {
    // arrival into h2 is at t=21
    let mut g = graph_of([vertex("h1", "h2", 20.0, 30.0, 10.0)]);
    let hosts = hosts_of(&["h1", "h2"]);
    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);

    let tight = Message::new("m1", hid("h1"), hid("h2"), 10).with_ttl_minutes(0);
    assert!(rs.search(&mut g, &hosts, &hid("h1"), 0.0, &tight).is_none());

    let loose = Message::new("m2", hid("h1"), hid("h2"), 10).with_ttl_minutes(1);
    assert!(rs.search(&mut g, &hosts, &hid("h1"), 0.0, &loose).is_some());
}

/// Contacts starting at or after the expiration horizon are filtered during
/// relaxation, not only at the end.
#[test]
fn contacts_beyond_horizon_are_filtered() {
    // the relay via h1 exists but starts after expiration (60s)
    let mut g = graph_of([
        vertex("h0", "h1", 0.0, 10.0, 10.0),
        vertex("h1", "h2", 70.0, 80.0, 10.0),
    ]);
    let hosts = hosts_of(&["h0", "h1", "h2"]);
    let m = Message::new("m1", hid("h0"), hid("h2"), 10).with_ttl_minutes(1);

    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);
    assert!(rs.search(&mut g, &hosts, &hid("h0"), 0.0, &m).is_none());
}

/// Searching repeatedly while consuming: the second message is pushed onto
/// the residual capacity left over by the first.
#[test]
fn repeated_search_sees_reservations() {
    let v = vertex("h1", "h2", 20.0, 30.0, 10.0);
    let id = v.id().clone();
    let mut g = graph_of([v]);
    let hosts = hosts_of(&["h1", "h2"]);
    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);

    for expected in [21.0, 22.0, 23.0] {
        let m = Message::new("m", hid("h1"), hid("h2"), 10);
        let goal = rs.search(&mut g, &hosts, &hid("h1"), 0.0, &m).expect("route");
        let path = rs.path(&goal);
        g.consume_path(&path, &m, 10.0);
        assert_eq!(g.vertex(&id).unwrap().adjusted_begin(), expected);
    }
}

/// Contact begins are arbitrary floats (loaded plans are written by foreign
/// tools); a transmission shorter than the rounding granularity must not
/// move the reservation cursor backward.
#[test]
fn consume_tolerates_sub_centisecond_transmissions() {
    let mut g = graph_of([vertex("h1", "h2", 20.554, 30.0, 10000.0)]);
    let hosts = hosts_of(&["h1", "h2"]);
    let m = Message::new("m1", hid("h1"), hid("h2"), 1);

    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);
    let goal = rs.search(&mut g, &hosts, &hid("h1"), 0.0, &m).expect("route");
    let path = rs.path(&goal);
    g.consume_path(&path, &m, 10.0);

    let v = g.vertex(path.first_hop().unwrap()).unwrap();
    assert!(v.adjusted_begin() >= 20.554);
    assert!(v.adjusted_begin() <= v.end());
}

/// Merging a peer's graph makes its contacts routable locally.
#[test]
fn merge_extends_reachability() {
    let mut g = graph_of([vertex("h0", "h1", 0.0, 10.0, 10.0)]);
    let hosts = hosts_of(&["h0", "h1", "h2"]);
    let m = Message::new("m1", hid("h0"), hid("h2"), 10);
    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);
    assert!(rs.search(&mut g, &hosts, &hid("h0"), 0.0, &m).is_none());

    let peer = graph_of([vertex("h1", "h2", 20.0, 30.0, 10.0)]);
    g.merge(&peer);
    assert!(rs.search(&mut g, &hosts, &hid("h0"), 0.0, &m).is_some());
}

/// Search prunes contacts that already ended, so an expired relay cannot
/// carry a new message.
#[test]
fn past_contacts_are_pruned_by_search() {
    let stale = vertex("h0", "h1", 0.0, 10.0, 10.0);
    let stale_id = stale.id().clone();
    let mut g = graph_of([stale, vertex("h0", "h1", 20.0, 30.0, 10.0)]);
    let hosts = hosts_of(&["h0", "h1"]);
    let m = Message::new("m1", hid("h0"), hid("h1"), 10);

    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);
    let goal = rs.search(&mut g, &hosts, &hid("h0"), 15.0, &m).expect("route");
    assert!(g.vertex(&stale_id).is_none());
    let path = rs.path(&goal);
    assert_eq!(path.len(), 1);
    assert_eq!(g.vertex(path.first_hop().unwrap()).unwrap().begin(), 20.0);
}

/// The same consumed vertex never moves backward: a later, larger
/// reservation lands after the earlier one (P2).
#[test]
fn adjusted_begin_is_monotone_across_consumptions() {
    let v = vertex("h1", "h2", 0.0, 100.0, 10.0);
    let id = v.id().clone();
    let mut g = graph_of([v]);
    let hosts = hosts_of(&["h1", "h2"]);
    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);

    let mut last = 0.0;
    for size in [10u64, 50, 20] {
        let m = Message::new("m", hid("h1"), hid("h2"), size);
        let goal = rs.search(&mut g, &hosts, &hid("h1"), 0.0, &m).expect("route");
        g.consume_path(&rs.path(&goal), &m, 10.0);
        let adjusted = g.vertex(&id).unwrap().adjusted_begin();
        assert!(adjusted >= last);
        assert!(adjusted <= g.vertex(&id).unwrap().end());
        last = adjusted;
    }
}

/// Delayed reservations split the downstream contact; the residual tail
/// remains reachable and usable by the next search (P1/P3 in context).
#[test]
fn consume_split_preserves_residual_routability() {
    let v1 = vertex("h0", "h1", 0.0, 10.0, 1.0);
    let v2 = vertex("h1", "h2", 2.0, 100.0, 1.0);
    let id2 = v2.id().clone();
    let mut g = graph_of([v1, v2]);
    let hosts = hosts_of(&["h0", "h1", "h2"]);
    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);

    let m = Message::new("m1", hid("h0"), hid("h2"), 5);
    let goal = rs.search(&mut g, &hosts, &hid("h0"), 0.0, &m).expect("route");
    g.consume_path(&rs.path(&goal), &m, 10.0);

    // original h1-h2 contact was truncated; the tail carries the rest
    assert_eq!(g.vertex(&id2).unwrap().end(), 5.0);
    for v in g.vertices().values() {
        assert!(v.current_capacity() >= 0.0);
    }

    // the tail is routable for the next message
    let m2 = Message::new("m2", hid("h0"), hid("h2"), 3);
    let goal2 = rs.search(&mut g, &hosts, &hid("h0"), 0.0, &m2).expect("route");
    let path2 = rs.path(&goal2);
    let last = g.vertex(path2.vertices().last().unwrap()).unwrap();
    assert_eq!(last.begin(), 10.0);
}

/// Identical graph state and inputs give identical results (P4).
#[test]
fn search_is_deterministic() {
    // two equal-latency relays force tie-breaking
    let mut a = graph_of([
        vertex("h0", "h1", 0.0, 10.0, 10.0),
        vertex("h0", "h3", 0.0, 10.0, 10.0),
        vertex("h1", "h2", 20.0, 30.0, 10.0),
        vertex("h3", "h2", 20.0, 30.0, 10.0),
    ]);
    let mut b = a.clone();
    let hosts = hosts_of(&["h0", "h1", "h2", "h3"]);
    let m = Message::new("m1", hid("h0"), hid("h2"), 10);

    let mut rs_a = RouteSearch::new(DistanceMetric::LeastLatency);
    let mut rs_b = RouteSearch::new(DistanceMetric::LeastLatency);
    let goal_a = rs_a.search(&mut a, &hosts, &hid("h0"), 0.0, &m).expect("route");
    let goal_b = rs_b.search(&mut b, &hosts, &hid("h0"), 0.0, &m).expect("route");
    assert_eq!(goal_a, goal_b);
    assert_eq!(rs_a.path(&goal_a), rs_b.path(&goal_b));
}

/// Shrinking the TTL can only turn success into NoRoute, never the reverse
/// (P6).
#[test]
fn ttl_is_monotone() {
    let base = [
        vertex("h0", "h1", 0.0, 10.0, 10.0),
        vertex("h1", "h2", 20.0, 30.0, 10.0),
    ];
    let hosts = hosts_of(&["h0", "h1", "h2"]);

    let mut previous_found = false;
    for ttl in [0u32, 1, 2, 60] {
        let mut g = graph_of(base.clone());
        let m = Message::new("m1", hid("h0"), hid("h2"), 10).with_ttl_minutes(ttl);
        let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);
        let found = rs.search(&mut g, &hosts, &hid("h0"), 0.0, &m).is_some();
        // once reachable at a smaller TTL, larger TTLs must stay reachable
        assert!(!previous_found || found);
        previous_found = found;
    }
    assert!(previous_found);
}

/// The search works against a goal id even though the pivot vertices are
/// detached from the graph before it returns.
#[test]
fn goal_vertex_is_a_pivot_id() {
    let mut g = graph_of([vertex("h1", "h2", 20.0, 30.0, 10.0)]);
    let hosts = hosts_of(&["h1", "h2"]);
    let m = Message::new("m1", hid("h1"), hid("h2"), 10);
    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);
    let goal = rs.search(&mut g, &hosts, &hid("h1"), 0.0, &m).expect("route");
    assert!(goal.as_str().starts_with("pivot_dst_"));
    assert!(g.vertex(&goal).is_none());
    assert_eq!(rs.path(&goal).len(), 1);
}

/// Source candidates are filtered by capacity independently of destination
/// candidates.
#[test]
fn zero_speed_contacts_are_not_candidates() {
    // no usable interface pair: speed 0, capacity 0
    let mut g = graph_of([vertex("h1", "h2", 20.0, 30.0, 0.0)]);
    let hosts = hosts_of(&["h1", "h2"]);
    let m = Message::new("m1", hid("h1"), hid("h2"), 1);
    let mut rs = RouteSearch::new(DistanceMetric::LeastLatency);
    assert!(rs.search(&mut g, &hosts, &hid("h1"), 0.0, &m).is_none());
}

#[test]
fn vertex_ids_are_stable_for_path_lookup() {
    let v = vertex("h1", "h2", 20.0, 30.0, 10.0);
    let id = VertexId::new(v.id().as_str());
    let g = graph_of([v]);
    assert!(g.vertex(&id).is_some());
}
