//! CGR: Contact Graph Routing for Delay-Tolerant Networks
//!
//! Core library for routing over a time-expanded graph of scheduled,
//! time-bounded communication windows ("contacts"). Each node owns its view
//! of the contact schedule and answers, on demand, whether a destination is
//! reachable given message size and deadline, through which next hop, and
//! reserves the chosen capacity so later decisions see it.

pub mod contact;
pub mod contact_plan;
pub mod edge;
pub mod graph;
pub mod host;
pub mod message;
pub mod path;
pub mod predictions;
pub mod route_search;
pub mod vertex;

/// What the router should do with a message scheduled on a contact that tore
/// down before the transfer happened.
///
/// There is no single right answer; the core never decides this. The owning
/// router picks a policy and applies it when a connection goes down with
/// undelivered messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownPolicy {
    /// Discard the message.
    Drop,
    /// Put the message back in the queue for a fresh search.
    Requeue,
    /// Leave the message where it is and do nothing.
    Keep,
}
