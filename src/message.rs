//! Message Abstraction
//!
//! The unit of routing demand: endpoints, size, optional TTL and the ordered
//! list of hosts the message already passed through. The visited list feeds
//! the loop-avoidance blacklist during relaxation.

use crate::host::HostId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    id: String,
    from: HostId,
    to: HostId,
    /// Payload size in capacity units
    size: u64,
    /// Time to live in minutes; `None` means the message never expires
    ttl_minutes: Option<u32>,
    /// Hosts this message already visited, in order
    visited: Vec<HostId>,
}

impl Message {
    pub fn new(id: impl Into<String>, from: HostId, to: HostId, size: u64) -> Self {
        let from_clone = from.clone();
        Self {
            id: id.into(),
            from,
            to,
            size,
            ttl_minutes: None,
            visited: vec![from_clone],
        }
    }

    pub fn with_ttl_minutes(mut self, ttl: u32) -> Self {
        self.ttl_minutes = Some(ttl);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn from(&self) -> &HostId {
        &self.from
    }

    pub fn to(&self) -> &HostId {
        &self.to
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn ttl_minutes(&self) -> Option<u32> {
        self.ttl_minutes
    }

    /// Absolute expiration instant given the current time, or `+inf` when no
    /// TTL is set.
    pub fn expiration(&self, now: f64) -> f64 {
        match self.ttl_minutes {
            Some(ttl) => now + f64::from(ttl) * 60.0,
            None => f64::INFINITY,
        }
    }

    /// Record a visit to a host
    pub fn record_visit(&mut self, host: HostId) {
        self.visited.push(host);
    }

    pub fn visited(&self) -> &[HostId] {
        &self.visited
    }

    pub fn has_visited(&self, host: &HostId) -> bool {
        self.visited.contains(host)
    }
}
