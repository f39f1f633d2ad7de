//! Host and Interface Abstractions
//!
//! The routing core does not own node state; it consumes a small view of it:
//! a stable, orderable identity, a position, the set of radio interfaces
//! (type tag, transmit range, transmit speed) and the declared free buffer
//! capacity used for admission during relaxation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Host identifier (address, hostname, UUID, etc.)
///
/// Ordering is total and stable: it canonicalizes contact endpoint pairs and
/// breaks ties deterministically wherever hosts are iterated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HostId(pub String);

impl HostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Planar position of a host at contact-creation time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another location
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One radio interface of a host
///
/// Two interfaces can communicate only if their type tags match and both
/// transmit ranges exceed the distance between the hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterface {
    /// Type tag, e.g. "wifi" or "lora"; only equal tags are compatible
    pub interface_type: String,
    /// Transmit range in distance units
    pub transmit_range: f64,
    /// Transmit speed in capacity units per second
    pub transmit_speed: f64,
}

impl NetworkInterface {
    pub fn new(interface_type: impl Into<String>, transmit_range: f64, transmit_speed: f64) -> Self {
        Self {
            interface_type: interface_type.into(),
            transmit_range,
            transmit_speed,
        }
    }
}

/// The view of a network node the routing core consumes
#[derive(Debug, Clone)]
pub struct Host {
    id: HostId,
    location: Location,
    interfaces: Vec<NetworkInterface>,
    buffer_size: f64,
    free_buffer: f64,
}

impl Host {
    /// Create a host with unbounded buffer and no interfaces.
    pub fn new(id: HostId, location: Location) -> Self {
        Self {
            id,
            location,
            interfaces: Vec::new(),
            buffer_size: f64::INFINITY,
            free_buffer: f64::INFINITY,
        }
    }

    pub fn with_interface(mut self, iface: NetworkInterface) -> Self {
        self.interfaces.push(iface);
        self
    }

    /// Declare a finite buffer; the free buffer starts full.
    pub fn with_buffer(mut self, size: f64) -> Self {
        self.buffer_size = size;
        self.free_buffer = size;
        self
    }

    pub fn id(&self) -> &HostId {
        &self.id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    pub fn interfaces(&self) -> &[NetworkInterface] {
        &self.interfaces
    }

    pub fn buffer_size(&self) -> f64 {
        self.buffer_size
    }

    /// Declared free buffer capacity, updated by the owning router.
    pub fn free_buffer(&self) -> f64 {
        self.free_buffer
    }

    pub fn set_free_buffer(&mut self, free: f64) {
        self.free_buffer = free.clamp(0.0, self.buffer_size);
    }
}

/// Hosts of the current run, keyed and iterated in identity order.
pub type HostTable = BTreeMap<HostId, Host>;

/// Collect hosts into a [`HostTable`].
pub fn host_table(hosts: impl IntoIterator<Item = Host>) -> HostTable {
    hosts.into_iter().map(|h| (h.id().clone(), h)).collect()
}
