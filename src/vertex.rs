//! Vertex: the Unit of Graph Search
//!
//! A vertex wraps exactly one contact (or a pivot anchor) and gives it a
//! search-friendly identity. Beyond delegating to the contact it only adds
//! the pivot flag, the per-search sender/receiver assignment, and the split
//! constructor used when a reservation carves a contact into sub-windows.

use crate::contact::Contact;
use crate::host::HostId;
use serde::{Deserialize, Serialize};

/// Vertex identifier, derived from the wrapped contact's id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub String);

impl VertexId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Vertex {
    id: VertexId,
    contact: Contact,
    is_pivot: bool,
    sender: Option<HostId>,
    receiver: Option<HostId>,
}

impl Vertex {
    /// Wrap a contact. The id embeds the contact's current window, so two
    /// vertices over distinct windows of the same pair never collide.
    pub fn new(contact: Contact) -> Self {
        let id = VertexId::new(format!("vertex_{}", contact.id()));
        Self {
            id,
            contact,
            is_pivot: false,
            sender: None,
            receiver: None,
        }
    }

    /// A transient zero-cost anchor for one search.
    pub fn pivot(id: VertexId, contact: Contact) -> Self {
        Self {
            id,
            contact,
            is_pivot: true,
            sender: None,
            receiver: None,
        }
    }

    /// Split constructor: a fresh vertex over a sub-window of the same
    /// endpoint pair, carrying the original's speed. The derived id embeds
    /// the new window and cannot collide with the original's.
    pub fn split(original: &Vertex, begin: f64, end: f64) -> Self {
        let [a, b] = original.hosts();
        let contact = Contact::from_parts(
            a.clone(),
            b.clone(),
            begin,
            end,
            original.transmission_speed(),
        );
        Self::new(contact)
    }

    pub fn id(&self) -> &VertexId {
        &self.id
    }

    pub fn is_pivot(&self) -> bool {
        self.is_pivot
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    pub fn hosts(&self) -> [&HostId; 2] {
        self.contact.hosts()
    }

    pub fn contains_host(&self, h: &HostId) -> bool {
        self.contact.contains_host(h)
    }

    /// The host shared with another vertex, if any.
    pub fn common_host<'a>(&'a self, other: &Vertex) -> Option<&'a HostId> {
        self.hosts().into_iter().find(|&h| other.contains_host(h))
    }

    pub fn other_host<'a>(&'a self, h: &HostId) -> &'a HostId {
        self.contact.other_host(h)
    }

    pub fn pair_id(&self) -> String {
        self.contact.pair_id()
    }

    pub fn begin(&self) -> f64 {
        self.contact.begin()
    }

    pub fn end(&self) -> f64 {
        self.contact.end()
    }

    pub fn adjusted_begin(&self) -> f64 {
        self.contact.adjusted_begin()
    }

    pub fn transmission_speed(&self) -> f64 {
        self.contact.transmission_speed()
    }

    pub fn current_capacity(&self) -> f64 {
        self.contact.current_capacity()
    }

    pub fn set_adjusted_begin(&mut self, new_begin: f64) {
        self.contact.set_adjusted_begin(new_begin);
    }

    pub fn set_end(&mut self, new_end: f64) {
        self.contact.set_end(new_end);
    }

    /// Transmitting host along this vertex for the current path choice
    pub fn sender(&self) -> Option<&HostId> {
        self.sender.as_ref()
    }

    /// Receiving host along this vertex for the current path choice
    pub fn receiver(&self) -> Option<&HostId> {
        self.receiver.as_ref()
    }

    pub fn set_sender(&mut self, h: HostId) {
        self.sender = Some(h);
    }

    pub fn set_receiver(&mut self, h: HostId) {
        self.receiver = Some(h);
    }
}

impl std::fmt::Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b] = self.hosts();
        write!(f, "{} [{}, {}]", self.id, a, b)
    }
}
