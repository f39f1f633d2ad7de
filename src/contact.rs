//! Contact: a Scheduled Communication Opportunity
//!
//! A contact is a time-bounded window `[begin, end)` during which two hosts
//! can exchange data at a derived transmission speed. The endpoint pair is
//! canonically ordered, so both hosts observing the same opportunity produce
//! equal contacts. `adjusted_begin` is the only mutable part: it tracks the
//! point before which capacity has already been reserved.

use crate::host::{Host, HostId};

/// Round to two decimals; keeps derived ids and comparisons stable across
/// repeated reservations.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Transmission speed between two hosts at this moment.
///
/// Goes through every interface pair of matching type and returns the speed
/// of the first pair whose ranges both cover the current distance. First
/// match wins; returns `0` when no pair qualifies.
///
/// Only meaningful while the hosts are actually within range, i.e. when a
/// contact is being observed live.
pub fn link_speed(a: &Host, b: &Host) -> f64 {
    let distance = a.location().distance(b.location());
    for ia in a.interfaces() {
        for ib in b.interfaces() {
            if ia.interface_type != ib.interface_type {
                continue;
            }
            if ia.transmit_range.min(ib.transmit_range) > distance {
                return ia.transmit_speed.min(ib.transmit_speed);
            }
        }
    }
    0.0
}

#[derive(Debug, Clone)]
pub struct Contact {
    host_a: HostId,
    host_b: HostId,
    begin: f64,
    end: f64,
    adjusted_begin: f64,
    speed: f64,
}

impl Contact {
    /// Create a contact observed live between two hosts; the speed is derived
    /// from their interfaces and positions at this moment.
    pub fn new(a: &Host, b: &Host, begin: f64, end: f64) -> Self {
        let speed = link_speed(a, b);
        Self::from_parts(a.id().clone(), b.id().clone(), begin, end, speed)
    }

    /// Create a contact from already-known parts (loaded schedules, splits).
    /// Endpoints are canonically ordered regardless of argument order.
    pub fn from_parts(a: HostId, b: HostId, begin: f64, end: f64, speed: f64) -> Self {
        assert!(begin < end, "contact window must not be empty");
        assert!(speed >= 0.0, "transmission speed must not be negative");
        let (host_a, host_b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            host_a,
            host_b,
            begin,
            end,
            adjusted_begin: begin,
            speed,
        }
    }

    /// Degenerate self-to-self contact over `[0, +inf)` backing a pivot
    /// vertex. Carries infinite speed so it never constrains a path.
    pub fn pivot(host: &HostId) -> Self {
        Self {
            host_a: host.clone(),
            host_b: host.clone(),
            begin: 0.0,
            end: f64::INFINITY,
            adjusted_begin: 0.0,
            speed: f64::INFINITY,
        }
    }

    /// Contact id; embeds `adjusted_begin` so sub-contacts derived from this
    /// one never collide with it.
    pub fn id(&self) -> String {
        format!("{}_{}_{}", self.pair_id(), self.adjusted_begin, self.end)
    }

    /// Identity of the (ordered) endpoint pair
    pub fn pair_id(&self) -> String {
        format!("{}_{}", self.host_a, self.host_b)
    }

    pub fn hosts(&self) -> [&HostId; 2] {
        [&self.host_a, &self.host_b]
    }

    pub fn contains_host(&self, h: &HostId) -> bool {
        self.host_a == *h || self.host_b == *h
    }

    pub fn other_host<'a>(&'a self, h: &HostId) -> &'a HostId {
        if *h == self.host_a {
            &self.host_b
        } else {
            &self.host_a
        }
    }

    pub fn begin(&self) -> f64 {
        self.begin
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn adjusted_begin(&self) -> f64 {
        self.adjusted_begin
    }

    pub fn transmission_speed(&self) -> f64 {
        self.speed
    }

    /// Residual capacity: `(end - adjusted_begin) * speed`
    pub fn current_capacity(&self) -> f64 {
        (self.end - self.adjusted_begin) * self.speed
    }

    /// Advance the reservation cursor. Moving it backward or past `end` is an
    /// invariant violation.
    pub fn set_adjusted_begin(&mut self, new_begin: f64) {
        assert!(
            new_begin >= self.adjusted_begin,
            "adjusted_begin must not move backward ({} -> {})",
            self.adjusted_begin,
            new_begin
        );
        assert!(
            new_begin <= self.end,
            "adjusted_begin must not pass end ({} > {})",
            new_begin,
            self.end
        );
        self.adjusted_begin = new_begin;
    }

    /// Truncate the window. Only supports split/consume operations; the new
    /// end must stay within `[adjusted_begin, end]`.
    pub fn set_end(&mut self, new_end: f64) {
        assert!(
            new_end <= self.end,
            "contact end must not grow ({} -> {})",
            self.end,
            new_end
        );
        assert!(
            new_end >= self.adjusted_begin,
            "contact end must not pass adjusted_begin ({} < {})",
            new_end,
            self.adjusted_begin
        );
        self.end = new_end;
    }
}

/// Equality over the ordered endpoint pair and the scheduled window; the
/// residual capacity (`adjusted_begin`) is deliberately not considered, so
/// independently observed or reloaded copies of the same opportunity compare
/// equal.
impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.host_a == other.host_a
            && self.host_b == other.host_b
            && self.begin == other.begin
            && self.end == other.end
    }
}
