//! Contact Plan Persistence and Live Recording
//!
//! A node that has already simulated (or observed) a scenario can persist its
//! contact schedule and reload it on the next run instead of rediscovering
//! it. The on-disk format is one JSON file per host holding the records of
//! every contact that host participates in. A stored schedule is only valid
//! for a run with the same hosts: every record carries a scenario hash
//! derived from the ordered set of host identities, and loading fails when a
//! host file is missing or hashes disagree.
//!
//! Nothing here is a singleton; the store and the recorder are plain values
//! the router constructs and owns.

use crate::contact::{round2, Contact};
use crate::graph::Graph;
use crate::host::{Host, HostId, HostTable};
use crate::vertex::Vertex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Contact plan errors
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("no open contact between {0} and {1}")]
    ContactNotOpen(HostId, HostId),

    #[error("missing contact plan for host {0}")]
    MissingPlan(HostId),

    #[error("scenario hash mismatch for host {host}: expected {expected}, found {found}")]
    ScenarioMismatch {
        host: HostId,
        expected: u64,
        found: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed contact plan: {0}")]
    Json(#[from] serde_json::Error),
}

/// Hash of the scenario: SHA-256 over the ordered host identities, truncated
/// to the first eight bytes.
pub fn scenario_hash(hosts: &HostTable) -> u64 {
    let mut hasher = Sha256::new();
    for id in hosts.keys() {
        hasher.update(id.as_str().as_bytes());
    }
    let digest = hasher.finalize();
    u64::from_be_bytes(
        digest[..8]
            .try_into()
            .expect("SHA-256 digest is at least 8 bytes"),
    )
}

/// One persisted contact record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRecord {
    pub host_a: String,
    pub host_b: String,
    pub scenario_hash: u64,
    pub start: f64,
    pub end: f64,
    pub transmission_speed: f64,
}

impl ContactRecord {
    pub fn from_contact(contact: &Contact, scenario_hash: u64) -> Self {
        let [a, b] = contact.hosts();
        Self {
            host_a: a.as_str().to_string(),
            host_b: b.as_str().to_string(),
            scenario_hash,
            start: contact.begin(),
            end: contact.end(),
            transmission_speed: contact.transmission_speed(),
        }
    }

    pub fn to_contact(&self) -> Contact {
        Contact::from_parts(
            HostId::new(self.host_a.clone()),
            HostId::new(self.host_b.clone()),
            self.start,
            self.end,
            self.transmission_speed,
        )
    }
}

/// File-backed store of per-host contact plans.
#[derive(Debug, Clone)]
pub struct ContactPlanStore {
    dir: PathBuf,
}

impl ContactPlanStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, host: &HostId) -> PathBuf {
        self.dir.join(format!("{host}.json"))
    }

    /// Persist the contacts a host participates in.
    pub fn save_contacts(
        &self,
        host: &HostId,
        contacts: &[Contact],
        scenario_hash: u64,
    ) -> Result<(), PlanError> {
        std::fs::create_dir_all(&self.dir)?;
        let records: Vec<ContactRecord> = contacts
            .iter()
            .filter(|c| c.contains_host(host))
            .map(|c| ContactRecord::from_contact(c, scenario_hash))
            .collect();
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(self.file_for(host), json)?;
        info!(host = %host, contacts = records.len(), "saved contact plan");
        Ok(())
    }

    /// Load one host's records; a missing file is `PlanError::MissingPlan`.
    pub fn load_contacts(&self, host: &HostId) -> Result<Vec<ContactRecord>, PlanError> {
        let path = self.file_for(host);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PlanError::MissingPlan(host.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&json)?)
    }

    /// A stored schedule is valid for the current run only if every host has
    /// a file and every record's hash matches the current scenario.
    pub fn validate(&self, hosts: &HostTable) -> Result<(), PlanError> {
        let expected = scenario_hash(hosts);
        for host in hosts.keys() {
            let records = self.load_contacts(host)?;
            if let Some(record) = records.iter().find(|r| r.scenario_hash != expected) {
                return Err(PlanError::ScenarioMismatch {
                    host: host.clone(),
                    expected,
                    found: record.scenario_hash,
                });
            }
        }
        Ok(())
    }

    /// Convenience wrapper over [`ContactPlanStore::validate`] for callers
    /// that only need to decide between loading and re-recording.
    pub fn has_plan(&self, hosts: &HostTable) -> bool {
        self.validate(hosts).is_ok()
    }

    /// Validate and load the full schedule into a routing graph. Contacts
    /// observed independently by both endpoints deduplicate via contact
    /// identity.
    pub fn load_graph(&self, hosts: &HostTable) -> Result<Graph, PlanError> {
        self.validate(hosts)?;

        let mut contacts: BTreeMap<String, Contact> = BTreeMap::new();
        for host in hosts.keys() {
            for record in self.load_contacts(host)? {
                let contact = record.to_contact();
                contacts.insert(contact.id(), contact);
            }
        }

        let mut graph = Graph::new();
        for contact in contacts.into_values() {
            graph.insert_vertex(Vertex::new(contact));
        }
        debug!(
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            "loaded contact graph from plan"
        );
        Ok(graph)
    }
}

/// Records contacts as they happen: one `contact_up` when a link comes up,
/// one `contact_down` when it goes away. The transmission speed is derived
/// at link-up time, while the endpoints are actually in range.
#[derive(Debug, Default)]
pub struct ContactRecorder {
    open: BTreeMap<String, OpenContact>,
    ready: Vec<Contact>,
}

#[derive(Debug, Clone)]
struct OpenContact {
    host_a: HostId,
    host_b: HostId,
    begin: f64,
    speed: f64,
}

fn pair_key(a: &HostId, b: &HostId) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}

impl ContactRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note a link coming up. The second endpoint observing the same link is
    /// a no-op.
    pub fn contact_up(&mut self, a: &Host, b: &Host, now: f64) {
        let key = pair_key(a.id(), b.id());
        if self.open.contains_key(&key) {
            return;
        }
        let speed = crate::contact::link_speed(a, b);
        self.open.insert(
            key,
            OpenContact {
                host_a: a.id().clone(),
                host_b: b.id().clone(),
                begin: round2(now),
                speed,
            },
        );
    }

    /// Close an open contact and move it to the ready list. Closing a contact
    /// that was never opened is a caller bug surfaced as an error.
    pub fn contact_down(&mut self, a: &HostId, b: &HostId, now: f64) -> Result<(), PlanError> {
        let key = pair_key(a, b);
        let open = self
            .open
            .remove(&key)
            .ok_or_else(|| PlanError::ContactNotOpen(a.clone(), b.clone()))?;
        let end = round2(now);
        if end > open.begin {
            debug!(pair = %key, begin = open.begin, end, "completing contact");
            self.ready.push(Contact::from_parts(
                open.host_a,
                open.host_b,
                open.begin,
                end,
                open.speed,
            ));
        }
        Ok(())
    }

    /// Close every still-open contact, e.g. at end of simulation.
    pub fn finish(&mut self, now: f64) {
        let keys: Vec<(HostId, HostId)> = self
            .open
            .values()
            .map(|o| (o.host_a.clone(), o.host_b.clone()))
            .collect();
        for (a, b) in keys {
            // every key exists, the list was just taken from the open map
            let _ = self.contact_down(&a, &b, now);
        }
    }

    pub fn ready(&self) -> &[Contact] {
        &self.ready
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}
