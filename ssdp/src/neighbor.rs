//! The neighbor table: remote peers known through received `NOTIFY`
//! and `RESPONSE` packets.

use crate::message::ParsedPacket;
use lssdp_netif::LogSink;

/// A remote peer, identified by the network address ([`location`]) it
/// is reachable at.
///
/// [`location`]: NeighborRecord::location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborRecord {
    pub usn: String,
    pub sm_id: String,
    pub device_type: String,
    pub location: String,
    pub update_time_ms: u64,
}

/// An insertion-ordered table of neighbors, keyed by `location`.
///
/// A plain `Vec` rather than a map: the spec requires iteration order
/// to be externally observable by whatever consumes the
/// neighbor-list-changed callback, which a map keyed by `location`
/// would not preserve.
#[derive(Debug, Default)]
pub struct NeighborTable {
    records: Vec<NeighborRecord>,
}

impl NeighborTable {
    pub fn new() -> Self {
        NeighborTable {
            records: Vec::new(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NeighborRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn as_slice(&self) -> &[NeighborRecord] {
        &self.records
    }

    /// Records one observation of `packet`.
    ///
    /// Returns `true` if this created a new entry (the caller should
    /// fire the neighbor-list-changed callback); field drift on an
    /// existing entry is logged but does not return `true`.
    pub fn observe(&mut self, packet: &ParsedPacket, log: Option<&dyn LogSink>) -> bool {
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|r| r.location == packet.location)
        {
            if existing.usn != packet.usn {
                crate::log_warn!(
                    log,
                    "neighbor usn was changed. {} -> {}",
                    existing.usn,
                    packet.usn
                );
                existing.usn = packet.usn.clone();
            }
            if existing.sm_id != packet.sm_id {
                crate::log_warn!(
                    log,
                    "neighbor sm_id was changed. {} -> {}",
                    existing.sm_id,
                    packet.sm_id
                );
                existing.sm_id = packet.sm_id.clone();
            }
            if existing.device_type != packet.device_type {
                crate::log_warn!(
                    log,
                    "neighbor device_type was changed. {} -> {}",
                    existing.device_type,
                    packet.device_type
                );
                existing.device_type = packet.device_type.clone();
            }
            existing.update_time_ms = packet.update_time_ms;
            false
        } else {
            self.records.push(NeighborRecord {
                usn: packet.usn.clone(),
                sm_id: packet.sm_id.clone(),
                device_type: packet.device_type.clone(),
                location: packet.location.clone(),
                update_time_ms: packet.update_time_ms,
            });
            true
        }
    }

    /// Evicts every record whose age is at least `timeout_ms`.
    ///
    /// Returns the number of evictions; the caller fires the
    /// neighbor-list-changed callback once per eviction.
    pub fn sweep(&mut self, now_ms: u64, timeout_ms: u64, log: Option<&dyn LogSink>) -> usize {
        let mut evicted = 0;
        let mut i = 0;
        while i < self.records.len() {
            let age = now_ms.saturating_sub(self.records[i].update_time_ms);
            if age >= timeout_ms {
                let record = self.records.remove(i);
                crate::log_warn!(
                    log,
                    "neighbor timeout. sm_id={} location={} age={}ms",
                    record.sm_id,
                    record.location,
                    age
                );
                evicted += 1;
            } else {
                i += 1;
            }
        }
        evicted
    }
}
