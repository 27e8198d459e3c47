//! Per-requester hysteresis memory.
//!
//! # Design Decisions
//! - Keyed by client IP; the source port changes on every connection
//! - DashMap shards by key, so distinct requesters do not contend
//! - Bounded: when full, the least recently seen requester is evicted.
//!   An evicted requester looks new and gets `ready` next time, which is
//!   the safe side of the hysteresis rule
//! - The bound is approximate under concurrent inserts of new keys

use dashmap::DashMap;
use std::net::IpAddr;
use std::time::Instant;

use crate::agent::status::StatusClass;

#[derive(Debug, Clone, Copy)]
struct Entry {
    class: StatusClass,
    last_seen: Instant,
}

/// Bounded map of requester → last reported status class.
#[derive(Debug)]
pub struct RequesterTable {
    entries: DashMap<IpAddr, Entry>,
    capacity: usize,
}

impl RequesterTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record `class` for `requester`, returning the previously recorded class.
    pub fn record(&self, requester: IpAddr, class: StatusClass) -> Option<StatusClass> {
        if !self.entries.contains_key(&requester) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        let entry = Entry {
            class,
            last_seen: Instant::now(),
        };
        self.entries.insert(requester, entry).map(|previous| previous.class)
    }

    pub fn class_of(&self, requester: &IpAddr) -> Option<StatusClass> {
        self.entries.get(requester).map(|e| e.class)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().last_seen)
            .map(|e| *e.key());

        if let Some(requester) = oldest {
            self.entries.remove(&requester);
            tracing::debug!(requester = %requester, capacity = self.capacity, "Evicted requester");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[test]
    fn record_returns_previous_class() {
        let table = RequesterTable::new(8);
        assert_eq!(table.record(ip(1), StatusClass::Drain), None);
        assert_eq!(table.record(ip(1), StatusClass::Ready), Some(StatusClass::Drain));
        assert_eq!(table.class_of(&ip(1)), Some(StatusClass::Ready));
        assert_eq!(table.class_of(&ip(2)), None);
    }

    #[test]
    fn evicts_least_recently_seen() {
        let table = RequesterTable::new(2);
        table.record(ip(1), StatusClass::Ready);
        std::thread::sleep(std::time::Duration::from_millis(2));
        table.record(ip(2), StatusClass::Ready);
        std::thread::sleep(std::time::Duration::from_millis(2));
        // Refresh 1 so that 2 becomes the oldest.
        table.record(ip(1), StatusClass::Ready);
        std::thread::sleep(std::time::Duration::from_millis(2));

        table.record(ip(3), StatusClass::Drain);

        assert_eq!(table.len(), 2);
        assert!(table.class_of(&ip(1)).is_some());
        assert!(table.class_of(&ip(2)).is_none());
        assert_eq!(table.class_of(&ip(3)), Some(StatusClass::Drain));
    }

    #[test]
    fn updating_known_requester_never_evicts() {
        let table = RequesterTable::new(1);
        table.record(ip(1), StatusClass::Drain);
        table.record(ip(1), StatusClass::Ready);
        assert_eq!(table.len(), 1);
        assert_eq!(table.class_of(&ip(1)), Some(StatusClass::Ready));
    }
}
