//! Connection table.
//!
//! One slot per connection ID the radio can report. The fan-out writes it,
//! the application reads it from any task, so slots are atomics and a read
//! never takes a lock.

use atlink_core::constants::MAX_CONNECTIONS;
use atlink_core::{ConnectionId, ConnectionStatus};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct ConnectionTable {
    open: [AtomicBool; MAX_CONNECTIONS],
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the status of `id`, returning the previous one.
    pub fn set(&self, id: ConnectionId, status: ConnectionStatus) -> ConnectionStatus {
        let was_open = self.open[id.index()].swap(status.is_open(), Ordering::AcqRel);
        to_status(was_open)
    }

    pub fn status(&self, id: ConnectionId) -> ConnectionStatus {
        to_status(self.open[id.index()].load(Ordering::Acquire))
    }

    /// Status of a raw ID; anything out of range reads as closed.
    pub fn status_of(&self, id: u8) -> ConnectionStatus {
        ConnectionId::new(id)
            .map(|id| self.status(id))
            .unwrap_or_default()
    }

    /// Close every slot and return the IDs that were open, ascending.
    pub fn close_all(&self) -> Vec<ConnectionId> {
        ConnectionId::all()
            .filter(|id| self.set(*id, ConnectionStatus::Closed).is_open())
            .collect()
    }

    pub fn snapshot(&self) -> [ConnectionStatus; MAX_CONNECTIONS] {
        std::array::from_fn(|i| to_status(self.open[i].load(Ordering::Acquire)))
    }

    pub fn open_count(&self) -> usize {
        self.open
            .iter()
            .filter(|slot| slot.load(Ordering::Acquire))
            .count()
    }
}

fn to_status(open: bool) -> ConnectionStatus {
    if open {
        ConnectionStatus::Open
    } else {
        ConnectionStatus::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn id(raw: u8) -> ConnectionId {
        ConnectionId::new(raw).unwrap()
    }

    #[test]
    fn test_starts_closed() {
        let table = ConnectionTable::new();
        assert!(table.snapshot().iter().all(|s| *s == ConnectionStatus::Closed));
        assert_eq!(table.open_count(), 0);
    }

    #[test]
    fn test_set_returns_previous() {
        let table = ConnectionTable::new();
        assert_eq!(table.set(id(2), ConnectionStatus::Open), ConnectionStatus::Closed);
        assert_eq!(table.set(id(2), ConnectionStatus::Open), ConnectionStatus::Open);
        assert_eq!(table.status(id(2)), ConnectionStatus::Open);
        assert_eq!(table.status(id(1)), ConnectionStatus::Closed);
    }

    #[rstest]
    #[case(5)]
    #[case(9)]
    #[case(255)]
    fn test_out_of_range_reads_closed(#[case] raw: u8) {
        let table = ConnectionTable::new();
        for id in ConnectionId::all() {
            table.set(id, ConnectionStatus::Open);
        }
        assert_eq!(table.status_of(raw), ConnectionStatus::Closed);
    }

    #[test]
    fn test_close_all_reports_open_slots() {
        let table = ConnectionTable::new();
        table.set(id(3), ConnectionStatus::Open);
        table.set(id(0), ConnectionStatus::Open);

        assert_eq!(table.close_all(), vec![id(0), id(3)]);
        assert_eq!(table.open_count(), 0);
        assert!(table.close_all().is_empty());
    }
}
