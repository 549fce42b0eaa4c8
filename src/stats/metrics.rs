//! Statistics and metrics for the relay

use std::sync::atomic::{AtomicU64, Ordering};

/// Server-wide relay counters
///
/// Shared behind an `Arc` between the accept loop and connection handlers;
/// all counters are atomics so updates never contend with dispatch.
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Total connections ever accepted
    total_connections: AtomicU64,

    /// Currently live connections
    active_connections: AtomicU64,

    /// Registrations completed
    registrations: AtomicU64,

    /// Application messages accepted for relay
    messages_relayed: AtomicU64,

    /// Successful per-recipient deliveries
    deliveries: AtomicU64,

    /// Failed per-recipient deliveries
    delivery_failures: AtomicU64,
}

impl RelayStats {
    /// Create a new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted connection
    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed connection
    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a completed registration
    pub fn registration(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one relayed message and its per-recipient outcomes
    pub fn message_relayed(&self, delivered: u64, failed: u64) {
        self.messages_relayed.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered, Ordering::Relaxed);
        self.delivery_failures.fetch_add(failed, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            messages_relayed: self.messages_relayed.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`RelayStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Total connections ever accepted
    pub total_connections: u64,
    /// Currently live connections
    pub active_connections: u64,
    /// Registrations completed
    pub registrations: u64,
    /// Application messages accepted for relay
    pub messages_relayed: u64,
    /// Successful per-recipient deliveries
    pub deliveries: u64,
    /// Failed per-recipient deliveries
    pub delivery_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = RelayStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_connection_lifecycle_counts() {
        let stats = RelayStats::new();

        stats.connection_opened();
        stats.connection_opened();
        stats.connection_closed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_connections, 2);
        assert_eq!(snapshot.active_connections, 1);
    }

    #[test]
    fn test_message_relayed_accumulates_outcomes() {
        let stats = RelayStats::new();

        stats.message_relayed(3, 1);
        stats.message_relayed(2, 0);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.messages_relayed, 2);
        assert_eq!(snapshot.deliveries, 5);
        assert_eq!(snapshot.delivery_failures, 1);
    }
}
