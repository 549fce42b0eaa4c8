//! VLAN registry implementation
//!
//! The central registry that tracks registered clients and their VLAN
//! membership, and fans messages out to a sender's VLAN peers.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::RwLock;

use super::entry::ClientEntry;

/// Central registry for all registered clients and VLAN membership
///
/// Both maps live behind one `RwLock` so every membership read is consistent
/// with the client entries it refers to. Read-heavy broadcast snapshots take
/// the lock shared; registration changes take it exclusively.
pub struct VlanRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    /// Map of client id to its connection entry
    clients: HashMap<String, ClientEntry>,

    /// Map of VLAN id to its member client ids
    ///
    /// VLANs are created on first join and never removed; an empty set
    /// remains after the last member leaves.
    vlans: HashMap<String, HashSet<String>>,
}

impl VlanRegistry {
    /// Create a new, empty registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Register a client into a VLAN
    ///
    /// Inserts or replaces the client entry and adds the id to the VLAN's
    /// member set, creating the VLAN on first join. A duplicate client id
    /// supersedes the previous registration: the old entry leaves its VLAN
    /// atomically with the insert, and dropping its outbox sender here shuts
    /// the old connection down. The superseded handler's own cleanup then
    /// no-ops on the session id check in [`unregister`](Self::unregister).
    pub async fn register(
        &self,
        client_id: &str,
        vlan_id: &str,
        session_id: u64,
        outbox: mpsc::Sender<Bytes>,
    ) {
        let mut inner = self.inner.write().await;

        let entry = ClientEntry::new(vlan_id, session_id, outbox);
        if let Some(old) = inner.clients.insert(client_id.to_string(), entry) {
            if let Some(members) = inner.vlans.get_mut(&old.vlan_id) {
                members.remove(client_id);
            }
            tracing::warn!(
                client = %client_id,
                old_vlan = %old.vlan_id,
                old_session = old.session_id,
                "Duplicate registration, superseding previous connection"
            );
        }

        inner
            .vlans
            .entry(vlan_id.to_string())
            .or_default()
            .insert(client_id.to_string());

        tracing::info!(
            client = %client_id,
            vlan = %vlan_id,
            session = session_id,
            "Client registered"
        );
    }

    /// Unregister a client from a VLAN
    ///
    /// Idempotent: unknown client ids are a no-op. The session id must match
    /// the stored entry; a mismatch means the entry now belongs to a newer
    /// connection with the same id, and nothing is touched.
    pub async fn unregister(&self, client_id: &str, vlan_id: &str, session_id: u64) {
        let mut inner = self.inner.write().await;

        let owned = matches!(
            inner.clients.get(client_id),
            Some(entry) if entry.session_id == session_id
        );

        if owned {
            inner.clients.remove(client_id);
            if let Some(members) = inner.vlans.get_mut(vlan_id) {
                members.remove(client_id);
            }
            tracing::info!(
                client = %client_id,
                vlan = %vlan_id,
                session = session_id,
                "Client unregistered"
            );
        } else if inner.clients.contains_key(client_id) {
            tracing::debug!(
                client = %client_id,
                caller_session = session_id,
                "Unregister skipped, entry owned by a newer connection"
            );
        }
    }

    /// Snapshot the members of a VLAN, excluding one client id
    ///
    /// An unknown VLAN yields an empty snapshot.
    pub async fn members_of(&self, vlan_id: &str, excluding: &str) -> Vec<String> {
        let inner = self.inner.read().await;

        inner
            .vlans
            .get(vlan_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|id| id.as_str() != excluding)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Broadcast a payload to every member of a VLAN except the sender
    ///
    /// The membership snapshot is taken under the read lock; delivery runs
    /// outside it so a slow recipient never stalls registration. A failed
    /// delivery to one member is logged and does not abort delivery to the
    /// rest. An unknown VLAN is a silent no-op.
    ///
    /// Returns the number of successful and failed deliveries.
    pub async fn broadcast(&self, vlan_id: &str, sender_id: &str, payload: Bytes) -> (u64, u64) {
        let targets: Vec<(String, mpsc::Sender<Bytes>)> = {
            let inner = self.inner.read().await;

            let members = match inner.vlans.get(vlan_id) {
                Some(members) => members,
                None => return (0, 0),
            };

            members
                .iter()
                .filter(|id| id.as_str() != sender_id)
                .filter_map(|id| {
                    inner
                        .clients
                        .get(id)
                        .map(|entry| (id.clone(), entry.outbox.clone()))
                })
                .collect()
        };

        let mut delivered = 0;
        let mut failed = 0;

        for (id, outbox) in targets {
            match outbox.send(payload.clone()).await {
                Ok(()) => delivered += 1,
                Err(_) => {
                    failed += 1;
                    tracing::warn!(
                        client = %id,
                        vlan = %vlan_id,
                        "Failed to deliver message, recipient is gone"
                    );
                }
            }
        }

        (delivered, failed)
    }

    /// Check whether a client id is currently registered
    pub async fn is_registered(&self, client_id: &str) -> bool {
        self.inner.read().await.clients.contains_key(client_id)
    }

    /// Get the number of registered clients
    pub async fn client_count(&self) -> usize {
        self.inner.read().await.clients.len()
    }

    /// Get the number of known VLANs, empty ones included
    pub async fn vlan_count(&self) -> usize {
        self.inner.read().await.vlans.len()
    }
}

impl Default for VlanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn outbox(capacity: usize) -> (mpsc::Sender<Bytes>, mpsc::Receiver<Bytes>) {
        mpsc::channel(capacity)
    }

    #[tokio::test]
    async fn test_register_and_members() {
        let registry = VlanRegistry::new();
        let (tx_a, _rx_a) = outbox(8);
        let (tx_b, _rx_b) = outbox(8);

        registry.register("a", "floor1", 1, tx_a).await;
        registry.register("b", "floor1", 2, tx_b).await;

        let mut members = registry.members_of("floor1", "a").await;
        members.sort();
        assert_eq!(members, vec!["b".to_string()]);
        assert!(registry.is_registered("a").await);
        assert_eq!(registry.client_count().await, 2);
        assert_eq!(registry.vlan_count().await, 1);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = VlanRegistry::new();
        let (tx, _rx) = outbox(8);

        registry.register("a", "floor1", 1, tx).await;
        registry.unregister("a", "floor1", 1).await;
        assert!(!registry.is_registered("a").await);
        assert!(registry.members_of("floor1", "").await.is_empty());

        // Unregistering again, or an id that never existed, is a no-op
        registry.unregister("a", "floor1", 1).await;
        registry.unregister("ghost", "floor1", 99).await;
        assert_eq!(registry.client_count().await, 0);

        // The VLAN itself survives with an empty member set
        assert_eq!(registry.vlan_count().await, 1);
    }

    #[tokio::test]
    async fn test_no_dangling_membership() {
        let registry = VlanRegistry::new();

        for i in 0..10u64 {
            let (tx, _rx) = outbox(8);
            registry.register(&format!("c{i}"), "floor1", i, tx).await;
        }
        for i in (0..10u64).step_by(2) {
            registry.unregister(&format!("c{i}"), "floor1", i).await;
        }

        // Every remaining member still has a live client entry
        for id in registry.members_of("floor1", "").await {
            assert!(registry.is_registered(&id).await, "dangling member {id}");
        }
        assert_eq!(registry.members_of("floor1", "").await.len(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_id_supersedes_previous_connection() {
        let registry = VlanRegistry::new();
        let (tx_old, mut rx_old) = outbox(8);
        let (tx_new, _rx_new) = outbox(8);

        registry.register("a", "floor1", 1, tx_old).await;
        registry.register("a", "floor2", 2, tx_new).await;

        // Last write wins; the old membership is gone
        assert!(registry.members_of("floor1", "").await.is_empty());
        assert_eq!(registry.members_of("floor2", "").await, vec!["a".to_string()]);

        // The superseded outbox is closed once its sender is dropped
        assert!(rx_old.recv().await.is_none());

        // The superseded handler's cleanup must not disturb the new entry
        registry.unregister("a", "floor1", 1).await;
        assert!(registry.is_registered("a").await);
        assert_eq!(registry.members_of("floor2", "").await, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_peers_not_sender() {
        let registry = VlanRegistry::new();
        let (tx_a, mut rx_a) = outbox(8);
        let (tx_b, mut rx_b) = outbox(8);
        let (tx_c, mut rx_c) = outbox(8);

        registry.register("a", "floor1", 1, tx_a).await;
        registry.register("b", "floor1", 2, tx_b).await;
        registry.register("c", "floor2", 3, tx_c).await;

        let payload = Bytes::from_static(br#"{"msg":"hi"}"#);
        let (delivered, failed) = registry.broadcast("floor1", "a", payload.clone()).await;

        assert_eq!(delivered, 1);
        assert_eq!(failed, 0);
        assert_eq!(rx_b.recv().await.unwrap(), payload);

        // Neither the sender nor the other VLAN sees anything
        assert!(rx_a.try_recv().is_err());
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_unknown_vlan_is_noop() {
        let registry = VlanRegistry::new();
        let (delivered, failed) = registry
            .broadcast("nowhere", "a", Bytes::from_static(b"{}"))
            .await;

        assert_eq!(delivered, 0);
        assert_eq!(failed, 0);
    }

    #[tokio::test]
    async fn test_broadcast_failure_does_not_abort_delivery() {
        let registry = VlanRegistry::new();
        let (tx_a, _rx_a) = outbox(8);
        let (tx_b, rx_b) = outbox(8);
        let (tx_c, mut rx_c) = outbox(8);

        registry.register("a", "floor1", 1, tx_a).await;
        registry.register("b", "floor1", 2, tx_b).await;
        registry.register("c", "floor1", 3, tx_c).await;

        // b's receiver is gone, as if its connection were tearing down
        drop(rx_b);

        let (delivered, failed) = registry
            .broadcast("floor1", "a", Bytes::from_static(b"{}"))
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(failed, 1);
        assert!(rx_c.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_registration_no_lost_updates() {
        let registry = Arc::new(VlanRegistry::new());
        let mut handles = Vec::new();

        for i in 0..32u64 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let (tx, rx) = outbox(8);
                registry.register(&format!("c{i}"), "floor1", i, tx).await;
                // Keep the receiver alive past registration
                rx
            }));
        }

        let mut receivers = Vec::new();
        for handle in handles {
            receivers.push(handle.await.unwrap());
        }

        assert_eq!(registry.members_of("floor1", "").await.len(), 32);
        assert_eq!(registry.client_count().await, 32);
    }

    #[tokio::test]
    async fn test_concurrent_churn_ends_consistent() {
        let registry = Arc::new(VlanRegistry::new());
        let mut handles = Vec::new();

        for i in 0..16u64 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let id = format!("c{i}");
                for round in 0..8u64 {
                    let session = i * 100 + round;
                    let (tx, _rx) = outbox(8);
                    registry.register(&id, "floor1", session, tx).await;
                    registry
                        .broadcast("floor1", &id, Bytes::from_static(b"{}"))
                        .await;
                    if round % 2 == 0 {
                        registry.unregister(&id, "floor1", session).await;
                    }
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        // Whatever interleaving happened, membership and entries agree
        let members = registry.members_of("floor1", "").await;
        for id in &members {
            assert!(registry.is_registered(id).await, "dangling member {id}");
        }
        assert_eq!(members.len(), registry.client_count().await);
    }
}
