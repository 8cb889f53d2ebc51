//! Per-peer last-known position and hop count, fed by periodic NEIGHBOR broadcasts.

use std::collections::HashMap;

use log::trace;

use crate::network::{NodeId, Packet, PacketCategory, BROADCAST_ID};
use crate::vector3::Vector3;

const NEIGHBOR_PAYLOAD_LEN: usize = 2 + 3 * 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborEntry {
    pub id: NodeId,
    pub hops_to_base: u8,
    pub position: Vector3,
}

/// Owns the neighbor table. Entries are upserted on receipt and never evicted by the core
/// (see `SPEC_FULL.md` §3 Lifecycles — eviction is an external policy, not required here).
#[derive(Default)]
pub struct NeighborManager {
    neighbors: HashMap<NodeId, NeighborEntry>,
}

impl NeighborManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles an inbound NEIGHBOR packet, upserting the table on success.
    pub fn on_packet(&mut self, pkt: &Packet) {
        debug_assert_eq!(pkt.category, PacketCategory::Neighbor);
        let Some(entry) = decode_entry(pkt.src, &pkt.payload) else {
            trace!("dropping malformed NEIGHBOR payload from {}", pkt.src);
            return;
        };
        self.neighbors.insert(entry.id, entry);
    }

    /// Builds the broadcast NEIGHBOR packet advertising this node's own entry.
    pub fn broadcast_self(id: NodeId, position: Vector3, hops_to_base: u8) -> Packet {
        let mut payload = Vec::with_capacity(NEIGHBOR_PAYLOAD_LEN);
        payload.push(id);
        payload.push(hops_to_base);
        payload.extend_from_slice(&position.x.to_le_bytes());
        payload.extend_from_slice(&position.y.to_le_bytes());
        payload.extend_from_slice(&position.z.to_le_bytes());
        Packet::new(id, BROADCAST_ID, PacketCategory::Neighbor, payload)
    }

    /// Directly records a neighbor entry, bypassing the wire format. Used by `DroneAgent`
    /// to fold a POS_ACK's embedded base coordinates into the table as a synthetic entry
    /// (`SPEC_FULL.md` §4.6).
    pub fn upsert(&mut self, entry: NeighborEntry) {
        self.neighbors.insert(entry.id, entry);
    }

    /// A snapshot of all currently-known neighbors, in unspecified order.
    pub fn neighbors(&self) -> Vec<NeighborEntry> {
        self.neighbors.values().copied().collect()
    }
}

fn decode_entry(src: NodeId, payload: &[u8]) -> Option<NeighborEntry> {
    if payload.len() < NEIGHBOR_PAYLOAD_LEN {
        return None;
    }
    if payload[0] != src {
        return None;
    }
    let x = f64::from_le_bytes(payload[2..10].try_into().ok()?);
    let y = f64::from_le_bytes(payload[10..18].try_into().ok()?);
    let z = f64::from_le_bytes(payload[18..26].try_into().ok()?);
    Some(NeighborEntry { id: payload[0], hops_to_base: payload[1], position: Vector3::new(x, y, z) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_then_receive_round_trips() {
        let pkt = NeighborManager::broadcast_self(4, Vector3::new(1.0, 2.0, 3.0), 2);
        let mut nm = NeighborManager::new();
        nm.on_packet(&pkt);
        let neighbors = nm.neighbors();
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0], NeighborEntry { id: 4, hops_to_base: 2, position: Vector3::new(1.0, 2.0, 3.0) });
    }

    #[test]
    fn later_broadcast_overwrites_earlier_entry() {
        let mut nm = NeighborManager::new();
        nm.on_packet(&NeighborManager::broadcast_self(4, Vector3::new(0.0, 0.0, 0.0), 3));
        nm.on_packet(&NeighborManager::broadcast_self(4, Vector3::new(9.0, 9.0, 9.0), 1));
        let neighbors = nm.neighbors();
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].hops_to_base, 1);
        assert_eq!(neighbors[0].position, Vector3::new(9.0, 9.0, 9.0));
    }

    #[test]
    fn mismatched_leading_byte_is_dropped() {
        let mut pkt = NeighborManager::broadcast_self(4, Vector3::new(1.0, 1.0, 1.0), 1);
        pkt.payload[0] = 9; // no longer matches pkt.src
        let mut nm = NeighborManager::new();
        nm.on_packet(&pkt);
        assert!(nm.neighbors().is_empty());
    }

    #[test]
    fn truncated_payload_is_dropped() {
        let mut nm = NeighborManager::new();
        nm.on_packet(&Packet::new(4, BROADCAST_ID, PacketCategory::Neighbor, vec![4, 1, 2, 3]));
        assert!(nm.neighbors().is_empty());
    }
}
