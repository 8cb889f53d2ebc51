//! Multi-hop minimum-hop-to-base computation, driven by base-initiated floods.
//!
//! See `SPEC_FULL.md` §4.3 for the protocol description this module implements verbatim.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::network::{NodeId, Packet, PacketCategory, UNKNOWN_HOPS};

const MSG_START: u8 = 0;
const MSG_DISCOVERY: u8 = 1;
const MSG_REPORT: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodMsg {
    Start { flood_id: u16 },
    Discovery { flood_id: u16, initiator_id: NodeId, hop_to_base: u8 },
    Report { flood_id: u16, initiator_id: NodeId, reporter_id: NodeId, hop_to_base: u8 },
}

impl FloodMsg {
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            FloodMsg::Start { flood_id } => {
                let mut out = vec![MSG_START];
                out.extend_from_slice(&flood_id.to_le_bytes());
                out
            }
            FloodMsg::Discovery { flood_id, initiator_id, hop_to_base } => {
                let mut out = vec![MSG_DISCOVERY];
                out.extend_from_slice(&flood_id.to_le_bytes());
                out.push(initiator_id);
                out.push(hop_to_base);
                out
            }
            FloodMsg::Report { flood_id, initiator_id, reporter_id, hop_to_base } => {
                let mut out = vec![MSG_REPORT];
                out.extend_from_slice(&flood_id.to_le_bytes());
                out.push(initiator_id);
                out.push(reporter_id);
                out.push(hop_to_base);
                out
            }
        }
    }

    /// Decodes a FLOOD payload. Returns `None` on wrong length or unrecognized discriminant.
    pub fn decode(payload: &[u8]) -> Option<FloodMsg> {
        if payload.is_empty() {
            return None;
        }
        match payload[0] {
            MSG_START if payload.len() == 3 => {
                let flood_id = u16::from_le_bytes([payload[1], payload[2]]);
                Some(FloodMsg::Start { flood_id })
            }
            MSG_DISCOVERY if payload.len() == 5 => {
                let flood_id = u16::from_le_bytes([payload[1], payload[2]]);
                Some(FloodMsg::Discovery { flood_id, initiator_id: payload[3], hop_to_base: payload[4] })
            }
            MSG_REPORT if payload.len() == 6 => {
                let flood_id = u16::from_le_bytes([payload[1], payload[2]]);
                Some(FloodMsg::Report {
                    flood_id,
                    initiator_id: payload[3],
                    reporter_id: payload[4],
                    hop_to_base: payload[5],
                })
            }
            _ => None,
        }
    }
}

/// Owns the per-flood hop tables and decides when to rebroadcast.
///
/// `FloodManager` never sends anything itself; every handler returns the packets the
/// caller (`DroneAgent`/`BaseAgent`) should hand to the communication manager. This keeps
/// the manager a pure state machine, which is what the invariants in `SPEC_FULL.md` §8 are
/// written against.
pub struct FloodManager {
    self_id: NodeId,
    best_hop_to_base: HashMap<u16, u8>,
    seen_floods: HashSet<u16>,
    best_report_seen: HashMap<u16, HashMap<NodeId, u8>>,
}

impl FloodManager {
    pub fn new(self_id: NodeId) -> Self {
        Self {
            self_id,
            best_hop_to_base: HashMap::new(),
            seen_floods: HashSet::new(),
            best_report_seen: HashMap::new(),
        }
    }

    /// The base calling `start_flood` on itself/its initiator: records hop 1 and seeds DISCOVERY.
    pub fn start_flood(&mut self, flood_id: u16) -> Packet {
        self.seen_floods.insert(flood_id);
        self.best_hop_to_base.insert(flood_id, 1);
        self.encode_discovery(flood_id, self.self_id, 1)
    }

    /// Dispatches a decoded FLOOD packet, returning any packets that must be sent in response.
    pub fn on_packet(&mut self, pkt: &Packet, is_base_reachable: bool) -> Vec<Packet> {
        debug_assert_eq!(pkt.category, PacketCategory::Flood);
        let Some(msg) = FloodMsg::decode(&pkt.payload) else {
            trace!("drone-{}: dropping malformed FLOOD payload", self.self_id);
            return Vec::new();
        };
        match msg {
            FloodMsg::Start { flood_id } => self.handle_start(flood_id),
            FloodMsg::Discovery { flood_id, initiator_id, hop_to_base } => {
                self.handle_discovery(flood_id, initiator_id, hop_to_base, is_base_reachable)
            }
            FloodMsg::Report { flood_id, initiator_id, reporter_id, hop_to_base } => {
                self.handle_report(flood_id, initiator_id, reporter_id, hop_to_base)
            }
        }
    }

    fn handle_start(&mut self, flood_id: u16) -> Vec<Packet> {
        if self.seen_floods.contains(&flood_id) {
            return Vec::new();
        }
        vec![self.start_flood(flood_id)]
    }

    fn handle_discovery(
        &mut self,
        flood_id: u16,
        initiator_id: NodeId,
        hop_to_base: u8,
        is_base_reachable: bool,
    ) -> Vec<Packet> {
        let candidate = if is_base_reachable { 1 } else { hop_to_base.saturating_add(1) };

        let improved = match self.best_hop_to_base.get(&flood_id) {
            None => true,
            Some(&existing) => candidate < existing,
        };
        if !improved {
            return Vec::new();
        }

        self.best_hop_to_base.insert(flood_id, candidate);
        self.seen_floods.insert(flood_id);
        self.best_report_seen.entry(flood_id).or_default().insert(self.self_id, candidate);

        debug!(
            "drone-{}: flood {} improved to {} hops (initiator {})",
            self.self_id, flood_id, candidate, initiator_id
        );

        vec![
            self.encode_report(flood_id, initiator_id, self.self_id, candidate),
            self.encode_discovery(flood_id, initiator_id, candidate),
        ]
    }

    fn handle_report(
        &mut self,
        flood_id: u16,
        initiator_id: NodeId,
        reporter_id: NodeId,
        hop_to_base: u8,
    ) -> Vec<Packet> {
        if !self.seen_floods.contains(&flood_id) {
            return Vec::new();
        }

        let seen = self.best_report_seen.entry(flood_id).or_default();
        let improved = match seen.get(&reporter_id) {
            None => true,
            Some(&existing) => hop_to_base < existing,
        };
        if !improved {
            return Vec::new();
        }
        seen.insert(reporter_id, hop_to_base);

        vec![self.encode_report(flood_id, initiator_id, reporter_id, hop_to_base)]
    }

    /// The hop count from this node to the base, per `SPEC_FULL.md` §4.3.
    pub fn hops_from_base(&self, is_base_reachable: bool) -> u8 {
        if is_base_reachable {
            return 1;
        }
        let Some(&latest_flood_id) = self.best_hop_to_base.keys().max() else {
            return UNKNOWN_HOPS;
        };
        match self.best_hop_to_base.get(&latest_flood_id) {
            Some(&1) => UNKNOWN_HOPS,
            Some(&hops) => hops,
            None => UNKNOWN_HOPS,
        }
    }

    fn encode_discovery(&self, flood_id: u16, initiator_id: NodeId, hop_to_base: u8) -> Packet {
        let msg = FloodMsg::Discovery { flood_id, initiator_id, hop_to_base };
        Packet::new(self.self_id, crate::network::BROADCAST_ID, PacketCategory::Flood, msg.encode())
    }

    fn encode_report(&self, flood_id: u16, initiator_id: NodeId, reporter_id: NodeId, hop_to_base: u8) -> Packet {
        let msg = FloodMsg::Report { flood_id, initiator_id, reporter_id, hop_to_base };
        Packet::new(self.self_id, crate::network::BROADCAST_ID, PacketCategory::Flood, msg.encode())
    }
}
