//! Base station orchestration (`SPEC_FULL.md` §4.7): periodic flood seeding and
//! POS_UPDATE/POS_ACK handling. The base never broadcasts.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::comm::{CommunicationManager, Transport};
use crate::core_proto::CoreMsg;
use crate::network::{NodeId, Packet, PacketCategory};
use crate::vector3::Vector3;

pub struct BaseAgent<T: Transport> {
    self_id: NodeId,
    comm: CommunicationManager<T>,
    position: Vector3,
    registered_drones: Vec<NodeId>,
    last_position: BTreeMap<NodeId, Vector3>,
    flood_seq: u16,
    log_target: String,
}

impl<T: Transport> BaseAgent<T> {
    pub fn new(self_id: NodeId, transport: T, position: Vector3) -> Self {
        Self {
            self_id,
            comm: CommunicationManager::new(self_id, transport),
            position,
            registered_drones: Vec::new(),
            last_position: BTreeMap::new(),
            flood_seq: 0,
            log_target: format!("base-{}", self_id),
        }
    }

    pub fn register_drone(&mut self, id: NodeId) {
        if !self.registered_drones.contains(&id) {
            self.registered_drones.push(id);
        }
    }

    pub fn last_position_of(&self, id: NodeId) -> Option<Vector3> {
        self.last_position.get(&id).copied()
    }

    /// Runs one base tick (default every `base_tick_s`, 2.0 s): seeds a new flood at
    /// the lowest registered drone id, per `SPEC_FULL.md` §4.7.
    pub fn tick(&mut self) {
        let Some(&initiator) = self.registered_drones.iter().min() else {
            return;
        };
        self.flood_seq = self.flood_seq.wrapping_add(1);
        debug!(target: &self.log_target, "seeding flood {} via drone {}", self.flood_seq, initiator);
        let msg = crate::flood::FloodMsg::Start { flood_id: self.flood_seq };
        let pkt = Packet::new(self.self_id, initiator, PacketCategory::Flood, msg.encode());
        self.comm.send(&pkt);
    }

    /// Handles one inbound datagram addressed to this base station.
    pub fn on_inbound(&mut self, bytes: &[u8]) {
        let Some(pkt) = self.comm.decode_inbound(bytes) else { return };
        if pkt.category != PacketCategory::Core {
            return;
        }
        let Some(CoreMsg::PosUpdate { drone_id, base_id, seq, x, y, z }) = CoreMsg::decode(&pkt.payload) else {
            return;
        };
        if base_id != self.self_id {
            return;
        }

        self.last_position.insert(drone_id, Vector3::new(x as f64, y as f64, z as f64));
        info!(target: &self.log_target, "recorded position update {} from drone {}", seq, drone_id);

        let ack = CoreMsg::PosAck {
            base_id: self.self_id,
            drone_id,
            seq,
            base_hops: 0,
            x: self.position.x,
            y: self.position.y,
            z: self.position.z,
        };
        let ack_pkt = Packet::new(self.self_id, drone_id, PacketCategory::Core, ack.encode());
        self.comm.send(&ack_pkt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        unicasts: Vec<(NodeId, Vec<u8>)>,
        broadcasts: Vec<Vec<u8>>,
    }

    impl Transport for RecordingTransport {
        fn send_unicast(&mut self, dst: NodeId, bytes: &[u8]) {
            self.unicasts.push((dst, bytes.to_vec()));
        }
        fn send_broadcast(&mut self, bytes: &[u8]) {
            self.broadcasts.push(bytes.to_vec());
        }
    }

    #[test]
    fn tick_with_no_registered_drones_sends_nothing() {
        let mut base = BaseAgent::new(0, RecordingTransport::default(), Vector3::ZERO);
        base.tick();
        assert!(base.comm.transport_mut().unicasts.is_empty());
    }

    #[test]
    fn tick_seeds_flood_at_lowest_registered_id() {
        let mut base = BaseAgent::new(0, RecordingTransport::default(), Vector3::ZERO);
        base.register_drone(5);
        base.register_drone(2);
        base.register_drone(9);
        base.tick();
        assert_eq!(base.comm.transport_mut().unicasts.len(), 1);
        assert_eq!(base.comm.transport_mut().unicasts[0].0, 2);
    }

    #[test]
    fn tick_never_broadcasts() {
        let mut base = BaseAgent::new(0, RecordingTransport::default(), Vector3::ZERO);
        base.register_drone(3);
        base.tick();
        base.tick();
        assert!(base.comm.transport_mut().broadcasts.is_empty());
    }

    #[test]
    fn pos_update_triggers_unicast_ack_with_own_position() {
        let mut base = BaseAgent::new(0, RecordingTransport::default(), Vector3::new(1.0, 2.0, 3.0));
        let update = CoreMsg::PosUpdate { drone_id: 4, base_id: 0, seq: 7, x: 10.0, y: 0.0, z: 0.0 };
        let pkt = Packet::new(4, 0, PacketCategory::Core, update.encode());
        base.on_inbound(&pkt.encode());

        assert_eq!(base.last_position_of(4), Some(Vector3::new(10.0, 0.0, 0.0)));
        assert_eq!(base.comm.transport_mut().unicasts.len(), 1);
        let (dst, bytes) = &base.comm.transport_mut().unicasts[0];
        assert_eq!(*dst, 4);
        let ack_pkt = Packet::decode(bytes).unwrap();
        let ack = CoreMsg::decode(&ack_pkt.payload).unwrap();
        assert_eq!(
            ack,
            CoreMsg::PosAck { base_id: 0, drone_id: 4, seq: 7, base_hops: 0, x: 1.0, y: 2.0, z: 3.0 }
        );
    }

    #[test]
    fn pos_update_for_a_different_base_is_ignored() {
        let mut base = BaseAgent::new(0, RecordingTransport::default(), Vector3::ZERO);
        let update = CoreMsg::PosUpdate { drone_id: 4, base_id: 9, seq: 1, x: 0.0, y: 0.0, z: 0.0 };
        let pkt = Packet::new(4, 0, PacketCategory::Core, update.encode());
        base.on_inbound(&pkt.encode());
        assert!(base.comm.transport_mut().unicasts.is_empty());
    }
}
