//! Per-drone orchestration: ties the comm manager, flood manager, neighbor table,
//! controller and mobility substrate into the tick/receive state machine of
//! `SPEC_FULL.md` §4.6.

use log::{debug, info, trace};

use crate::comm::{CommunicationManager, Transport};
use crate::controller::{Controller, ControllerParams};
use crate::core_proto::CoreMsg;
use crate::flood::FloodManager;
use crate::mobility::Integrator;
use crate::neighbor::{NeighborEntry, NeighborManager};
use crate::network::{NodeId, Packet, PacketCategory, BROADCAST_ID};
use crate::vector3::Vector3;

pub struct DroneAgent<T: Transport> {
    self_id: NodeId,
    base_id: Option<NodeId>,
    comm: CommunicationManager<T>,
    flood: FloodManager,
    neighbors: NeighborManager,
    controller: Controller,
    mobility: Integrator,
    ack_timeout_s: f64,
    tick_dt_s: f64,
    last_tick_time: Option<f64>,
    last_ack_time: f64,
    has_ack: bool,
    waiting_ack: bool,
    help_proxy_sent: bool,
    pos_seq: u16,
    last_acked_seq: Option<u16>,
    log_target: String,
}

impl<T: Transport> DroneAgent<T> {
    pub fn new(
        self_id: NodeId,
        base_id: Option<NodeId>,
        transport: T,
        initial_position: Vector3,
        controller_params: ControllerParams,
        tick_dt_s: f64,
        ack_timeout_s: f64,
    ) -> Self {
        Self {
            self_id,
            base_id,
            comm: CommunicationManager::new(self_id, transport),
            flood: FloodManager::new(self_id),
            neighbors: NeighborManager::new(),
            controller: Controller::new(controller_params),
            mobility: Integrator::new(initial_position),
            ack_timeout_s,
            tick_dt_s,
            last_tick_time: None,
            last_ack_time: 0.0,
            has_ack: false,
            waiting_ack: false,
            help_proxy_sent: false,
            pos_seq: 0,
            last_acked_seq: None,
            log_target: format!("drone-{}", self_id),
        }
    }

    pub fn tick_dt_s(&self) -> f64 {
        self.tick_dt_s
    }

    pub fn position(&self) -> Vector3 {
        self.mobility.position()
    }

    pub fn hops_from_base(&self, now: f64) -> u8 {
        self.flood.hops_from_base(self.is_base_reachable(now))
    }

    pub fn is_mission_active(&self) -> bool {
        self.controller.is_mission_active()
    }

    /// Lets an external operator clear a stuck `help_proxy_sent` flag (`SPEC_FULL.md`
    /// §9 open questions — there is no automatic clear path).
    pub fn reset_help_proxy(&mut self) {
        self.help_proxy_sent = false;
    }

    pub fn reset_mission(&mut self) {
        self.controller.reset_mission();
    }

    /// `SPEC_FULL.md` §4.6 base-reachability predicate, shared with the flood manager.
    pub fn is_base_reachable(&self, now: f64) -> bool {
        self.base_id.is_some() && self.has_ack && now - self.last_ack_time <= self.ack_timeout_s
    }

    /// Runs one tick at simulated time `now`. The caller (the scheduler harness) is
    /// responsible for invoking this every `tick_dt_s()`, staggered per
    /// `SwarmConfig::tick_phase(self_id)`.
    pub fn tick(&mut self, now: f64) {
        if self.waiting_ack && now - self.last_ack_time > self.ack_timeout_s && !self.help_proxy_sent {
            self.emit_help_proxy();
        }

        let own_position = self.mobility.position();
        let own_hops = self.hops_from_base(now);
        let neighbors = self.neighbors.neighbors();
        let out = self.controller.step(own_position, own_hops, &neighbors);

        let dt = now - self.last_tick_time.unwrap_or(now);
        self.mobility.apply_velocity(dt, out.acceleration, out.v_max);
        self.last_tick_time = Some(now);

        self.broadcast_neighbor_entry(own_hops);
        self.send_pos_update();
    }

    fn emit_help_proxy(&mut self) {
        let Some(base_id) = self.base_id else { return };
        info!(target: &self.log_target, "drone {} lost base ack, emitting HELP_PROXY", self.self_id);
        let msg = CoreMsg::HelpProxy { requester_id: self.self_id, base_id };
        let pkt = Packet::new(self.self_id, BROADCAST_ID, PacketCategory::Core, msg.encode());
        self.comm.send(&pkt);
        self.help_proxy_sent = true;
        self.waiting_ack = false;
    }

    fn broadcast_neighbor_entry(&mut self, own_hops: u8) {
        let pkt = NeighborManager::broadcast_self(self.self_id, self.mobility.position(), own_hops);
        self.comm.send(&pkt);
    }

    fn send_pos_update(&mut self) {
        let Some(base_id) = self.base_id else {
            trace!(target: &self.log_target, "no base configured, suppressing POS_UPDATE");
            return;
        };
        self.pos_seq = self.pos_seq.wrapping_add(1);
        let pos = self.mobility.position();
        let msg = CoreMsg::PosUpdate {
            drone_id: self.self_id,
            base_id,
            seq: self.pos_seq,
            x: pos.x as f32,
            y: pos.y as f32,
            z: pos.z as f32,
        };
        let dst = if self.help_proxy_sent { BROADCAST_ID } else { base_id };
        let pkt = Packet::new(self.self_id, dst, PacketCategory::Core, msg.encode());
        self.comm.send(&pkt);
        self.waiting_ack = true;
    }

    /// Handles one inbound datagram at simulated time `now`. Unlike the generic
    /// dispatch filter in `CommunicationManager`, CORE traffic is inspected even when
    /// not addressed to this node, since relaying (`SPEC_FULL.md` §4.6) depends on
    /// overhearing acks and updates meant for a peer.
    pub fn on_inbound(&mut self, bytes: &[u8], now: f64) {
        let Some(pkt) = Packet::decode(bytes) else { return };
        match pkt.category {
            PacketCategory::Flood => {
                let is_reachable = self.is_base_reachable(now);
                let out = self.flood.on_packet(&pkt, is_reachable);
                for p in out {
                    self.comm.send(&p);
                }
            }
            PacketCategory::Neighbor => self.neighbors.on_packet(&pkt),
            PacketCategory::Core => self.on_core(&pkt, now),
        }
    }

    fn on_core(&mut self, pkt: &Packet, now: f64) {
        let Some(msg) = CoreMsg::decode(&pkt.payload) else {
            trace!(target: &self.log_target, "dropping malformed CORE payload from {}", pkt.src);
            return;
        };
        match msg {
            CoreMsg::PosAck { base_id, drone_id, seq, x, y, z, .. } => self.on_pos_ack(pkt, base_id, drone_id, seq, x, y, z, now),
            CoreMsg::PosUpdate { drone_id, base_id, .. } => self.on_pos_update_overheard(pkt, drone_id, base_id),
            CoreMsg::HelpProxy { requester_id, base_id } => self.on_help_proxy(requester_id, base_id),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn on_pos_ack(
        &mut self,
        pkt: &Packet,
        base_id: NodeId,
        drone_id: NodeId,
        seq: u16,
        x: f64,
        y: f64,
        z: f64,
        now: f64,
    ) {
        if Some(base_id) != self.base_id {
            return;
        }

        if drone_id == self.self_id {
            if self.help_proxy_sent {
                trace!(target: &self.log_target, "relayed ack received, not resetting last_ack_time");
            } else {
                self.last_ack_time = now;
                self.has_ack = true;
                self.last_acked_seq = Some(seq);
                self.waiting_ack = false;
            }
            self.neighbors.upsert(NeighborEntry { id: base_id, hops_to_base: 0, position: Vector3::new(x, y, z) });
        } else {
            debug!(target: &self.log_target, "relaying POS_ACK for {} toward base", drone_id);
            self.comm.send(pkt);
        }
    }

    fn on_pos_update_overheard(&mut self, pkt: &Packet, drone_id: NodeId, base_id: NodeId) {
        if Some(base_id) != self.base_id || drone_id == self.self_id {
            return;
        }
        if pkt.dst != BROADCAST_ID {
            return;
        }
        debug!(target: &self.log_target, "forwarding POS_UPDATE from {} to base", drone_id);
        let fwd = Packet::new(self.self_id, base_id, PacketCategory::Core, pkt.payload.clone());
        self.comm.send(&fwd);
    }

    fn on_help_proxy(&mut self, requester_id: NodeId, base_id: NodeId) {
        if Some(base_id) != self.base_id || requester_id == self.self_id {
            return;
        }
        info!(target: &self.log_target, "HELP_PROXY from {}, starting mission", requester_id);
        self.controller.start_mission();
    }
}
