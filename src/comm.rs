//! Thin framer/dispatcher between the structured [`Packet`] and a byte transport
//! (`SPEC_FULL.md` §4.1/§4.2). Transport-agnostic: any `Transport` impl plugs in, from the
//! bundled reference `sim::SimTransport` to a real radio driver.

use crate::network::{NodeId, Packet, BROADCAST_ID};

/// The byte-level contract the core needs from whatever radio/medium sits underneath it.
/// No retries, no buffering beyond what the implementation provides — best-effort only.
pub trait Transport {
    fn send_unicast(&mut self, dst: NodeId, bytes: &[u8]);
    fn send_broadcast(&mut self, bytes: &[u8]);
}

/// Frames [`Packet`]s over a [`Transport`] and decides unicast vs. broadcast by `dst`.
pub struct CommunicationManager<T: Transport> {
    self_id: NodeId,
    transport: T,
}

impl<T: Transport> CommunicationManager<T> {
    pub fn new(self_id: NodeId, transport: T) -> Self {
        Self { self_id, transport }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Sends `pkt`, routing to unicast or broadcast based on `pkt.dst`.
    pub fn send(&mut self, pkt: &Packet) {
        let bytes = pkt.encode();
        if pkt.dst == BROADCAST_ID {
            self.transport.send_broadcast(&bytes);
        } else {
            self.transport.send_unicast(pkt.dst, &bytes);
        }
    }

    /// Decodes an inbound datagram and returns it only if addressed to us (unicast or
    /// broadcast); packets for other nodes are dropped silently before dispatch, per §4.2.
    pub fn decode_inbound(&self, bytes: &[u8]) -> Option<Packet> {
        let pkt = Packet::decode(bytes)?;
        if pkt.dst == self.self_id || pkt.dst == BROADCAST_ID {
            Some(pkt)
        } else {
            None
        }
    }
}
