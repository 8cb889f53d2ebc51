//! Node identity and the packet envelope shared by every protocol category.

/// 8-bit node identity. `0` is reserved for the base station, `BROADCAST_ID` for broadcast.
pub type NodeId = u8;

/// Reserved destination meaning "every node in range".
pub const BROADCAST_ID: NodeId = 0xFF;

/// Reserved id of the base station.
pub const BASE_ID: NodeId = 0;

/// Sentinel returned by [`crate::flood::FloodManager::hops_from_base`] when the hop count
/// to the base is unknown or stale.
pub const UNKNOWN_HOPS: u8 = u8::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketCategory {
    Core = 0,
    Flood = 1,
    Neighbor = 2,
}

impl PacketCategory {
    fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(PacketCategory::Core),
            1 => Some(PacketCategory::Flood),
            2 => Some(PacketCategory::Neighbor),
            _ => None,
        }
    }
}

/// A decoded packet: `[src][dst][category]` header plus an opaque, category-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub src: NodeId,
    pub dst: NodeId,
    pub category: PacketCategory,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(src: NodeId, dst: NodeId, category: PacketCategory, payload: Vec<u8>) -> Self {
        Self { src, dst, category, payload }
    }

    /// Wire encoding: `[src:u8][dst:u8][category:u8][payload...]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 + self.payload.len());
        out.push(self.src);
        out.push(self.dst);
        out.push(self.category as u8);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Decodes a wire envelope. Returns `None` on truncated or unrecognized-category input.
    pub fn decode(bytes: &[u8]) -> Option<Packet> {
        if bytes.len() < 3 {
            return None;
        }
        let category = PacketCategory::from_u8(bytes[2])?;
        Some(Packet {
            src: bytes[0],
            dst: bytes[1],
            category,
            payload: bytes[3..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let pkt = Packet::new(3, BROADCAST_ID, PacketCategory::Neighbor, vec![1, 2, 3, 4]);
        let bytes = pkt.encode();
        assert_eq!(Packet::decode(&bytes), Some(pkt));
    }

    #[test]
    fn decode_rejects_truncated_or_unknown_category() {
        assert_eq!(Packet::decode(&[1, 2]), None);
        assert_eq!(Packet::decode(&[1, 2, 99]), None);
    }
}
