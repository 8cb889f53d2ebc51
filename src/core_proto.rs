//! CORE category messages: position reporting, acknowledgement, and distress relay requests.

use crate::network::NodeId;

const MSG_POS_UPDATE: u8 = 0x80;
const MSG_POS_ACK: u8 = 0x81;
const MSG_HELP_PROXY: u8 = 0x82;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoreMsg {
    PosUpdate { drone_id: NodeId, base_id: NodeId, seq: u16, x: f32, y: f32, z: f32 },
    PosAck { base_id: NodeId, drone_id: NodeId, seq: u16, base_hops: u8, x: f64, y: f64, z: f64 },
    HelpProxy { requester_id: NodeId, base_id: NodeId },
}

impl CoreMsg {
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            CoreMsg::PosUpdate { drone_id, base_id, seq, x, y, z } => {
                let mut out = vec![MSG_POS_UPDATE, drone_id, base_id];
                out.extend_from_slice(&seq.to_le_bytes());
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
                out.extend_from_slice(&z.to_le_bytes());
                out
            }
            CoreMsg::PosAck { base_id, drone_id, seq, base_hops, x, y, z } => {
                let mut out = vec![MSG_POS_ACK, base_id, drone_id];
                out.extend_from_slice(&seq.to_le_bytes());
                out.push(base_hops);
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
                out.extend_from_slice(&z.to_le_bytes());
                out
            }
            CoreMsg::HelpProxy { requester_id, base_id } => {
                vec![MSG_HELP_PROXY, requester_id, base_id]
            }
        }
    }

    pub fn decode(payload: &[u8]) -> Option<CoreMsg> {
        if payload.is_empty() {
            return None;
        }
        match payload[0] {
            MSG_POS_UPDATE if payload.len() == 1 + 2 + 2 + 4 * 3 => {
                let seq = u16::from_le_bytes([payload[3], payload[4]]);
                let x = f32::from_le_bytes(payload[5..9].try_into().ok()?);
                let y = f32::from_le_bytes(payload[9..13].try_into().ok()?);
                let z = f32::from_le_bytes(payload[13..17].try_into().ok()?);
                Some(CoreMsg::PosUpdate { drone_id: payload[1], base_id: payload[2], seq, x, y, z })
            }
            MSG_POS_ACK if payload.len() == 1 + 2 + 2 + 1 + 8 * 3 => {
                let seq = u16::from_le_bytes([payload[3], payload[4]]);
                let base_hops = payload[5];
                let x = f64::from_le_bytes(payload[6..14].try_into().ok()?);
                let y = f64::from_le_bytes(payload[14..22].try_into().ok()?);
                let z = f64::from_le_bytes(payload[22..30].try_into().ok()?);
                Some(CoreMsg::PosAck { base_id: payload[1], drone_id: payload[2], seq, base_hops, x, y, z })
            }
            MSG_HELP_PROXY if payload.len() == 3 => {
                Some(CoreMsg::HelpProxy { requester_id: payload[1], base_id: payload[2] })
            }
            _ => None,
        }
    }
}
