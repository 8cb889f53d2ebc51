//! `SimTransport` (`SPEC_FULL.md` §6): a reference shared-medium transport with a
//! configurable maximum range. Exists to make the core runnable and testable standalone,
//! not as a claim about real radio behavior.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::comm::Transport;
use crate::network::NodeId;
use crate::vector3::Vector3;

enum Delivery {
    Unicast(NodeId, Vec<u8>),
    Broadcast(Vec<u8>),
}

/// Shared medium state: node positions and per-node transmit range (for range checks),
/// plus a pending outbox drained once per scheduler step.
pub struct Medium {
    default_range: f64,
    ranges: HashMap<NodeId, f64>,
    positions: HashMap<NodeId, Vector3>,
    outbox: Vec<(NodeId, Delivery)>,
}

impl Medium {
    pub fn new(default_range: f64) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            default_range,
            ranges: HashMap::new(),
            positions: HashMap::new(),
            outbox: Vec::new(),
        }))
    }

    pub fn register_peer(&mut self, id: NodeId, position: Vector3) {
        self.positions.insert(id, position);
    }

    /// Overrides the default transmit range for one node (e.g. a base station with a
    /// wider-coverage antenna than a drone).
    pub fn set_range(&mut self, id: NodeId, range: f64) {
        self.ranges.insert(id, range);
    }

    pub fn update_position(&mut self, id: NodeId, position: Vector3) {
        self.positions.insert(id, position);
    }

    fn range_of(&self, id: NodeId) -> f64 {
        self.ranges.get(&id).copied().unwrap_or(self.default_range)
    }

    /// Drains every datagram sent since the last drain, delivering it to every recipient
    /// within the sender's transmit range of the sender's last known position. `deliver`
    /// is invoked once per `(recipient, bytes)` pair.
    pub fn drain(&mut self, mut deliver: impl FnMut(NodeId, &[u8])) {
        let pending = std::mem::take(&mut self.outbox);
        for (src, delivery) in pending {
            let Some(&src_pos) = self.positions.get(&src) else { continue };
            let range = self.range_of(src);
            match delivery {
                Delivery::Unicast(dst, bytes) => {
                    if let Some(&dst_pos) = self.positions.get(&dst) {
                        if (dst_pos - src_pos).magnitude() <= range {
                            deliver(dst, &bytes);
                        }
                    }
                }
                Delivery::Broadcast(bytes) => {
                    let in_range: Vec<NodeId> = self
                        .positions
                        .iter()
                        .filter(|&(&id, &pos)| id != src && (pos - src_pos).magnitude() <= range)
                        .map(|(&id, _)| id)
                        .collect();
                    for id in in_range {
                        deliver(id, &bytes);
                    }
                }
            }
        }
    }
}

/// Per-node handle onto the shared [`Medium`]; this is what implements [`Transport`] and
/// gets injected into a `DroneAgent`/`BaseAgent`.
pub struct SimTransport {
    self_id: NodeId,
    medium: Rc<RefCell<Medium>>,
}

impl SimTransport {
    pub fn new(self_id: NodeId, medium: Rc<RefCell<Medium>>) -> Self {
        Self { self_id, medium }
    }
}

impl Transport for SimTransport {
    fn send_unicast(&mut self, dst: NodeId, bytes: &[u8]) {
        self.medium.borrow_mut().outbox.push((self.self_id, Delivery::Unicast(dst, bytes.to_vec())));
    }

    fn send_broadcast(&mut self, bytes: &[u8]) {
        self.medium.borrow_mut().outbox.push((self.self_id, Delivery::Broadcast(bytes.to_vec())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicast_out_of_range_is_not_delivered() {
        let medium = Medium::new(10.0);
        medium.borrow_mut().register_peer(1, Vector3::ZERO);
        medium.borrow_mut().register_peer(2, Vector3::new(20.0, 0.0, 0.0));

        let mut t1 = SimTransport::new(1, medium.clone());
        t1.send_unicast(2, &[1, 2, 3]);

        let mut received = Vec::new();
        medium.borrow_mut().drain(|id, bytes| received.push((id, bytes.to_vec())));
        assert!(received.is_empty());
    }

    #[test]
    fn unicast_in_range_is_delivered_to_exactly_the_target() {
        let medium = Medium::new(10.0);
        medium.borrow_mut().register_peer(1, Vector3::ZERO);
        medium.borrow_mut().register_peer(2, Vector3::new(5.0, 0.0, 0.0));
        medium.borrow_mut().register_peer(3, Vector3::new(5.0, 0.0, 0.0));

        let mut t1 = SimTransport::new(1, medium.clone());
        t1.send_unicast(2, &[9]);

        let mut received = Vec::new();
        medium.borrow_mut().drain(|id, bytes| received.push((id, bytes.to_vec())));
        assert_eq!(received, vec![(2, vec![9])]);
    }

    #[test]
    fn broadcast_reaches_every_in_range_peer_except_sender() {
        let medium = Medium::new(10.0);
        medium.borrow_mut().register_peer(1, Vector3::ZERO);
        medium.borrow_mut().register_peer(2, Vector3::new(5.0, 0.0, 0.0));
        medium.borrow_mut().register_peer(3, Vector3::new(50.0, 0.0, 0.0));

        let mut t1 = SimTransport::new(1, medium.clone());
        t1.send_broadcast(&[7]);

        let mut received: Vec<NodeId> = Vec::new();
        medium.borrow_mut().drain(|id, _| received.push(id));
        assert_eq!(received, vec![2]);
    }

    #[test]
    fn moving_a_peer_out_of_range_changes_subsequent_delivery() {
        let medium = Medium::new(10.0);
        medium.borrow_mut().register_peer(1, Vector3::ZERO);
        medium.borrow_mut().register_peer(2, Vector3::new(5.0, 0.0, 0.0));

        let mut t1 = SimTransport::new(1, medium.clone());
        t1.send_unicast(2, &[1]);
        let mut received = Vec::new();
        medium.borrow_mut().drain(|id, b| received.push((id, b.to_vec())));
        assert_eq!(received.len(), 1);

        medium.borrow_mut().update_position(2, Vector3::new(500.0, 0.0, 0.0));
        t1.send_unicast(2, &[2]);
        let mut received2 = Vec::new();
        medium.borrow_mut().drain(|id, b| received2.push((id, b.to_vec())));
        assert!(received2.is_empty());
    }
}
