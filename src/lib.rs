//! Core protocol and control stack for a drone swarm: periodic position/ack exchange
//! with reachability inference, multi-hop flood-based hop counting, neighbor fan-out,
//! and a distributed potential-field controller. See `SPEC_FULL.md` for the full design.

pub mod base_agent;
pub mod comm;
pub mod config;
pub mod controller;
pub mod core_proto;
pub mod drone_agent;
pub mod error;
pub mod flood;
pub mod mobility;
pub mod neighbor;
pub mod network;
pub mod sim;
pub mod vector3;

pub use base_agent::BaseAgent;
pub use config::SwarmConfig;
pub use controller::{Controller, ControllerParams};
pub use drone_agent::DroneAgent;
pub use error::SwarmError;
pub use network::{NodeId, Packet, BASE_ID, BROADCAST_ID};
