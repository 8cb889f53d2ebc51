//! Wires a `SwarmConfig`, a handful of `DroneAgent`s and one `BaseAgent` over the
//! bundled `sim::Scheduler`/`sim::SimTransport`, runs for a fixed simulated duration,
//! and prints a closing hop-count/mission-state line per drone.

use std::collections::HashMap;

use anyhow::Context;
use log::info;

use swarm_core::base_agent::BaseAgent;
use swarm_core::config::SwarmConfig;
use swarm_core::controller::ControllerParams;
use swarm_core::drone_agent::DroneAgent;
use swarm_core::network::{NodeId, BASE_ID};
use swarm_core::sim::{Medium, Scheduler, SimTransport};
use swarm_core::vector3::Vector3;

#[derive(Clone, Copy)]
enum Event {
    DroneTick(NodeId),
    BaseTick,
}

const SIM_DURATION_S: f64 = 20.0;
const RADIO_RANGE_M: f64 = 30.0;
const DRONE_SPACING_M: f64 = 20.0;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => {
            SwarmConfig::from_file(&path).with_context(|| format!("loading config from {path}"))?
        }
        None => SwarmConfig::default(),
    };

    let drone_ids: Vec<NodeId> = vec![1, 2, 3, 4, 5];
    let medium = Medium::new(RADIO_RANGE_M);
    medium.borrow_mut().register_peer(BASE_ID, Vector3::ZERO);

    let mut drones: HashMap<NodeId, DroneAgent<SimTransport>> = HashMap::new();
    for (i, &id) in drone_ids.iter().enumerate() {
        let pos = Vector3::new(DRONE_SPACING_M * (i as f64 + 1.0), 0.0, 0.0);
        medium.borrow_mut().register_peer(id, pos);
        let transport = SimTransport::new(id, medium.clone());
        let params = ControllerParams::from(&cfg);
        let agent = DroneAgent::new(id, Some(BASE_ID), transport, pos, params, cfg.tick_dt_s, cfg.ack_timeout_s);
        drones.insert(id, agent);
    }

    let mut base = BaseAgent::new(BASE_ID, SimTransport::new(BASE_ID, medium.clone()), Vector3::ZERO);
    for &id in &drone_ids {
        base.register_drone(id);
    }

    let mut scheduler: Scheduler<Event> = Scheduler::new();
    for &id in &drone_ids {
        scheduler.schedule_at(SwarmConfig::tick_phase(id), Event::DroneTick(id));
    }
    scheduler.schedule_at(0.0, Event::BaseTick);

    scheduler.run_until(SIM_DURATION_S, |sched, now, event| {
        match event {
            Event::DroneTick(id) => {
                if let Some(drone) = drones.get_mut(&id) {
                    drone.tick(now);
                    medium.borrow_mut().update_position(id, drone.position());
                    info!(
                        "t={now:.2} drone-{id} hops={} mission_active={}",
                        drone.hops_from_base(now),
                        drone.is_mission_active()
                    );
                }
                sched.schedule_at(now + cfg.tick_dt_s, Event::DroneTick(id));
            }
            Event::BaseTick => {
                base.tick();
                sched.schedule_at(now + cfg.base_tick_s, Event::BaseTick);
            }
        }

        let mut deliveries: Vec<(NodeId, Vec<u8>)> = Vec::new();
        medium.borrow_mut().drain(|recipient, bytes| deliveries.push((recipient, bytes.to_vec())));
        for (recipient, bytes) in deliveries {
            if recipient == BASE_ID {
                base.on_inbound(&bytes);
            } else if let Some(drone) = drones.get_mut(&recipient) {
                drone.on_inbound(&bytes, now);
            }
        }
    });

    for &id in &drone_ids {
        if let Some(drone) = drones.get(&id) {
            println!(
                "drone-{id}: hops={} mission_active={} position={:?}",
                drone.hops_from_base(SIM_DURATION_S),
                drone.is_mission_active(),
                drone.position()
            );
        }
    }

    Ok(())
}
