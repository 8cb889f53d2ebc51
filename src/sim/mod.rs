//! Reference single-threaded simulation harness (`SPEC_FULL.md` §5/§6): a discrete-event
//! scheduler plus a shared-medium transport. Neither is part of the core's contract — an
//! embedder may swap in its own scheduler/transport as long as it honors the same
//! `schedule_at`/`Transport` shapes.

mod scheduler;
mod transport;

pub use scheduler::{Scheduler, SimTime};
pub use transport::{Medium, SimTransport};
