//! Workload simulation
//!
//! A workload is a small set of shape parameters ([`WorkloadSpec`]) that the
//! [`WorkloadSimulator`] turns into one target rate per second: a cosine
//! seasonal curve, a linear trend, half-normal noise and random bursts.

pub mod random;
pub mod simulator;
pub mod spec;
pub mod state;

pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use simulator::{RateSeries, WorkloadSimulator, ATTACK_NAME, TICK};
pub use spec::WorkloadSpec;
pub use state::{SimulationState, TickRate};
