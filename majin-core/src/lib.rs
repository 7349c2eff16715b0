//! Majin Core Library
//!
//! This crate provides the workload simulation engine for the majin load
//! generator: the shape parameters of a workload, the discrete-time rate
//! generator, and the tick loop that hands each second's rate to an attacker.

pub mod attack;
pub mod error;
pub mod seed;
pub mod stats;
pub mod workload;

pub use attack::{
    AttackResult, AttackResults, Attacker, Headers, Rate, StaticTargeter, Target, Targeter,
};
pub use error::{Error, Result};
pub use workload::{
    RandomSource, RateSeries, ScriptedRandom, SeededRandom, SimulationState, TickRate,
    WorkloadSimulator, WorkloadSpec, ATTACK_NAME, TICK,
};
