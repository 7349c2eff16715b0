//! The tick loop
//!
//! One iteration per wall-clock second: compute the tick's rate, hand it to
//! the attacker, drain the attack's results in a detached task, sleep.

use super::random::{RandomSource, SeededRandom};
use super::spec::WorkloadSpec;
use super::state::{SimulationState, TickRate};
use crate::attack::{Attacker, Rate, Targeter};
use crate::seed::{components, derive_seed, time_seed};
use crate::stats::AttackMetrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Length of one tick, and of the attack window dispatched in it
pub const TICK: Duration = Duration::from_secs(1);

/// Label attached to every attack the simulator dispatches
pub const ATTACK_NAME: &str = "majin";

/// Drives one workload simulation
pub struct WorkloadSimulator<R: RandomSource = SeededRandom> {
    spec: WorkloadSpec,
    random: R,
}

impl WorkloadSimulator<SeededRandom> {
    /// Simulator seeded from the wall clock
    pub fn new(spec: WorkloadSpec) -> Self {
        Self::with_seed(spec, time_seed())
    }

    /// Simulator whose noise and burst draws are reproducible from `seed`
    pub fn with_seed(spec: WorkloadSpec, seed: u64) -> Self {
        Self::with_random(spec, SeededRandom::new(derive_seed(seed, components::SIMULATION)))
    }
}

impl<R: RandomSource> WorkloadSimulator<R> {
    pub fn with_random(spec: WorkloadSpec, random: R) -> Self {
        Self { spec, random }
    }

    pub fn spec(&self) -> &WorkloadSpec {
        &self.spec
    }

    /// The rate sequence this simulator would dispatch, without dispatching it
    pub fn series(self) -> RateSeries<R> {
        RateSeries {
            state: SimulationState::new(&self.spec),
            spec: self.spec,
            random: self.random,
        }
    }

    /// Run the simulation against `attacker`
    ///
    /// Returns once `duration` ticks have been dispatched; an unbounded
    /// workload never returns. Attacks are fire-and-forget: slow result
    /// streams from one tick overlap with the following ticks.
    pub async fn run(self, attacker: Arc<dyn Attacker>, targeter: Arc<dyn Targeter>) {
        let spec = self.spec;
        info!(
            load = spec.load,
            trend = spec.trend,
            period = spec.period,
            noise = spec.noise,
            burst_frequency = spec.burst_frequency,
            burst_index = spec.burst_index,
            burst_duration = spec.burst_duration,
            duration = spec.duration,
            "Starting workload simulation"
        );

        for tick in self.series() {
            info!(
                "Attacking at {} queries per second at {:.3} load, {:.3} trend and {:.3} noise and a {} burst factor",
                tick.rate, tick.seasonal, tick.trend, tick.noise, tick.burst
            );
            dispatch(&attacker, &targeter, &tick);
            tokio::time::sleep(TICK).await;
        }

        info!(ticks = spec.duration, "Workload simulation complete");
    }
}

/// Send one tick's attack and drain its results in the background
fn dispatch(attacker: &Arc<dyn Attacker>, targeter: &Arc<dyn Targeter>, tick: &TickRate) {
    if tick.rate < 0 {
        warn!(tick = tick.tick, rate = tick.rate, "Computed a negative rate");
    }

    let mut results =
        attacker.attack(Arc::clone(targeter), Rate::per_second(tick.rate), TICK, ATTACK_NAME);
    let tick_index = tick.tick;

    tokio::spawn(async move {
        let mut metrics = AttackMetrics::new();
        while let Some(result) = results.recv().await {
            metrics.add(&result);
        }

        let summary = metrics.close();
        debug!(
            tick = tick_index,
            requests = summary.requests,
            success = summary.success,
            mean_latency = ?summary.mean_latency,
            max_latency = ?summary.max_latency,
            errors = ?summary.errors,
            "Attack finished"
        );
    });
}

/// Iterator over the per-tick rates of a workload
///
/// Ends after `duration` ticks, or never for an unbounded workload.
pub struct RateSeries<R: RandomSource = SeededRandom> {
    spec: WorkloadSpec,
    state: SimulationState,
    random: R,
}

impl<R: RandomSource> RateSeries<R> {
    pub fn state(&self) -> &SimulationState {
        &self.state
    }
}

impl<R: RandomSource> Iterator for RateSeries<R> {
    type Item = TickRate;

    fn next(&mut self) -> Option<TickRate> {
        if self.state.is_complete(&self.spec) {
            return None;
        }
        Some(self.state.step(&self.spec, &mut self.random))
    }
}
