//! Random workloads
//!
//! In random mode every numeric workload parameter is an upper bound. Each
//! run draws a fresh workload below those bounds, runs it to completion, and
//! starts over, forever.

use majin_core::seed::{components, derive_seed, run_seed, time_seed};
use majin_core::{Attacker, Targeter, WorkloadSimulator, WorkloadSpec};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{info, warn};

/// Uniform whole number in `[0, trunc(bound))`
///
/// A zero bound yields zero, as does any bound that truncates below one.
pub fn random_below<R: Rng + ?Sized>(bound: f64, rng: &mut R) -> f64 {
    let upper = bound as i64;
    if bound == 0.0 || upper < 1 {
        return 0.0;
    }
    rng.random_range(0..upper) as f64
}

/// Draw one workload below `bounds`
pub fn draw_workload<R: Rng + ?Sized>(bounds: &WorkloadSpec, rng: &mut R) -> WorkloadSpec {
    WorkloadSpec {
        load: random_below(bounds.load, rng),
        trend: random_below(bounds.trend, rng),
        period: random_below(bounds.period, rng),
        noise: random_below(bounds.noise, rng),
        burst_index: random_below(bounds.burst_index, rng),
        burst_frequency: random_below(bounds.burst_frequency, rng),
        burst_duration: random_below(bounds.burst_duration, rng),
        duration: random_below(bounds.duration, rng),
    }
}

/// Seed for the `run`-th random workload
///
/// Derived from the master seed when one is given, otherwise read from the
/// wall clock for every run.
pub fn seed_for_run(master: Option<u64>, run: u64) -> u64 {
    match master {
        Some(master) => run_seed(master, run),
        None => time_seed(),
    }
}

/// Draw and run random workloads until the process is stopped
pub async fn run_forever(
    bounds: WorkloadSpec,
    master_seed: Option<u64>,
    attacker: Arc<dyn Attacker>,
    targeter: Arc<dyn Targeter>,
) {
    if !bounds.is_bounded() {
        warn!("Random mode with duration 0: every drawn workload runs forever");
    }

    for run in 0u64.. {
        let seed = seed_for_run(master_seed, run);
        let mut rng = SmallRng::seed_from_u64(derive_seed(seed, components::PARAMETERS));
        let spec = draw_workload(&bounds, &mut rng);

        info!(run, seed, "Performing the following attack with parameters: {:?}", spec);
        WorkloadSimulator::with_seed(spec, seed)
            .run(Arc::clone(&attacker), Arc::clone(&targeter))
            .await;
    }
}
