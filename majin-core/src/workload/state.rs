//! Discrete-time simulation state and the per-tick rate formula

use super::random::RandomSource;
use super::spec::WorkloadSpec;
use std::f64::consts::PI;

/// Rate computed for one tick, with the terms it was composed from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickRate {
    pub tick: u64,
    /// Target requests per second; not clamped, so it may be zero or negative
    pub rate: i64,
    pub seasonal: f64,
    pub noise: f64,
    pub trend: f64,
    /// Multiplier applied to the rounded sum (1.0 outside bursts)
    pub burst: f64,
}

/// Mutable state of one simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    tick: u64,
    trend: f64,
    burst_active: bool,
    burst_ticks_remaining: u64,
}

impl SimulationState {
    /// Fresh state for `spec`
    ///
    /// The trend accumulator starts one step in, so tick 0 already carries
    /// `spec.trend`.
    pub fn new(spec: &WorkloadSpec) -> Self {
        Self {
            tick: 0,
            trend: spec.trend,
            burst_active: false,
            burst_ticks_remaining: 0,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    pub fn burst_active(&self) -> bool {
        self.burst_active
    }

    pub fn burst_ticks_remaining(&self) -> u64 {
        self.burst_ticks_remaining
    }

    /// Whether `spec.duration` ticks have elapsed
    ///
    /// Never true for `duration == 0` (or any duration the tick counter
    /// cannot hit exactly).
    pub fn is_complete(&self, spec: &WorkloadSpec) -> bool {
        self.tick != 0 && self.tick as f64 == spec.duration
    }

    /// Compute this tick's rate, then roll bursts and advance to the next tick
    pub fn step<R: RandomSource + ?Sized>(
        &mut self,
        spec: &WorkloadSpec,
        random: &mut R,
    ) -> TickRate {
        let noise = if spec.noise != 0.0 {
            random.normal(spec.noise, spec.noise).abs()
        } else {
            0.0
        };
        let seasonal = seasonal(spec, self.tick);
        let burst = if self.burst_active { spec.burst_index } else { 1.0 };
        let rate = ((seasonal + noise + self.trend).round() * burst) as i64;

        let computed = TickRate {
            tick: self.tick,
            rate,
            seasonal,
            noise,
            trend: self.trend,
            burst,
        };

        self.roll_burst(spec, random);
        self.trend += spec.trend;
        self.tick += 1;

        computed
    }

    /// Burst state machine
    ///
    /// A running countdown only decrements; `burst_active` is cleared solely
    /// by a failed roll once the countdown has reached zero, so a burst stays
    /// visible for `burst_duration + 1` ticks after the tick that triggered it.
    fn roll_burst<R: RandomSource + ?Sized>(&mut self, spec: &WorkloadSpec, random: &mut R) {
        if self.burst_ticks_remaining > 0 {
            self.burst_ticks_remaining -= 1;
            return;
        }

        let bound = spec.burst_frequency as i64;
        let triggered = spec.burst_frequency != 0.0
            && bound >= 1
            && random.below(bound as u64) as i64 == (spec.burst_frequency - 1.0) as i64;

        if triggered {
            self.burst_active = true;
            self.burst_ticks_remaining = spec.burst_duration as u64;
        } else {
            self.burst_active = false;
        }
    }
}

/// Seasonal term: a cosine between 1 and `load + 1`, or flat `load` without a period
fn seasonal(spec: &WorkloadSpec, tick: u64) -> f64 {
    let amplitude = spec.load / 2.0;
    if spec.period != 0.0 {
        amplitude * (PI / (spec.period * 2.0) * tick as f64).cos() + (amplitude + 1.0)
    } else {
        spec.load
    }
}
