//! Best-effort per-tick attack metrics
//!
//! Each tick drains its own result stream into an [`AttackMetrics`]; nothing
//! is aggregated across ticks.

use crate::attack::AttackResult;
use std::collections::BTreeMap;
use std::time::Duration;

/// Maximum number of distinct error messages kept per tick
const MAX_ERRORS: usize = 8;

/// Accumulator for the results of one attack
#[derive(Debug, Default)]
pub struct AttackMetrics {
    requests: u64,
    successes: u64,
    total_latency: Duration,
    max_latency: Duration,
    bytes_in: u64,
    bytes_out: u64,
    status_codes: BTreeMap<u16, u64>,
    errors: Vec<String>,
}

/// Summary of one attack
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub requests: u64,
    /// Fraction of hits that succeeded (0.0 when there were none)
    pub success: f64,
    pub mean_latency: Duration,
    pub max_latency: Duration,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub errors: Vec<String>,
}

impl AttackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single hit
    pub fn add(&mut self, result: &AttackResult) {
        self.requests += 1;
        if result.is_success() {
            self.successes += 1;
        }
        self.total_latency += result.latency;
        self.max_latency = self.max_latency.max(result.latency);
        self.bytes_in += result.bytes_in;
        self.bytes_out += result.bytes_out;
        *self.status_codes.entry(result.code).or_insert(0) += 1;

        if let Some(err) = &result.error {
            if self.errors.len() < MAX_ERRORS && !self.errors.contains(err) {
                self.errors.push(err.clone());
            }
        }
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Finish accumulation and compute the summary
    pub fn close(self) -> MetricsSummary {
        let (success, mean_latency) = if self.requests > 0 {
            (
                self.successes as f64 / self.requests as f64,
                self.total_latency / self.requests as u32,
            )
        } else {
            (0.0, Duration::ZERO)
        };

        MetricsSummary {
            requests: self.requests,
            success,
            mean_latency,
            max_latency: self.max_latency,
            bytes_in: self.bytes_in,
            bytes_out: self.bytes_out,
            status_codes: self.status_codes,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(code: u16, latency_ms: u64, error: Option<&str>) -> AttackResult {
        AttackResult {
            attack: "test".to_string(),
            code,
            latency: Duration::from_millis(latency_ms),
            bytes_in: 10,
            bytes_out: 20,
            error: error.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_metrics() {
        let summary = AttackMetrics::new().close();
        assert_eq!(summary.requests, 0);
        assert_eq!(summary.success, 0.0);
        assert_eq!(summary.mean_latency, Duration::ZERO);
    }

    #[test]
    fn test_metrics_summary() {
        let mut metrics = AttackMetrics::new();
        metrics.add(&hit(200, 10, None));
        metrics.add(&hit(200, 30, None));
        metrics.add(&hit(503, 50, None));
        metrics.add(&hit(0, 20, Some("connection refused")));

        let summary = metrics.close();
        assert_eq!(summary.requests, 4);
        assert_eq!(summary.success, 0.5);
        assert_eq!(summary.mean_latency, Duration::from_millis(27) + Duration::from_micros(500));
        assert_eq!(summary.max_latency, Duration::from_millis(50));
        assert_eq!(summary.bytes_in, 40);
        assert_eq!(summary.bytes_out, 80);
        assert_eq!(summary.status_codes.get(&200), Some(&2));
        assert_eq!(summary.status_codes.get(&0), Some(&1));
        assert_eq!(summary.errors, vec!["connection refused".to_string()]);
    }

    #[test]
    fn test_errors_are_deduplicated_and_capped() {
        let mut metrics = AttackMetrics::new();
        for i in 0..20 {
            metrics.add(&hit(0, 1, Some(&format!("error {}", i % 10))));
            metrics.add(&hit(0, 1, Some("error 0")));
        }

        let summary = metrics.close();
        assert_eq!(summary.errors.len(), MAX_ERRORS);
        assert_eq!(summary.errors[0], "error 0");
    }
}
