//! Configuration for majin runs
//!
//! Every setting comes from, in order of precedence: a command-line flag (or
//! its environment variable), the TOML profile given with `--profile`, and
//! finally the built-in default.

use anyhow::{bail, Context, Result};
use clap::Args;
use majin_core::{Headers, Target, WorkloadSpec};
use majin_http::HttpAttackerConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Target used when neither a flag nor the profile names one
pub const DEFAULT_TARGET: &str = "http://localhost:8080";

/// Top-level profile configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Master seed for reproducible runs (None = wall clock)
    pub seed: Option<u64>,
    /// Treat workload values as upper bounds and draw a new workload per run
    pub random: bool,
    pub workload: WorkloadSpec,
    pub target: TargetConfig,
    pub attacker: AttackerConfig,
}

/// Request sent by every hit
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    pub url: String,
    pub method: String,
    /// Header name (case-sensitive) to one value or a list of values
    pub headers: BTreeMap<String, HeaderValues>,
    pub body: Option<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_TARGET.to_string(),
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

/// HTTP attacker settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttackerConfig {
    /// Per-hit timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for AttackerConfig {
    fn default() -> Self {
        Self { timeout: HttpAttackerConfig::default().timeout }
    }
}

impl ProfileConfig {
    /// Load profile from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse profile: {}", path.display()))
    }

    /// Load the profile named by `path`, or the defaults when there is none
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Profile and seed selection
#[derive(Debug, Clone, Default, Args)]
pub struct ProfileArgs {
    /// Path to a TOML profile; flags override its values
    #[arg(short = 'P', long, env = "PROFILE")]
    pub profile: Option<PathBuf>,

    /// Master seed for reproducible noise, bursts and random workloads
    #[arg(long, env = "SEED")]
    pub seed: Option<u64>,
}

/// Workload shape flags
#[derive(Debug, Clone, Default, Args)]
pub struct WorkloadArgs {
    /// The base queries per second to use for attack [default: 1]
    #[arg(long = "base-load", env = "BASE_LOAD", allow_negative_numbers = true)]
    pub base_load: Option<f64>,

    /// The duration of each period in the simulated timeseries, in seconds [default: 60]
    #[arg(long, env = "PERIOD", allow_negative_numbers = true)]
    pub period: Option<f64>,

    /// Duration of the attack in seconds; 0 means run forever [default: 0]
    #[arg(long, env = "DURATION", allow_negative_numbers = true)]
    pub duration: Option<f64>,

    /// Per-second increase of the rate (decrease when negative) [default: 0]
    #[arg(long, env = "TREND", allow_negative_numbers = true)]
    pub trend: Option<f64>,

    /// The noise factor for the timeseries [default: 0]
    #[arg(long, env = "NOISE", allow_negative_numbers = true)]
    pub noise: Option<f64>,

    /// Frequency of bursts: one in this many seconds [default: 0]
    #[arg(long = "burst-frequency", env = "BURST_FREQUENCY", allow_negative_numbers = true)]
    pub burst_frequency: Option<f64>,

    /// Rate multiplier during bursts [default: 1]
    #[arg(long = "burst-index", env = "BURST_INDEX", allow_negative_numbers = true)]
    pub burst_index: Option<f64>,

    /// The duration of a burst in seconds [default: 30]
    #[arg(long = "burst-duration", env = "BURST_DURATION", allow_negative_numbers = true)]
    pub burst_duration: Option<f64>,
}

impl WorkloadArgs {
    /// Apply every flag that was given on top of `base`
    pub fn apply(&self, base: WorkloadSpec) -> WorkloadSpec {
        WorkloadSpec {
            load: self.base_load.unwrap_or(base.load),
            trend: self.trend.unwrap_or(base.trend),
            period: self.period.unwrap_or(base.period),
            noise: self.noise.unwrap_or(base.noise),
            burst_frequency: self.burst_frequency.unwrap_or(base.burst_frequency),
            burst_index: self.burst_index.unwrap_or(base.burst_index),
            burst_duration: self.burst_duration.unwrap_or(base.burst_duration),
            duration: self.duration.unwrap_or(base.duration),
        }
    }
}

/// Request and attacker flags
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// The target URL to attack [default: http://localhost:8080]
    #[arg(long, env = "TARGET")]
    pub target: Option<String>,

    /// The HTTP method to use [default: GET]
    #[arg(long, env = "METHOD")]
    pub method: Option<String>,

    /// HTTP header as 'Key: Value' (repeatable, keys are case-sensitive)
    #[arg(long = "header", env = "HEADER", value_name = "KEY: VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// The body to send with each request
    #[arg(long, env = "BODY")]
    pub body: Option<String>,

    /// Per-request timeout (e.g. 30s, 500ms) [default: 30s]
    #[arg(long, env = "TIMEOUT", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}

impl TargetArgs {
    /// Build the request target from the profile and the flags
    pub fn target(&self, profile: &TargetConfig) -> Target {
        let mut headers = Headers::new();
        for (key, values) in &profile.headers {
            match values {
                HeaderValues::One(value) => headers.set(key.clone(), value.clone()),
                HeaderValues::Many(values) => {
                    for value in values {
                        headers.append(key.clone(), value.clone());
                    }
                }
            }
        }
        for (key, value) in &self.headers {
            headers.set(key.clone(), value.clone());
        }

        let url = self.target.clone().unwrap_or_else(|| profile.url.clone());
        let method = self.method.clone().unwrap_or_else(|| profile.method.clone());
        let mut target = Target::new(method, url).with_headers(headers);

        if let Some(body) = self.body.as_ref().or(profile.body.as_ref()) {
            if !body.is_empty() {
                target = target.with_body(body.clone());
            }
        }
        target
    }

    pub fn attacker(&self, profile: &AttackerConfig) -> HttpAttackerConfig {
        HttpAttackerConfig { timeout: self.timeout.unwrap_or(profile.timeout) }
    }
}

/// Parse a `Key: Value` header flag
///
/// Splits on the first colon and trims both halves; an empty key or value
/// is rejected.
pub fn parse_header(value: &str) -> std::result::Result<(String, String), String> {
    let (key, val) = value
        .split_once(':')
        .ok_or_else(|| format!("header '{value}' has a wrong format"))?;
    let (key, val) = (key.trim(), val.trim());
    if key.is_empty() || val.is_empty() {
        return Err(format!("header '{value}' has a wrong format"));
    }
    Ok((key.to_string(), val.to_string()))
}

/// Everything needed to start an attack
#[derive(Debug, Clone)]
pub struct AttackPlan {
    /// The workload to run, or the upper bounds in random mode
    pub spec: WorkloadSpec,
    pub random: bool,
    pub seed: Option<u64>,
    pub target: Target,
    pub attacker: HttpAttackerConfig,
}

impl AttackPlan {
    /// Merge profile and flags, then check the result
    pub fn resolve(
        profile: ProfileConfig,
        profile_args: &ProfileArgs,
        workload: &WorkloadArgs,
        target: &TargetArgs,
        random: bool,
    ) -> Result<Self> {
        let spec = workload.apply(profile.workload);
        spec.validate()?;

        let plan = Self {
            spec,
            random: random || profile.random,
            seed: profile_args.seed.or(profile.seed),
            target: target.target(&profile.target),
            attacker: target.attacker(&profile.attacker),
        };

        majin_http::encode_request(&plan.target)
            .with_context(|| format!("Invalid target {} {}", plan.target.method, plan.target.url))?;
        if plan.attacker.timeout.is_zero() {
            bail!("Attacker timeout must be greater than zero");
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Content-Type: application/json").unwrap(),
            ("Content-Type".to_string(), "application/json".to_string())
        );
        assert_eq!(
            parse_header("X-Url:  http://a:b ").unwrap(),
            ("X-Url".to_string(), "http://a:b".to_string())
        );
    }

    #[test]
    fn test_parse_header_rejects_malformed() {
        for bad in ["NoColon", ": value", "Key:", "  :  ", ""] {
            let err = parse_header(bad).unwrap_err();
            assert_eq!(err, format!("header '{bad}' has a wrong format"));
        }
    }

    #[test]
    fn test_workload_args_override() {
        let args = WorkloadArgs { base_load: Some(50.0), trend: Some(-1.0), ..Default::default() };
        let spec = args.apply(WorkloadSpec::default());

        assert_eq!(spec.load, 50.0);
        assert_eq!(spec.trend, -1.0);
        assert_eq!(spec.period, 60.0);
        assert_eq!(spec.burst_index, 1.0);
    }

    #[test]
    fn test_flag_headers_replace_profile_headers() {
        let mut profile = TargetConfig::default();
        profile.headers.insert("X-Key".to_string(), HeaderValues::One("profile".to_string()));
        profile.headers.insert(
            "Accept".to_string(),
            HeaderValues::Many(vec!["a".to_string(), "b".to_string()]),
        );

        let args = TargetArgs {
            headers: vec![
                ("X-Key".to_string(), "first".to_string()),
                ("X-Key".to_string(), "last".to_string()),
            ],
            ..Default::default()
        };
        let target = args.target(&profile);

        assert_eq!(target.url, DEFAULT_TARGET);
        assert_eq!(target.method, "GET");
        assert_eq!(target.headers.get("X-Key"), Some(&["last".to_string()][..]));
        assert_eq!(target.headers.get("Accept").map(|v| v.len()), Some(2));
        assert_eq!(target.body, None);
    }

    #[test]
    fn test_empty_body_is_no_body() {
        let args = TargetArgs { body: Some(String::new()), ..Default::default() };
        assert_eq!(args.target(&TargetConfig::default()).body, None);
    }

    #[test]
    fn test_resolve_rejects_invalid_workload() {
        let workload = WorkloadArgs { noise: Some(-1.0), ..Default::default() };
        let result = AttackPlan::resolve(
            ProfileConfig::default(),
            &ProfileArgs::default(),
            &workload,
            &TargetArgs::default(),
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_rejects_invalid_target() {
        let target = TargetArgs { target: Some("ftp://example.com".to_string()), ..Default::default() };
        let result = AttackPlan::resolve(
            ProfileConfig::default(),
            &ProfileArgs::default(),
            &WorkloadArgs::default(),
            &target,
            false,
        );
        assert!(result.is_err());
    }
}
