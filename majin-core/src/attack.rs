//! Attacker and targeter capabilities
//!
//! The simulator only decides *how much* load to offer each tick. Issuing the
//! requests is delegated to an [`Attacker`], and *what* to send comes from a
//! [`Targeter`]. Both are traits so the HTTP engine can be swapped for a
//! recording double in tests.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Stream of results produced by one attack
pub type AttackResults = mpsc::UnboundedReceiver<AttackResult>;

/// Request rate: `freq` hits every `per`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    /// Hits per `per`. May be zero or negative for pathological workloads.
    pub freq: i64,
    pub per: Duration,
}

impl Rate {
    /// Rate of `freq` hits per second
    pub fn per_second(freq: i64) -> Self {
        Self { freq, per: Duration::from_secs(1) }
    }

    /// Number of hits that fit in `window` at this rate
    ///
    /// Non-positive rates issue no hits.
    pub fn hits_in(&self, window: Duration) -> u64 {
        if self.freq <= 0 || self.per.is_zero() {
            return 0;
        }
        (self.freq as u128 * window.as_nanos() / self.per.as_nanos()) as u64
    }

    /// Gap between two consecutive hits
    pub fn interval(&self) -> Duration {
        if self.freq <= 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((self.per.as_nanos() / self.freq as u128) as u64)
    }
}

/// Request headers with case-sensitive keys
///
/// Keys are kept exactly as given since targets under test may treat header
/// names case-sensitively. Each key maps to one or more values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, Vec<String>>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every value of `key` with `value`
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), vec![value.into()]);
    }

    /// Append `value` to the values of `key`
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over `(key, value)` pairs, one pair per value
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key.as_str(), v.as_str())))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    /// Later pairs for the same key replace earlier ones
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (key, value) in iter {
            headers.set(key, value);
        }
        headers
    }
}

/// One outbound request description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl Target {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Producer of the request each hit sends
pub trait Targeter: Send + Sync {
    fn next_target(&self) -> Result<Target>;
}

/// Targeter that returns the same request every time
#[derive(Debug, Clone)]
pub struct StaticTargeter {
    target: Target,
}

impl StaticTargeter {
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}

impl Targeter for StaticTargeter {
    fn next_target(&self) -> Result<Target> {
        if self.target.url.is_empty() {
            return Err(Error::Target("no target URL configured".to_string()));
        }
        Ok(self.target.clone())
    }
}

/// Outcome of a single hit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttackResult {
    /// Label of the attack that produced this hit
    pub attack: String,
    /// Position of the hit within its attack
    pub seq: u64,
    /// HTTP status code, 0 when no response was received
    pub code: u16,
    pub latency: Duration,
    pub bytes_out: u64,
    pub bytes_in: u64,
    pub error: Option<String>,
}

impl AttackResult {
    /// Hit that received a 2xx/3xx response without error
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..400).contains(&self.code)
    }
}

/// Load generation engine
///
/// `attack` must return immediately: implementations spawn their own work
/// and report through the returned stream, which closes once every hit of
/// the attack has finished.
pub trait Attacker: Send + Sync {
    fn attack(
        &self,
        targeter: Arc<dyn Targeter>,
        rate: Rate,
        duration: Duration,
        name: &str,
    ) -> AttackResults;
}
