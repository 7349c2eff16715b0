//! Paced HTTP attacker

use crate::request::{encode_request, EncodedRequest};
use crate::response::parse_head;
use anyhow::{anyhow, Context, Result};
use majin_core::{AttackResult, AttackResults, Attacker, Rate, Targeter};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Bytes of a response kept for parsing its head
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Attacker configuration
#[derive(Debug, Clone)]
pub struct HttpAttackerConfig {
    /// Upper bound on a single hit, from connect to the last response byte
    pub timeout: Duration,
}

impl Default for HttpAttackerConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30) }
    }
}

/// Attacker that fires HTTP/1.1 requests at a fixed pace
///
/// Hit `i` of an attack is sent at `start + i * rate.interval()`, each in its
/// own task, so a slow response never delays the hits after it.
#[derive(Debug, Clone, Default)]
pub struct HttpAttacker {
    config: HttpAttackerConfig,
}

impl HttpAttacker {
    pub fn new(config: HttpAttackerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HttpAttackerConfig {
        &self.config
    }
}

impl Attacker for HttpAttacker {
    fn attack(
        &self,
        targeter: Arc<dyn Targeter>,
        rate: Rate,
        duration: Duration,
        name: &str,
    ) -> AttackResults {
        let (tx, rx) = mpsc::unbounded_channel();

        let hits = rate.hits_in(duration);
        if hits == 0 {
            debug!(attack = name, freq = rate.freq, "No hits to send");
            return rx;
        }

        let interval = rate.interval();
        let timeout = self.config.timeout;
        let name = name.to_string();

        tokio::spawn(async move {
            let start = Instant::now();
            for seq in 0..hits {
                let offset = Duration::from_nanos((interval.as_nanos() * seq as u128) as u64);
                tokio::time::sleep_until(start + offset).await;

                let tx = tx.clone();
                let targeter = Arc::clone(&targeter);
                let name = name.clone();
                tokio::spawn(async move {
                    let result = hit(targeter.as_ref(), seq, name, timeout).await;
                    // The drain side may already be gone
                    let _ = tx.send(result);
                });
            }
        });

        rx
    }
}

/// Outcome of one request/response exchange
struct Exchange {
    code: u16,
    bytes_out: u64,
    bytes_in: u64,
}

async fn hit(targeter: &dyn Targeter, seq: u64, name: String, timeout: Duration) -> AttackResult {
    let mut result = AttackResult { attack: name, seq, ..Default::default() };
    let started = Instant::now();

    let outcome = match targeter.next_target() {
        Ok(target) => match encode_request(&target) {
            Ok(request) => tokio::time::timeout(timeout, exchange(&request))
                .await
                .unwrap_or_else(|_| Err(anyhow!("request timed out after {:?}", timeout))),
            Err(e) => Err(e),
        },
        Err(e) => Err(e.into()),
    };

    result.latency = started.elapsed();
    match outcome {
        Ok(exchange) => {
            result.code = exchange.code;
            result.bytes_out = exchange.bytes_out;
            result.bytes_in = exchange.bytes_in;
        }
        Err(e) => {
            trace!(seq, error = %e, "Hit failed");
            result.error = Some(format!("{e:#}"));
        }
    }
    result
}

async fn exchange(request: &EncodedRequest) -> Result<Exchange> {
    let mut stream = TcpStream::connect(&request.addr)
        .await
        .with_context(|| format!("connect to {}", request.addr))?;
    stream.set_nodelay(true)?;
    stream.write_all(&request.bytes).await.context("write request")?;

    let mut head_buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 8192];
    let mut bytes_in = 0usize;
    let mut head = None;

    loop {
        let n = stream.read(&mut chunk).await.context("read response")?;
        if n == 0 {
            break;
        }
        bytes_in += n;

        if head.is_none() {
            let room = MAX_HEAD_BYTES.saturating_sub(head_buf.len());
            head_buf.extend_from_slice(&chunk[..n.min(room)]);
            head = parse_head(&head_buf)?;
            if head.is_none() && head_buf.len() >= MAX_HEAD_BYTES {
                return Err(anyhow!("response head exceeds {} bytes", MAX_HEAD_BYTES));
            }
        }

        if let Some(total) = head.and_then(|h| h.total_len()) {
            if bytes_in >= total {
                break;
            }
        }
    }

    let head = head.ok_or_else(|| anyhow!("connection closed before a complete response"))?;
    Ok(Exchange {
        code: head.code,
        bytes_out: request.bytes.len() as u64,
        bytes_in: bytes_in as u64,
    })
}
