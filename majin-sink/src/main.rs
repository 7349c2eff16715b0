//! Majin Sink
//!
//! A minimal HTTP/1.1 server that answers every request with `200 OK`, for
//! pointing `majin attack` at something local. Logs the number of requests
//! served each second.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nContent-Type: text/plain\r\n\r\nOK";
const CLOSE_RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\nOK";

/// Largest request head accepted
const MAX_HEAD_BYTES: usize = 64 * 1024;

#[derive(Parser, Debug)]
#[command(name = "majin-sink")]
#[command(about = "Always-200 HTTP server for local majin runs")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

/// Parsed request head
struct RequestHead {
    len: usize,
    content_length: usize,
    keep_alive: bool,
}

fn parse_request(data: &[u8]) -> Result<Option<RequestHead>> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut request = httparse::Request::new(&mut headers);

    match request.parse(data) {
        Ok(httparse::Status::Complete(len)) => {
            let header = |name: &str| {
                request
                    .headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(name))
                    .and_then(|h| std::str::from_utf8(h.value).ok())
                    .map(str::trim)
            };
            let content_length = header("content-length")
                .map(|v| v.parse::<usize>())
                .transpose()
                .map_err(|e| anyhow!("bad Content-Length: {e}"))?
                .unwrap_or(0);
            let keep_alive = match header("connection") {
                Some(v) => !v.eq_ignore_ascii_case("close"),
                None => request.version == Some(1),
            };
            Ok(Some(RequestHead { len, content_length, keep_alive }))
        }
        Ok(httparse::Status::Partial) => Ok(None),
        Err(e) => Err(anyhow!("HTTP parse error: {e}")),
    }
}

async fn handle_client(mut socket: TcpStream, served: Arc<AtomicU64>) -> Result<()> {
    let mut buffer = Vec::with_capacity(4096);
    let mut chunk = [0u8; 8192];

    loop {
        let head = loop {
            if let Some(head) = parse_request(&buffer)? {
                break head;
            }
            if buffer.len() > MAX_HEAD_BYTES {
                return Err(anyhow!("request head exceeds {MAX_HEAD_BYTES} bytes"));
            }
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            buffer.extend_from_slice(&chunk[..n]);
        };

        let total = head.len + head.content_length;
        while buffer.len() < total {
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            buffer.extend_from_slice(&chunk[..n]);
        }
        buffer.drain(..total);

        let response = if head.keep_alive { RESPONSE } else { CLOSE_RESPONSE };
        socket.write_all(response).await?;
        served.fetch_add(1, Ordering::Relaxed);

        if !head.keep_alive {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Majin sink listening on {addr}");

    let served = Arc::new(AtomicU64::new(0));
    let reporter = Arc::clone(&served);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            ticker.tick().await;
            let count = reporter.swap(0, Ordering::Relaxed);
            if count > 0 {
                info!(requests = count, "Served in the last second");
            }
        }
    });

    loop {
        let (socket, peer) = listener.accept().await?;
        debug!("Accepted connection from {peer}");

        let served = Arc::clone(&served);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, served).await {
                warn!("Error handling client {peer}: {e}");
            }
        });
    }
}
