//! HTTP/1.1 request encoding

use anyhow::{anyhow, bail, Context, Result};
use majin_core::Target;
use url::Url;

/// A request ready to be written to a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRequest {
    /// `host:port` to connect to
    pub addr: String,
    pub bytes: Vec<u8>,
}

/// Encode `target` as an HTTP/1.1 request
///
/// Header keys are written exactly as given. `Host`, `User-Agent`,
/// `Content-Length` and `Connection: close` are added unless the target
/// already carries them.
pub fn encode_request(target: &Target) -> Result<EncodedRequest> {
    let url = Url::parse(&target.url)
        .with_context(|| format!("Invalid target URL: {}", target.url))?;
    if url.scheme() != "http" {
        bail!("Unsupported scheme '{}': only http targets are supported", url.scheme());
    }
    let host = url.host_str().ok_or_else(|| anyhow!("Target URL has no host: {}", target.url))?;
    let port = url.port_or_known_default().unwrap_or(80);

    let method = target.method.as_str();
    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_graphic()) {
        bail!("Invalid HTTP method: '{}'", method);
    }

    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }

    let has = |name: &str| target.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name));

    let mut head = format!("{method} {path} HTTP/1.1\r\n");
    if !has("host") {
        match url.port() {
            Some(p) => head.push_str(&format!("Host: {host}:{p}\r\n")),
            None => head.push_str(&format!("Host: {host}\r\n")),
        }
    }
    if !has("user-agent") {
        head.push_str(concat!("User-Agent: majin/", env!("CARGO_PKG_VERSION"), "\r\n"));
    }
    for (key, value) in target.headers.iter() {
        if key.bytes().any(|b| b == b'\r' || b == b'\n' || b == b':') || key.is_empty() {
            bail!("Invalid header name: {:?}", key);
        }
        if value.bytes().any(|b| b == b'\r' || b == b'\n') {
            bail!("Invalid value for header {}: {:?}", key, value);
        }
        head.push_str(&format!("{key}: {value}\r\n"));
    }
    if let Some(body) = &target.body {
        if !has("content-length") {
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
    }
    if !has("connection") {
        head.push_str("Connection: close\r\n");
    }
    head.push_str("\r\n");

    let mut bytes = head.into_bytes();
    if let Some(body) = &target.body {
        bytes.extend_from_slice(body);
    }

    Ok(EncodedRequest { addr: format!("{host}:{port}"), bytes })
}
