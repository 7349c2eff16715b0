//! HTTP response head parsing

use anyhow::{anyhow, Result};

/// Parsed status line and framing of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHead {
    pub code: u16,
    /// Bytes taken by the status line and headers
    pub header_len: usize,
    pub content_length: Option<usize>,
}

impl ResponseHead {
    /// Total response size when framed by `Content-Length`
    pub fn total_len(&self) -> Option<usize> {
        self.content_length.map(|len| self.header_len + len)
    }
}

/// Parse a response head from the bytes received so far
///
/// Returns `Ok(None)` while the head is still incomplete.
pub fn parse_head(data: &[u8]) -> Result<Option<ResponseHead>> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut response = httparse::Response::new(&mut headers);

    match response.parse(data) {
        Ok(httparse::Status::Complete(header_len)) => {
            let code = response.code.unwrap_or(0);
            if !(100..600).contains(&code) {
                return Err(anyhow!("Invalid HTTP status code: {}", code));
            }

            let content_length = response
                .headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case("content-length"))
                .and_then(|h| std::str::from_utf8(h.value).ok())
                .and_then(|v| v.trim().parse::<usize>().ok());

            Ok(Some(ResponseHead { code, header_len, content_length }))
        }
        Ok(httparse::Status::Partial) => Ok(None),
        Err(e) => Err(anyhow!("HTTP parse error: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_head() {
        let data = b"HTTP/1.1 201 Created\r\nContent-Length: 3\r\n\r\nabc";
        let head = parse_head(data).unwrap().unwrap();

        assert_eq!(head.code, 201);
        assert_eq!(head.content_length, Some(3));
        assert_eq!(head.total_len(), Some(data.len()));
    }

    #[test]
    fn test_partial_head() {
        assert_eq!(parse_head(b"HTTP/1.1 200 OK\r\nContent-Le").unwrap(), None);
    }

    #[test]
    fn test_head_without_length() {
        let head = parse_head(b"HTTP/1.0 404 Not Found\r\n\r\n").unwrap().unwrap();
        assert_eq!(head.code, 404);
        assert_eq!(head.content_length, None);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(parse_head(b"SSH-2.0-OpenSSH\r\n\r\n").is_err());
    }
}
