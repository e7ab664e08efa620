use bytes::Bytes;

use crate::http::request::{Method, Request};

/// Upper bound on the request line plus headers.
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Default upper bound on a Content-Length body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidHeader,
    InvalidContentLength,
    HeadersTooLarge,
    /// Declared Content-Length exceeds the configured limit.
    BodyTooLarge,
    /// Transfer-Encoding bodies are not accepted from clients.
    UnsupportedTransferEncoding,
    Incomplete,
}

/// Parses one request using the default body limit.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    parse_http_request_with_limit(buf, MAX_BODY_BYTES)
}

/// Parses one request from the front of `buf`.
///
/// A declared body larger than `max_body` fails with `BodyTooLarge` as soon
/// as the headers are complete, before any of the body is buffered.
pub fn parse_http_request_with_limit(
    buf: &[u8],
    max_body: usize,
) -> Result<(Request, usize), ParseError> {
    // Look for header/body separator
    let headers_end = match find_headers_end(buf) {
        Some(end) => end,
        None if buf.len() > MAX_HEADER_BYTES => return Err(ParseError::HeadersTooLarge),
        None => return Err(ParseError::Incomplete),
    };
    if headers_end > MAX_HEADER_BYTES {
        return Err(ParseError::HeadersTooLarge);
    }

    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let mut lines = header_bytes.split(|&b| b == b'\n').map(|line| {
        line.strip_suffix(b"\r").unwrap_or(line)
    });

    // Request line
    let request_line = lines
        .next()
        .and_then(|line| std::str::from_utf8(line).ok())
        .ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    if parts.next().is_some() || !version.starts_with("HTTP/1.") {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;

    // Headers: names are ASCII, values may carry obs-text
    let mut headers = Vec::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or(ParseError::InvalidHeader)?;
        let (key, value) = (&line[..colon], &line[colon + 1..]);

        if !key.is_ascii() {
            return Err(ParseError::InvalidHeader);
        }
        let key = String::from_utf8_lossy(key);
        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::InvalidHeader);
        }

        let value = String::from_utf8_lossy(value);
        headers.push((key.to_string(), value.trim().to_string()));
    }

    if headers
        .iter()
        .any(|(k, _)| k.eq_ignore_ascii_case("Transfer-Encoding"))
    {
        return Err(ParseError::UnsupportedTransferEncoding);
    }

    // Body
    let content_length = content_length(&headers)?.unwrap_or(0);
    if content_length > max_body {
        return Err(ParseError::BodyTooLarge);
    }

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let body = Bytes::copy_from_slice(&body_bytes[..content_length]);

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body,
    };

    let total_consumed = headers_end + 4 + content_length;
    Ok((request, total_consumed))
}

/// Reads the Content-Length header. Repeated headers must agree.
fn content_length(headers: &[(String, String)]) -> Result<Option<usize>, ParseError> {
    let mut length = None;
    for (_, value) in headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
    {
        let parsed = value
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidContentLength)?;
        if length.is_some_and(|l| l != parsed) {
            return Err(ParseError::InvalidContentLength);
        }
        length = Some(parsed);
    }
    Ok(length)
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET /api/ HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.path, "/api/");
        assert_eq!(parsed.header("host"), Some("example.com"));
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn pipelined_requests_consume_only_the_first() {
        let req = b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.path, "/a");
        let (second, _) = parse_http_request(&req[consumed..]).unwrap();
        assert_eq!(second.path, "/b");
    }

    #[test]
    fn body_limit_checked_before_body_arrives() {
        let req = b"POST /api/upload HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello";

        assert_eq!(parse_http_request_with_limit(req, 10).unwrap_err(), ParseError::BodyTooLarge);
        assert_eq!(parse_http_request_with_limit(req, 11).unwrap_err(), ParseError::Incomplete);
    }

    #[test]
    fn conflicting_content_lengths_rejected() {
        let req = b"POST /a HTTP/1.1\r\nContent-Length: 1\r\nContent-Length: 2\r\n\r\nab";

        assert_eq!(parse_http_request(req).unwrap_err(), ParseError::InvalidContentLength);
    }
}
