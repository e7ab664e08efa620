use waypoint::http::parser::{
    MAX_HEADER_BYTES, ParseError, parse_http_request, parse_http_request_with_limit,
};
use waypoint::http::request::Method;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.path, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.header("Host"), Some("example.com"));
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_post_request_with_body() {
    let req = b"POST /api/items HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.path, "/api/items");
    assert_eq!(parsed.body, b"hello".to_vec());
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_lowercase_content_length() {
    let req = b"POST /api/x HTTP/1.1\r\ncontent-length: 3\r\n\r\nabc";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body, b"abc".to_vec());
}

#[test]
fn test_parse_multiple_headers_keep_order() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\nAccept: text/html\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.headers.len(), 3);
    assert_eq!(parsed.headers[1], ("Accept".to_string(), "*/*".to_string()));
    assert_eq!(parsed.headers[2], ("Accept".to_string(), "text/html".to_string()));
}

#[test]
fn test_parse_request_target_keeps_query_string() {
    let req = b"GET /api/v1/items/7?active=true HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, "/api/v1/items/7?active=true");
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    assert_eq!(parse_http_request(req).err(), Some(ParseError::Incomplete));
}

#[test]
fn test_parse_incomplete_request_partial_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello";
    assert_eq!(parse_http_request(req).err(), Some(ParseError::Incomplete));
}

#[test]
fn test_parse_invalid_http_method() {
    let req = b"GE(T / HTTP/1.1\r\n\r\n";
    assert_eq!(parse_http_request(req).err(), Some(ParseError::InvalidMethod));
}

#[test]
fn test_parse_invalid_version() {
    let req = b"GET / SPDY/3\r\n\r\n";
    assert_eq!(parse_http_request(req).err(), Some(ParseError::InvalidRequest));
}

#[test]
fn test_parse_malformed_header() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n";
    assert_eq!(parse_http_request(req).err(), Some(ParseError::InvalidHeader));
}

#[test]
fn test_parse_invalid_content_length() {
    let req = b"POST / HTTP/1.1\r\nContent-Length: ten\r\n\r\n";
    assert_eq!(parse_http_request(req).err(), Some(ParseError::InvalidContentLength));
}

#[test]
fn test_parse_rejects_chunked_body() {
    let req = b"POST /api/x HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
    assert_eq!(
        parse_http_request(req).err(),
        Some(ParseError::UnsupportedTransferEncoding)
    );
}

#[test]
fn test_parse_headers_too_large() {
    let mut req = b"GET / HTTP/1.1\r\nX-Big: ".to_vec();
    req.extend(std::iter::repeat_n(b'a', MAX_HEADER_BYTES + 1));
    assert_eq!(parse_http_request(&req).err(), Some(ParseError::HeadersTooLarge));
}

#[test]
fn test_parse_various_http_methods() {
    let methods = vec![
        ("GET", Method::GET),
        ("POST", Method::POST),
        ("PUT", Method::PUT),
        ("DELETE", Method::DELETE),
        ("HEAD", Method::HEAD),
        ("OPTIONS", Method::OPTIONS),
        ("PATCH", Method::PATCH),
        ("PROPFIND", Method::Other("PROPFIND".to_string())),
        ("CONNECT", Method::Other("CONNECT".to_string())),
    ];

    for (method_str, expected_method) in methods {
        let req = format!("{} /api/ HTTP/1.1\r\n\r\n", method_str);
        let (parsed, _) = parse_http_request(req.as_bytes()).unwrap();
        assert_eq!(parsed.method, expected_method);
        assert_eq!(parsed.method.as_str(), method_str);
    }
}

#[test]
fn test_parse_request_with_binary_body() {
    let req = b"POST /upload HTTP/1.1\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body, vec![0u8, 1, 2, 3]);
}

#[test]
fn test_parse_extension_method_is_accepted() {
    let req = b"PROPFIND /api/dav HTTP/1.1\r\nDepth: 1\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method.as_str(), "PROPFIND");
    assert_eq!(parsed.header("depth"), Some("1"));
}

#[test]
fn test_parse_obs_text_header_value() {
    let req = b"GET /api/x HTTP/1.1\r\nX-Name: caf\xe9\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(consumed, req.len());
    assert!(parsed.header("x-name").is_some_and(|v| v.starts_with("caf")));
    assert_eq!(parsed.header("host"), Some("example.com"));
}

#[test]
fn test_parse_non_ascii_header_name_rejected() {
    let req = b"GET / HTTP/1.1\r\nX-N\xe9: 1\r\n\r\n";
    assert_eq!(parse_http_request(req).err(), Some(ParseError::InvalidHeader));
}

#[test]
fn test_parse_body_over_limit() {
    let req = b"POST /api/upload HTTP/1.1\r\nContent-Length: 1048577\r\n\r\n";
    assert_eq!(
        parse_http_request_with_limit(req, 1024 * 1024).err(),
        Some(ParseError::BodyTooLarge)
    );

    let req = b"POST /api/upload HTTP/1.1\r\nContent-Length: 99999999999\r\n\r\n";
    assert_eq!(parse_http_request(req).err(), Some(ParseError::BodyTooLarge));
}
