use waypoint::http::response::{Response, ResponseBuilder, StatusCode};
use waypoint::http::writer::serialize_response;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    assert_eq!(StatusCode::BadGateway.as_u16(), 502);
    assert_eq!(StatusCode::GatewayTimeout.as_u16(), 504);
    assert_eq!(StatusCode::Other(418).as_u16(), 418);
}

#[test]
fn test_status_code_from_u16_roundtrips_known_codes() {
    for code in [200, 201, 204, 400, 404, 405, 500, 501, 502, 504, 302, 503] {
        assert_eq!(StatusCode::from_u16(code).as_u16(), code);
    }
    assert_eq!(StatusCode::from_u16(502), StatusCode::BadGateway);
    assert_eq!(StatusCode::from_u16(500), StatusCode::Other(500));
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadGateway.reason_phrase(), "Bad Gateway");
    assert_eq!(StatusCode::GatewayTimeout.reason_phrase(), "Gateway Timeout");
    assert_eq!(StatusCode::Other(302).reason_phrase(), "Found");
    assert_eq!(StatusCode::Other(413).as_u16(), 413);
    assert_eq!(StatusCode::Other(599).reason_phrase(), "");
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(body.clone())
        .build();

    assert_eq!(response.header("Content-Length"), Some("16"));
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("content-length", "999")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.headers.len(), 1);
    assert_eq!(response.header("Content-Length"), Some("999"));
}

#[test]
fn test_response_builder_header_replaces() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .header("content-type", "application/json")
        .build();

    assert_eq!(response.header("Content-Type"), Some("application/json"));
    assert_eq!(response.headers.len(), 2); // 1 custom + 1 auto
}

#[test]
fn test_response_header_values_keeps_duplicates() {
    let response = Response {
        status: StatusCode::Ok,
        headers: vec![
            ("Set-Cookie".to_string(), "a=1".to_string()),
            ("set-cookie".to_string(), "b=2".to_string()),
        ],
        body: Default::default(),
    };

    let cookies: Vec<&str> = response.header_values("Set-Cookie").collect();
    assert_eq!(cookies, vec!["a=1", "b=2"]);
}

#[test]
fn test_response_builder_empty_body() {
    let response = ResponseBuilder::new(StatusCode::NoContent).build();

    assert!(response.body.is_empty());
    assert_eq!(response.header("Content-Length"), Some("0"));
}

#[test]
fn test_response_helpers() {
    let response = Response::not_found();
    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.body, b"404 Not Found".to_vec());

    let response = Response::bad_request();
    assert_eq!(response.status, StatusCode::BadRequest);
    assert_eq!(response.body, b"400 Bad Request".to_vec());

    let response = Response::plain(StatusCode::BadGateway);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(response.body, b"502 Bad Gateway".to_vec());
}

#[test]
fn test_serialize_response() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .body(b"hi".to_vec())
        .build();

    let bytes = serialize_response(&response);
    assert_eq!(
        bytes,
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nhi".to_vec()
    );
}
