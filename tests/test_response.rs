use webd::http::request::HttpVersion;
use webd::http::response::{Body, Response, ResponseBuilder, StatusCode};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::MethodNotAllowed.reason_phrase(),
        "Method Not Allowed"
    );
    assert_eq!(
        StatusCode::InternalServerError.reason_phrase(),
        "Internal Server Error"
    );
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(body.clone())
        .build();

    assert_eq!(response.header("Content-Length"), Some(body.len().to_string().as_str()));
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    // Should keep the custom value
    assert_eq!(response.header("Content-Length"), Some("999"));
}

#[test]
fn test_response_builder_keeps_header_order_and_replaces() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .header("X-Custom", "one")
        .header("x-custom", "two")
        .build();

    let names: Vec<&str> = response.headers.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, vec!["Content-Type", "X-Custom", "Content-Length"]);
    assert_eq!(response.header("X-Custom"), Some("two"));
}

#[test]
fn test_response_builder_version() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .version(HttpVersion::HTTP_1_0)
        .build();

    assert_eq!(response.version, HttpVersion::HTTP_1_0);
}

#[test]
fn test_response_builder_empty_body() {
    let response = ResponseBuilder::new(StatusCode::Ok).build();

    assert!(response.body.is_empty());
    assert_eq!(response.header("Content-Length"), Some("0"));
}

#[test]
fn test_error_response() {
    let response = Response::error(HttpVersion::HTTP_1_1, StatusCode::NotFound, "File not found");

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(response.header("Content-Length"), Some("14"));
    assert!(response.header("Allow").is_none());
    assert!(matches!(&response.body, Body::Bytes(b) if b == b"File not found"));
}

#[test]
fn test_method_not_allowed_carries_allow() {
    let response = Response::error(
        HttpVersion::HTTP_1_1,
        StatusCode::MethodNotAllowed,
        "Method not allowed",
    );

    assert_eq!(response.header("Allow"), Some("GET, POST, HEAD, OPTIONS"));
}

#[test]
fn test_options_response() {
    let response = Response::options(HttpVersion::new(1, 0));

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.version, HttpVersion::new(1, 0));
    assert_eq!(response.header("Allow"), Some("GET, POST, HEAD, OPTIONS"));
    assert!(response.header("Content-Type").is_none());
    assert!(response.body.is_empty());
}
