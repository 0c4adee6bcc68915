mod common;

use std::time::{Duration, SystemTime};

use common::{TestDir, header, split_response, status_line};
use webd::http::request::HttpVersion;
use webd::http::response::{Response, StatusCode};
use webd::http::writer::ResponseWriter;

fn epoch_plus(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

#[tokio::test]
async fn test_head_layout() {
    let response = Response::error(HttpVersion::new(1, 0), StatusCode::NotFound, "File not found");
    let mut writer = ResponseWriter::with_date(response, true, epoch_plus(0));

    let mut out = Vec::new();
    let sent = writer.write_to_stream(&mut out).await.unwrap();

    let expected = "HTTP/1.0 404 Not Found\r\n\
                    Date: Thu, 01 Jan 1970 00:00:00 GMT\r\n\
                    Connection: close\r\n\
                    Content-Type: text/plain\r\n\
                    Content-Length: 14\r\n\
                    \r\n\
                    File not found";
    assert_eq!(String::from_utf8(out).unwrap(), expected);
    assert_eq!(sent, 14);
}

#[tokio::test]
async fn test_body_suppressed() {
    let response = Response::error(HttpVersion::HTTP_1_1, StatusCode::BadRequest, "nope");
    let mut writer = ResponseWriter::new(response, false);

    let mut out = Vec::new();
    let sent = writer.write_to_stream(&mut out).await.unwrap();
    let (head, body) = split_response(&out);

    assert_eq!(sent, 0);
    assert_eq!(status_line(&head), "HTTP/1.1 400 Bad Request");
    assert_eq!(header(&head, "Content-Length"), Some("4"));
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_file_body_is_streamed() {
    let dir = TestDir::new("writer");
    let contents: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
    let path = dir.write("blob.bin", &contents);

    let file = tokio::fs::File::open(&path).await.unwrap();
    let response = Response::file(
        HttpVersion::HTTP_1_1,
        file,
        contents.len() as u64,
        "application/octet-stream",
        None,
    );
    let mut writer = ResponseWriter::new(response, true);

    let mut out = Vec::new();
    let sent = writer.write_to_stream(&mut out).await.unwrap();
    let (head, body) = split_response(&out);

    assert_eq!(sent, contents.len() as u64);
    assert_eq!(header(&head, "Content-Type"), Some("application/octet-stream"));
    assert_eq!(body, contents);
}

#[tokio::test]
async fn test_short_file_is_an_error() {
    let dir = TestDir::new("writer");
    let path = dir.write("short.txt", b"abc");

    let file = tokio::fs::File::open(&path).await.unwrap();
    let response = Response::file(HttpVersion::HTTP_1_1, file, 10, "text/plain", None);
    let mut writer = ResponseWriter::new(response, true);

    let mut out = Vec::new();
    assert!(writer.write_to_stream(&mut out).await.is_err());
}

#[tokio::test]
async fn test_content_encoding_header() {
    let dir = TestDir::new("writer");
    let path = dir.write("a.css", b"xyz");

    let file = tokio::fs::File::open(&path).await.unwrap();
    let response = Response::file(HttpVersion::HTTP_1_1, file, 3, "text/css", Some("deflate"));
    let writer = ResponseWriter::new(response, true);

    let head = String::from_utf8(writer.head().to_vec()).unwrap();
    assert_eq!(header(&head, "Content-Encoding"), Some("deflate"));
    assert_eq!(header(&head, "Content-Length"), Some("3"));
}
