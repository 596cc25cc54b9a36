use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rstest::rstest;
use soh_acquisition::error::AcqError;
use soh_acquisition::{
    FieldMap, ThingSpeakParams, ThingSpeakSource, decode_response, parse_feed,
};
use soh_traits::RawSample;

#[rstest]
fn parses_string_fields() {
    let body = r#"{"created_at":"2026-01-01T00:00:00Z","entry_id":42,
        "field1":"3.71","field2":"-1.25","field3":"24.5"}"#;
    let e = parse_feed(body, &FieldMap::default()).unwrap();
    assert_eq!(e.entry_id, Some(42));
    assert_eq!(e.sample, RawSample::new(3.71, -1.25, 24.5));
}

#[rstest]
fn honours_custom_field_mapping_and_numbers() {
    let fields = FieldMap {
        voltage: "field4".into(),
        current: "field5".into(),
        temperature: "field6".into(),
    };
    let body = r#"{"field4":3.6,"field5":-0.5,"field6":" 30 "}"#;
    let e = parse_feed(body, &fields).unwrap();
    assert_eq!(e.entry_id, None);
    assert_eq!(e.sample, RawSample::new(3.6, -0.5, 30.0));
}

#[rstest]
#[case(r#"{"field1":"3.7","field2":"-1.0"}"#, "field3")]
#[case(r#"{"field1":"3.7","field2":null,"field3":"25"}"#, "field2")]
#[case(r#"{"field1":"","field2":"-1.0","field3":"25"}"#, "field1")]
fn missing_or_empty_fields_are_incomplete(#[case] body: &str, #[case] field: &str) {
    match parse_feed(body, &FieldMap::default()) {
        Err(AcqError::Incomplete(name)) => assert_eq!(name, field),
        other => panic!("expected Incomplete({field}), got {other:?}"),
    }
}

#[rstest]
#[case("-1")]
#[case("not json")]
#[case(r#"{"field1":"3.7v","field2":"-1.0","field3":"25"}"#)]
#[case(r#"{"field1":[1],"field2":"-1.0","field3":"25"}"#)]
fn garbage_is_a_parse_error(#[case] body: &str) {
    assert!(matches!(
        parse_feed(body, &FieldMap::default()),
        Err(AcqError::Parse(_))
    ));
}

#[rstest]
fn non_finite_text_passes_through_for_the_core_to_reject() {
    let body = r#"{"field1":"NaN","field2":"-1.0","field3":"25"}"#;
    let e = parse_feed(body, &FieldMap::default()).unwrap();
    assert!(e.sample.voltage.is_nan());
}

#[rstest]
#[case(404)]
#[case(500)]
#[case(301)]
fn non_success_status_is_http_error(#[case] status: u16) {
    let body = r#"{"field1":"3.7","field2":"-1.0","field3":"25"}"#;
    match decode_response(status, body, &FieldMap::default()) {
        Err(AcqError::Http(code)) => assert_eq!(code, status),
        other => panic!("expected Http({status}), got {other:?}"),
    }
}

#[rstest]
fn success_status_decodes_body() {
    let body = r#"{"field1":"3.7","field2":"-1.0","field3":"25"}"#;
    let e = decode_response(200, body, &FieldMap::default()).unwrap();
    assert_eq!(e.sample, RawSample::new(3.7, -1.0, 25.0));
}

/// Serve one canned HTTP response on a local port; yields the request line.
fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 2 {
            line.clear();
        }
        write!(
            stream,
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        request_line
    });
    (format!("http://{addr}"), handle)
}

fn source_for(base_url: String, key: &str) -> ThingSpeakSource {
    ThingSpeakSource::new(ThingSpeakParams {
        base_url,
        channel_id: "42".into(),
        read_api_key: key.into(),
        timeout: Duration::from_secs(5),
        fields: FieldMap::default(),
    })
    .unwrap()
}

#[rstest]
fn fetch_reports_http_status() {
    let (url, server) = serve_once("404 Not Found", "-1");
    let err = source_for(url, "KEY").fetch().unwrap_err();
    assert!(matches!(err, AcqError::Http(404)), "{err:?}");
    server.join().unwrap();
}

#[rstest]
fn fetch_encodes_api_key_in_query() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"entry_id":7,"field1":"3.70","field2":"-1.10","field3":"24.0"}"#,
    );
    let entry = source_for(url, "a&b=c").fetch().unwrap();
    assert_eq!(entry.entry_id, Some(7));
    let request_line = server.join().unwrap();
    assert!(
        request_line.starts_with("GET /channels/42/feeds/last.json?api_key=a%26b%3Dc "),
        "{request_line}"
    );
}
