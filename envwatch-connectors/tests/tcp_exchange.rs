//! End-to-end exchanges against a real TCP server thread

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use envwatch_connectors::{
    legacy_status, telemetry_client, HostLink, HttpClient, HttpConfig, TcpTransport, Transport,
};
use envwatch_core::{
    time::FixedTime, ApiError, DeviceConfig, Metric, Monitor, MonitorSettings, MonitorState,
    NetworkLink, SensorError, SensorReading, SensorSource, SoundLevel, TelemetryApi,
    sensors::NoIndicators,
};

const SETTINGS: &str = r#"{"max_temp":26,"min_temp":18,"max_humidity":70,"min_humidity":20,"max_sound":500,"temp_interval":60,"humidity_interval":60}"#;

/// One request as the server saw it
#[derive(Debug)]
struct Seen {
    request_line: String,
    headers: Vec<String>,
    body: String,
}

/// Serve one canned response per connection, closing after each
fn serve(responses: Vec<String>) -> (u16, mpsc::Receiver<Seen>, thread::JoinHandle<()>) {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        for response in responses {
            let (socket, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(socket);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut headers = Vec::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    break;
                }
                if let Some(len) = line.strip_prefix("Content-Length: ") {
                    content_length = len.parse().unwrap();
                }
                headers.push(line);
            }

            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();

            let mut socket = reader.into_inner();
            socket.write_all(response.as_bytes()).unwrap();

            tx.send(Seen {
                request_line: request_line.trim_end().to_string(),
                headers,
                body: String::from_utf8(body).unwrap(),
            })
            .unwrap();
        }
    });

    (port, rx, handle)
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Read the request head off `socket`, ignoring it
fn skip_request(socket: &std::net::TcpStream) {
    let mut reader = BufReader::new(socket);
    let mut line = String::new();
    while reader.read_line(&mut line).unwrap() > 0 {
        if line == "\r\n" {
            break;
        }
        line.clear();
    }
}

fn ok(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn config(port: u16) -> DeviceConfig {
    DeviceConfig::new("host-network", "")
        .with_server("127.0.0.1", port)
        .with_device_id("123456789")
        .with_retry(1, 0)
}

struct HotRoom;

impl SensorSource for HotRoom {
    fn read_climate(&mut self) -> Result<SensorReading, SensorError> {
        Ok(SensorReading::new(30.0, 40.0))
    }

    fn read_sound(&mut self) -> Result<SoundLevel, SensorError> {
        Ok(SoundLevel(120))
    }
}

#[test]
fn settings_fetch_over_tcp() {
    let (port, seen, server) = serve(vec![ok(SETTINGS)]);
    let mut client = telemetry_client(&config(port)).unwrap();
    client.link().begin(&envwatch_core::WifiCredentials::new("host-network", ""));

    let thresholds = client.fetch_settings().unwrap();
    server.join().unwrap();

    assert_eq!(thresholds.max_temp, 26.0);
    assert_eq!(thresholds.min_temp, 18.0);
    assert_eq!(thresholds.max_humidity, 70.0);
    assert_eq!(thresholds.min_humidity, 20.0);
    assert_eq!(thresholds.max_sound, 500.0);
    assert_eq!(thresholds.temp_interval, 60.0);
    assert_eq!(thresholds.humidity_interval, 60.0);

    let request = seen.recv().unwrap();
    assert_eq!(request.request_line, "GET /api/settings/123456789 HTTP/1.1");
    assert!(request.headers.contains(&"Host: 127.0.0.1".to_string()));
    assert!(request.headers.contains(&"Connection: close".to_string()));
    assert!(request.body.is_empty());
}

#[test]
fn hot_room_end_to_end() {
    let (port, seen, server) = serve(vec![ok(SETTINGS), ok("")]);
    let config = config(port);
    let client = telemetry_client(&config).unwrap();
    let mut monitor = Monitor::new(
        HotRoom,
        client,
        NoIndicators,
        FixedTime::new(0),
        MonitorSettings::from(&config),
    );

    monitor.initialize().unwrap();
    assert_eq!(monitor.state(), MonitorState::Running);

    let report = monitor.tick().unwrap();
    server.join().unwrap();

    assert_eq!(report.reports.len(), 1);
    assert_eq!(report.reports[0].metric, Metric::Temperature);
    assert_eq!(report.reports[0].result, Ok(200));

    let _settings = seen.recv().unwrap();
    let post = seen.recv().unwrap();
    assert_eq!(post.request_line, "POST /api/temperature/123456789 HTTP/1.1");
    assert!(post.headers.contains(&"Content-Type: application/json".to_string()));
    assert!(post.headers.contains(&"Content-Length: 18".to_string()));
    assert_eq!(post.body, r#"{"temperature":30}"#);

    // server closed after each answer, so each request dialled anew
    assert_eq!(monitor.api().http().stats().connections_opened, 2);
}

#[test]
fn non_success_status_is_an_error() {
    let (port, _seen, server) = serve(vec![
        "HTTP/1.1 404 Not Found\r\nConnection: close\r\n\r\n".to_string(),
    ]);
    let mut client = telemetry_client(&config(port)).unwrap();
    client.link().begin(&envwatch_core::WifiCredentials::new("host-network", ""));

    let result = client.fetch_settings();
    server.join().unwrap();

    assert_eq!(result, Err(ApiError::Status { status: 404 }));
}

#[test]
fn settings_with_wrong_shape_rejected() {
    let (port, _seen, server) = serve(vec![ok(r#"{"max_temp":"hot"}"#)]);
    let mut client = telemetry_client(&config(port)).unwrap();
    client.link().begin(&envwatch_core::WifiCredentials::new("host-network", ""));

    let result = client.fetch_settings();
    server.join().unwrap();

    assert_eq!(result, Err(ApiError::Settings));
}

#[test]
fn nobody_listening_is_a_connect_error() {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = telemetry_client(&config(port)).unwrap();
    let mut http = client.into_inner();
    http.link_mut().begin(&envwatch_core::WifiCredentials::new("host-network", ""));

    let result = http.get("/api/settings/123456789");

    assert_eq!(result, Err(ApiError::Connect));
    assert_eq!(legacy_status(&result), -1);
}

#[test]
fn late_body_never_reaches_the_next_request() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut slow, _) = listener.accept().unwrap();
        skip_request(&slow);
        slow.write_all(b"HTTP/1.1 200 OK\r\n\r\n").unwrap();
        thread::sleep(Duration::from_millis(400));
        // the client may have hung up already
        let _ = slow.write_all(br#"{"max_temp":26}"#);
        drop(slow);

        let (mut fresh, _) = listener.accept().unwrap();
        skip_request(&fresh);
        fresh.write_all(ok(r#"{"ok":true}"#).as_bytes()).unwrap();
    });

    let mut link = HostLink::new("127.0.0.1", port);
    link.begin(&envwatch_core::WifiCredentials::new("host-network", ""));
    let mut http = HttpClient::new(
        TcpTransport::new().read_timeout(Duration::from_millis(150)),
        link,
        HttpConfig::new("127.0.0.1", port),
    );

    let first = http.get("/api/settings/123456789").unwrap();
    assert_eq!(first.status, 200);
    assert!(!http.transport().is_connected());

    let second = http.get("/api/settings/123456789").unwrap();
    server.join().unwrap();

    assert_eq!(second.payload, serde_json::json!({ "ok": true }));
    assert_eq!(http.stats().connections_opened, 2);
}
