//! HTTP client for the occupancy data source.
//!
//! Failures are returned to the caller as `FetchFailed`; the watch loop keeps
//! showing the previous snapshot and retries on its next refresh.

use std::io::Read;
use std::time::Duration;

use occupancy_core::config::SourceConfig;
use occupancy_core::{OccupancyError, OccupancySource, Result};
use occupancy_protocol::{
    parse_events_page, parse_status, EventsPage, StatusSnapshot, EVENTS_PATH, MAX_RESPONSE_BYTES,
    STATUS_PATH,
};
use serde_json::Value;
use tracing::debug;

pub struct HttpSource {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.agent.get(&url);
        for (key, value) in query {
            request = request.query(key, value);
        }

        debug!(url = %url, "Fetching");
        let response = request.call().map_err(|err| OccupancyError::FetchFailed {
            target: url.clone(),
            details: err.to_string(),
        })?;

        let reader = response.into_reader().take(MAX_RESPONSE_BYTES as u64);
        serde_json::from_reader(reader).map_err(|source| OccupancyError::Json {
            context: format!("decoding {}", url),
            source,
        })
    }
}

impl OccupancySource for HttpSource {
    fn fetch_events(&self, days: u32) -> Result<EventsPage> {
        let payload = self.get_json(EVENTS_PATH, &[("days", days.to_string())])?;
        parse_events_page(payload).map_err(|info| OccupancyError::InvalidPayload {
            source_name: EVENTS_PATH.to_string(),
            details: info.to_string(),
        })
    }

    fn fetch_status(&self) -> Result<StatusSnapshot> {
        let payload = self.get_json(STATUS_PATH, &[])?;
        parse_status(payload).map_err(|info| OccupancyError::InvalidPayload {
            source_name: STATUS_PATH.to_string(),
            details: info.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occupancy_protocol::CurrentStatus;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves one canned response per connection, recording request lines.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let base_url = format!("http://{}", listener.local_addr().expect("addr"));
        let handle = thread::spawn(move || {
            let mut request_lines = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone"));
                let mut line = String::new();
                reader.read_line(&mut line).expect("request line");
                request_lines.push(line.trim().to_string());
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).expect("header");
                    if header == "\r\n" || header.is_empty() {
                        break;
                    }
                }
                let mut stream = stream;
                write!(
                    stream,
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                )
                .expect("write");
            }
            request_lines
        });
        (base_url, handle)
    }

    fn source(base_url: String) -> HttpSource {
        HttpSource::new(&SourceConfig {
            base_url,
            timeout_secs: 5,
        })
    }

    #[test]
    fn fetches_events_with_days_query() {
        let (base_url, server) = serve(vec![(
            200,
            r#"{"data":[{"id":3,"action":"enter","timestamp":"2024-02-01 01:00:00"}],"count":1,"days":14}"#,
        )]);
        let page = source(base_url).fetch_events(14).expect("page");
        assert_eq!(page.days, 14);
        assert_eq!(page.data[0].id, 3);

        let lines = server.join().expect("server");
        assert!(lines[0].starts_with("GET /api/attendance-data?days=14 "));
    }

    #[test]
    fn fetches_status() {
        let (base_url, server) = serve(vec![(
            200,
            r#"{"current_status":"exit","last_action_time":"2024-02-01 03:00:00"}"#,
        )]);
        let status = source(format!("{}/", base_url)).fetch_status().expect("status");
        assert_eq!(status.current_status, CurrentStatus::Exit);
        server.join().expect("server");
    }

    #[test]
    fn server_error_is_fetch_failure() {
        let (base_url, server) = serve(vec![(500, r#"{"detail":"boom"}"#)]);
        let err = source(base_url).fetch_status().unwrap_err();
        assert!(matches!(err, OccupancyError::FetchFailed { .. }));
        server.join().expect("server");
    }

    #[test]
    fn unreachable_source_is_fetch_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let base_url = format!("http://{}", listener.local_addr().expect("addr"));
        drop(listener);

        let err = source(base_url).fetch_events(30).unwrap_err();
        assert!(matches!(err, OccupancyError::FetchFailed { .. }));
    }

    #[test]
    fn malformed_page_is_invalid_payload() {
        let (base_url, server) = serve(vec![(200, r#"{"data":"not rows","count":2,"days":30}"#)]);
        let err = source(base_url).fetch_events(30).unwrap_err();
        assert!(matches!(err, OccupancyError::InvalidPayload { .. }));
        server.join().expect("server");
    }
}
