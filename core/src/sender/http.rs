//! sender/http.rs
//! reqwest-backed transports.
//!
//! - `BeaconTransport`: queue a JSON POST for a background worker and return.
//! - `PixelTransport`: queue a GET with the payload in `?data=`.
//! - `SyncPostTransport`: blocking POST, status < 400 is success. Used as the
//!   fallback.
//!
//! Beacon and pixel share one `river-http` worker thread per transport; its
//! results are only logged, like a browser beacon.

use std::thread;
use std::time::Duration;

use crossbeam::channel::{unbounded, Sender};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::debug;

use crate::sender::transport::{pixel_url, Transport};
use crate::types::TransportError;

fn build_client(timeout: Duration) -> Result<Client, TransportError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TransportError::Request(e.to_string()))
}

enum Job {
    Post { url: String, body: Vec<u8> },
    Get { url: String },
}

/// Fire-and-forget request worker.
struct HttpWorker {
    tx: Sender<Job>,
}

impl HttpWorker {
    fn spawn(timeout: Duration) -> Result<Self, TransportError> {
        let client = build_client(timeout)?;
        let (tx, rx) = unbounded::<Job>();

        thread::Builder::new()
            .name("river-http".into())
            .spawn(move || {
                for job in rx {
                    let (method, url, result) = match job {
                        Job::Post { url, body } => {
                            let r = client.post(&url).header(CONTENT_TYPE, "application/json").body(body).send();
                            ("POST", url, r)
                        }
                        Job::Get { url } => {
                            let r = client.get(&url).send();
                            ("GET", url, r)
                        }
                    };
                    match result {
                        Ok(resp) => debug!(target: "river::sender", method, %url, status = resp.status().as_u16(), "background request done"),
                        Err(e) => debug!(target: "river::sender", method, %url, error = %e, "background request failed"),
                    }
                }
            })
            .map_err(|e| TransportError::Request(format!("cannot spawn http worker: {e}")))?;

        Ok(Self { tx })
    }

    fn submit(&self, job: Job) -> Result<(), TransportError> {
        self.tx
            .send(job)
            .map_err(|_| TransportError::Request("http worker has stopped".into()))
    }
}

pub struct BeaconTransport {
    worker: HttpWorker,
    max_bytes: usize,
}

impl BeaconTransport {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, TransportError> {
        Ok(Self { worker: HttpWorker::spawn(timeout)?, max_bytes })
    }
}

impl Transport for BeaconTransport {
    fn name(&self) -> &'static str {
        "beacon"
    }

    fn send(&self, url: &str, payload: &Value) -> Result<(), TransportError> {
        let body = serde_json::to_vec(payload)?;
        if body.len() > self.max_bytes {
            return Err(TransportError::PayloadTooLarge { have: body.len(), max: self.max_bytes });
        }
        self.worker.submit(Job::Post { url: url.to_string(), body })
    }
}

pub struct PixelTransport {
    worker: HttpWorker,
    max_chars: usize,
}

impl PixelTransport {
    pub fn new(timeout: Duration, max_chars: usize) -> Result<Self, TransportError> {
        Ok(Self { worker: HttpWorker::spawn(timeout)?, max_chars })
    }
}

impl Transport for PixelTransport {
    fn name(&self) -> &'static str {
        "image"
    }

    fn send(&self, url: &str, payload: &Value) -> Result<(), TransportError> {
        let url = pixel_url(url, payload, self.max_chars)?;
        self.worker.submit(Job::Get { url })
    }
}

pub struct SyncPostTransport {
    client: Client,
}

impl SyncPostTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self { client: build_client(timeout)? })
    }
}

impl Transport for SyncPostTransport {
    fn name(&self) -> &'static str {
        "sync-post"
    }

    fn send(&self, url: &str, payload: &Value) -> Result<(), TransportError> {
        let resp = self
            .client
            .post(url)
            .json(payload)
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        if status >= 400 {
            return Err(TransportError::Status(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// One-shot HTTP server answering `status`; returns the URL and the raw request.
    fn serve_once(status: u16) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/collect", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).unwrap();
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let len = text
                        .lines()
                        .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + len || n == 0 {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!("HTTP/1.1 {status} X\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });

        (url, handle)
    }

    #[test]
    fn sync_post_sends_json_and_accepts_2xx() {
        let (url, server) = serve_once(204);
        let transport = SyncPostTransport::new(Duration::from_secs(5)).unwrap();

        transport.send(&url, &json!({ "type": "error" })).unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /collect"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"type":"error"}"#));
    }

    #[test]
    fn sync_post_treats_4xx_as_failure() {
        let (url, server) = serve_once(413);
        let transport = SyncPostTransport::new(Duration::from_secs(5)).unwrap();

        let err = transport.send(&url, &json!({})).unwrap_err();
        assert!(matches!(err, TransportError::Status(413)));
        server.join().unwrap();
    }

    #[test]
    fn beacon_rejects_oversized_body_before_queueing() {
        let transport = BeaconTransport::new(Duration::from_secs(1), 8).unwrap();
        let err = transport.send("http://127.0.0.1:9/x", &json!({ "blob": "0123456789" })).unwrap_err();
        assert!(matches!(err, TransportError::PayloadTooLarge { max: 8, .. }));
    }

    #[test]
    fn pixel_rejects_oversized_payload() {
        let transport = PixelTransport::new(Duration::from_secs(1), 10).unwrap();
        let err = transport.send("http://127.0.0.1:9/p.gif", &json!({ "blob": "0123456789" })).unwrap_err();
        assert!(matches!(err, TransportError::PayloadTooLarge { .. }));
    }
}
