//! Minimal HTTP stub server for publisher tests.
//!
//! Accepts connections on `127.0.0.1`, captures each request and answers with
//! a fixed status and body. A silent variant accepts and never answers, and a
//! stalled variant sends headers plus part of the body, then goes quiet.

#![allow(dead_code)]

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// A request as seen by the stub.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    /// Lower-cased header names.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

pub struct StubServer {
    pub base_url: String,
    requests: mpsc::UnboundedReceiver<CapturedRequest>,
}

impl StubServer {
    /// Starts a stub answering every request with `status reason` and `body`.
    pub async fn respond_with(status: u16, reason: &'static str, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind stub listener");
        let addr = listener.local_addr().expect("should have local addr");
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    handle(stream, tx, status, reason, body).await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests: rx,
        }
    }

    /// Starts a stub that accepts connections and never responds.
    pub async fn silent() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind stub listener");
        let addr = listener.local_addr().expect("should have local addr");
        let (_tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    drop(stream);
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests: rx,
        }
    }

    /// Starts a stub that sends `status reason` headers announcing a
    /// 100-byte body, writes only part of it and then stalls.
    pub async fn stalled_body(status: u16, reason: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind stub listener");
        let addr = listener.local_addr().expect("should have local addr");
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(request) = read_request(&mut stream).await {
                        let _ = tx.send(request);
                    }
                    let head = format!(
                        "HTTP/1.1 {status} {reason}\r\ncontent-type: text/plain\r\ncontent-length: 100\r\n\r\npartial"
                    );
                    let _ = stream.write_all(head.as_bytes()).await;
                    let _ = stream.flush().await;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    drop(stream);
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests: rx,
        }
    }

    /// Waits up to five seconds for the next captured request.
    pub async fn next_request(&mut self) -> Option<CapturedRequest> {
        tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .ok()
            .flatten()
    }

    /// Returns a request if one was already captured.
    pub fn try_next_request(&mut self) -> Option<CapturedRequest> {
        self.requests.try_recv().ok()
    }
}

/// Returns a base URL nothing is listening on.
pub async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind listener");
    let addr = listener.local_addr().expect("should have local addr");
    drop(listener);
    format!("http://{addr}")
}

async fn handle(
    mut stream: TcpStream,
    tx: mpsc::UnboundedSender<CapturedRequest>,
    status: u16,
    reason: &str,
    body: &str,
) {
    if let Some(request) = read_request(&mut stream).await {
        let _ = tx.send(request);
    }

    let response = format!(
        "HTTP/1.1 {status} {reason}\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_owned();
    let path = request_line.next()?.to_owned();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_owned()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let end = (header_end + content_length).min(buf.len());
    Some(CapturedRequest {
        method,
        path,
        headers,
        body: buf[header_end..end].to_vec(),
    })
}
