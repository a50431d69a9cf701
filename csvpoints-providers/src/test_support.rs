//! Local HTTP server returning canned responses.
//!
//! [`CannedServer`] binds an ephemeral loopback port and answers every
//! request with the same status and JSON body, recording what it received.
//! Point a geocoder at it with
//! [`HttpGeocoderConfig::with_base_url`](crate::HttpGeocoderConfig::with_base_url).

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// One request seen by a [`CannedServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Request target: path plus query string.
    pub target: String,
    /// `User-Agent` header, if sent.
    pub user_agent: Option<String>,
}

/// Loopback HTTP server replying with a fixed response.
#[derive(Debug)]
pub struct CannedServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: u16,
    body: String,
    delay: Duration,
}

impl CannedServer {
    /// Serve `body` with `status` to every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the loopback listener cannot be bound.
    pub fn start(status: u16, body: impl Into<String>) -> io::Result<Self> {
        Self::spawn(CannedResponse {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        })
    }

    /// Serve an empty JSON array after waiting `delay`.
    ///
    /// # Errors
    ///
    /// Returns an error if the loopback listener cannot be bound.
    pub fn stalling(delay: Duration) -> io::Result<Self> {
        Self::spawn(CannedResponse {
            status: 200,
            body: "[]".to_owned(),
            delay,
        })
    }

    fn spawn(response: CannedResponse) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        thread::Builder::new()
            .name("canned-http".to_owned())
            .spawn(move || {
                for stream in listener.incoming().flatten() {
                    let response = response.clone();
                    let recorded = Arc::clone(&recorded);
                    // A connection-level failure only affects that request.
                    drop(thread::spawn(move || {
                        drop(serve(stream, &response, &recorded));
                    }));
                }
            })?;
        Ok(Self { addr, requests })
    }

    /// URL of `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn serve(
    stream: TcpStream,
    response: &CannedResponse,
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let target = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_owned();

    let mut user_agent = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':')
            && name.trim().eq_ignore_ascii_case("user-agent")
        {
            user_agent = Some(value.trim().to_owned());
        }
    }
    recorded
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedRequest { target, user_agent });

    if !response.delay.is_zero() {
        thread::sleep(response.delay);
    }
    let mut writer = stream;
    write!(
        writer,
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        reason(response.status),
        response.body.len(),
        response.body
    )?;
    writer.flush()
}

const fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
