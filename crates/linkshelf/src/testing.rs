//! Test doubles shared by unit tests.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::ai::{AiServiceError, CompletionClient};
use crate::error::FetchError;
use crate::fetch::ContentFetcher;

/// Minimal HTTP/1.1 server answering every request with one canned response.
pub struct StubServer {
    addr: SocketAddr,
    requests: Receiver<String>,
}

impl StubServer {
    pub fn respond(status: u16, content_type: &str, body: &str) -> Self {
        Self::start(Duration::ZERO, status, content_type, body.as_bytes())
    }

    /// Answers with a body that need not be UTF-8.
    pub fn respond_bytes(status: u16, content_type: &str, body: &[u8]) -> Self {
        Self::start(Duration::ZERO, status, content_type, body)
    }

    /// Waits `delay` after reading each request before answering.
    pub fn delayed(delay: Duration, status: u16, content_type: &str, body: &str) -> Self {
        Self::start(delay, status, content_type, body.as_bytes())
    }

    fn start(delay: Duration, status: u16, content_type: &str, body: &[u8]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, requests) = mpsc::channel();
        let mut response = format!(
            "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n",
            status,
            content_type,
            body.len(),
        )
        .into_bytes();
        response.extend_from_slice(body);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let request = read_request(&stream);
                if tx.send(request).is_err() {
                    break;
                }
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                let _ = stream.write_all(&response);
                let _ = stream.flush();
            }
        });

        Self { addr, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// The next request received, head and body, as text.
    pub fn captured_request(&self) -> Option<String> {
        self.requests.recv_timeout(Duration::from_secs(5)).ok()
    }
}

fn read_request(stream: &TcpStream) -> String {
    let mut reader = BufReader::new(stream);
    let mut request = String::new();
    let mut content_length = 0usize;

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return request,
            Ok(_) => {}
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
        let end_of_head = line == "\r\n";
        request.push_str(&line);
        if end_of_head {
            break;
        }
    }

    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_ok() {
        request.push_str(&String::from_utf8_lossy(&body));
    }
    request
}

/// Fetcher returning fixed HTML or a timeout.
pub enum StaticFetcher {
    Html(String),
    Timeout(String),
}

impl ContentFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match self {
            StaticFetcher::Html(html) => Ok(html.clone()),
            StaticFetcher::Timeout(message) => Err(FetchError::Timeout {
                url: url.to_string(),
                message: message.clone(),
            }),
        }
    }
}

/// Completion client answering by prompt kind. Records every user message.
pub struct ScriptedCompletion {
    pub summary: Result<String, AiServiceError>,
    pub tags: Result<String, AiServiceError>,
    pub inputs: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(summary: &str, tags: &str) -> Self {
        Self::with_results(Ok(summary.to_string()), Ok(tags.to_string()))
    }

    pub fn with_results(
        summary: Result<String, AiServiceError>,
        tags: Result<String, AiServiceError>,
    ) -> Self {
        Self {
            summary,
            tags,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

impl CompletionClient for ScriptedCompletion {
    fn complete(&self, system: &str, user: &str) -> Result<String, AiServiceError> {
        self.inputs.lock().unwrap().push(user.to_string());
        if system.contains("tags") {
            self.tags.clone()
        } else {
            self.summary.clone()
        }
    }
}
