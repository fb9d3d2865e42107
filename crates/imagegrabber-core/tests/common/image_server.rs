//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves fixed bodies per path, can answer the first N requests to a path
//! with 500, and counts GETs per path so tests can assert that no request was
//! made.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Route {
    body: Vec<u8>,
    /// Number of leading requests answered with 500.
    fail_first: u32,
}

#[derive(Default)]
struct State {
    routes: HashMap<String, Route>,
    hits: HashMap<String, u32>,
}

/// Handle to a running test server. The server lives until the process exits.
#[derive(Clone)]
pub struct ImageServer {
    base: String,
    state: Arc<Mutex<State>>,
}

impl ImageServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(State::default()));
        let server_state = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&server_state);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    /// Absolute URL for `path` (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn serve(&self, path: &str, body: impl Into<Vec<u8>>) -> &Self {
        self.serve_flaky(path, body, 0)
    }

    /// Serve `body` at `path`, but answer the first `fail_first` requests with 500.
    pub fn serve_flaky(&self, path: &str, body: impl Into<Vec<u8>>, fail_first: u32) -> &Self {
        self.state.lock().unwrap().routes.insert(
            path.to_string(),
            Route {
                body: body.into(),
                fail_first,
            },
        );
        self
    }

    /// Number of requests received for `path` so far.
    pub fn hits(&self, path: &str) -> u32 {
        self.state.lock().unwrap().hits.get(path).copied().unwrap_or(0)
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let (status, body) = {
        let mut state = state.lock().unwrap();
        let hit = {
            let h = state.hits.entry(path.clone()).or_insert(0);
            *h += 1;
            *h
        };
        match state.routes.get(&path) {
            Some(route) if hit <= route.fail_first => {
                ("500 Internal Server Error", b"boom".to_vec())
            }
            Some(route) => ("200 OK", route.body.clone()),
            None => ("404 Not Found", b"not found".to_vec()),
        }
    };

    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}
