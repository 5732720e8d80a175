//! Minimal HTTP/1.1 server standing in for the icon site in integration tests.
//!
//! Serves a fixed set of paths, each with a status and body. Counts requests
//! per path and tracks how many requests were in flight at once.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Route {
    status: u16,
    body: Vec<u8>,
}

/// Routes to serve. Unknown paths get 404.
#[derive(Debug, Clone, Default)]
pub struct Site {
    routes: HashMap<String, Route>,
    /// Sleep before answering `.zip` requests.
    archive_delay: Duration,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, path: &str, html: &str) -> Self {
        self.route(path, 200, html.as_bytes().to_vec())
    }

    pub fn file(self, path: &str, body: Vec<u8>) -> Self {
        self.route(path, 200, body)
    }

    pub fn route(mut self, path: &str, status: u16, body: Vec<u8>) -> Self {
        self.routes.insert(path.to_string(), Route { status, body });
        self
    }

    pub fn archive_delay(mut self, delay: Duration) -> Self {
        self.archive_delay = delay;
        self
    }

    /// Starts serving in a background thread until the process exits.
    pub fn start(self) -> SiteServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let site = Arc::new(self);
        let stats = Arc::new(Stats::default());
        let server_stats = Arc::clone(&stats);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let site = Arc::clone(&site);
                let stats = Arc::clone(&server_stats);
                thread::spawn(move || handle(stream, &site, &stats));
            }
        });
        SiteServer {
            base_url: format!("http://127.0.0.1:{}", port),
            stats,
        }
    }
}

#[derive(Debug, Default)]
struct Stats {
    hits: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak_archives_in_flight: AtomicUsize,
}

/// Handle to a running [`Site`].
pub struct SiteServer {
    base_url: String,
    stats: Arc<Stats>,
}

impl SiteServer {
    /// Base URL without a trailing slash, e.g. `http://127.0.0.1:12345`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn hits(&self, path: &str) -> usize {
        self.stats.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Total requests for paths ending in `.zip`.
    pub fn archive_hits(&self) -> usize {
        self.stats
            .hits
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.ends_with(".zip"))
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn peak_archives_in_flight(&self) -> usize {
        self.stats.peak_archives_in_flight.load(Ordering::SeqCst)
    }
}

fn handle(mut stream: std::net::TcpStream, site: &Site, stats: &Stats) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let Some(path) = request_path(request) else {
        let _ = stream.write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    };

    *stats.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

    let is_archive = path.ends_with(".zip");
    if is_archive {
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.peak_archives_in_flight.fetch_max(now, Ordering::SeqCst);
        thread::sleep(site.archive_delay);
    }

    let (status, body) = match site.routes.get(&path) {
        Some(route) => (route.status, route.body.as_slice()),
        None => (404, &b"not found"[..]),
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: {}\r\nConnection: close\r\n\r\n",
        status,
        reason(status),
        body.len(),
        if is_archive { "application/zip" } else { "text/html" },
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();

    if is_archive {
        stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Path of a `GET <path> HTTP/1.1` request line, without any query string.
fn request_path(request: &str) -> Option<String> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    if !method.eq_ignore_ascii_case("GET") {
        return None;
    }
    let target = parts.next()?;
    Some(target.split('?').next().unwrap_or(target).to_string())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
