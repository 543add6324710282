//! Shared test fixtures for the catalog mirror integration tests.
//!
//! Provides a tiny blocking HTTP server (`TestServer`) that answers every
//! request from a handler closure and records what it received, plus
//! helpers for building catalog pages and credential files.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

// ---------------------------------------------------------------------------
// TestServer
// ---------------------------------------------------------------------------

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path plus query string, exactly as sent on the request line.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// A canned reply.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    pub fn json(value: Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: value.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }

    pub fn text(body: &str) -> Self {
        Self::status(200, body)
    }
}

/// Blocking HTTP/1.1 server on `127.0.0.1:0`, one connection at a time.
///
/// The accept thread lives until the test process exits.
pub struct TestServer {
    base: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                if let Some(req) = read_request(&stream) {
                    log.lock().unwrap().push(req.clone());
                    let reply = handler(&req);
                    write_reply(stream, &reply);
                }
            }
        });

        Self { base, requests }
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose target starts with `prefix`.
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.target.starts_with(prefix))
            .collect()
    }
}

fn read_request(stream: &TcpStream) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    Some(RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn write_reply(mut stream: TcpStream, reply: &Reply) {
    let head = format!(
        "HTTP/1.1 {} Canned\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reply.status,
        reply.content_type,
        reply.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(reply.body.as_bytes());
    let _ = stream.flush();
}

// ---------------------------------------------------------------------------
// Catalog fixtures
// ---------------------------------------------------------------------------

/// A catalog page body with the given slugs.
pub fn page(slugs: &[&str], next: Option<&str>) -> Value {
    let products: Vec<Value> = slugs
        .iter()
        .enumerate()
        .map(|(i, slug)| json!({ "id": i + 1, "name": format!("Товар {slug}"), "slug": slug }))
        .collect();
    json!({
        "products": products,
        "pagination": { "next_page_url": next },
    })
}

// ---------------------------------------------------------------------------
// Credential fixtures
// ---------------------------------------------------------------------------

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Write an `authorized_user` key file into `dir` and return its path.
pub fn write_authorized_user(dir: &Path) -> PathBuf {
    let creds = json!({
        "type": "authorized_user",
        "client_id": "client-id.apps.googleusercontent.com",
        "client_secret": "client-secret",
        "refresh_token": "refresh-token-1",
    });
    let path = dir.join("credintails.json");
    std::fs::write(&path, creds.to_string()).unwrap();
    path
}

/// Write a `service_account` key file using the RSA test key, with its
/// `token_uri` pointing at `token_uri`.
pub fn write_service_account(dir: &Path, token_uri: &str) -> PathBuf {
    let key = std::fs::read_to_string(fixture_path("test_key.pem")).unwrap();
    let creds = json!({
        "type": "service_account",
        "project_id": "catalog-mirror-test",
        "private_key_id": "test-key-id",
        "private_key": key,
        "client_email": "mirror@catalog-mirror-test.iam.gserviceaccount.com",
        "client_id": "1234567890",
        "token_uri": token_uri,
    });
    let path = dir.join("service_account.json");
    std::fs::write(&path, creds.to_string()).unwrap();
    path
}

/// Token endpoint reply.
pub fn token_reply(token: &str, expires_in: i64) -> Reply {
    Reply::json(json!({
        "access_token": token,
        "expires_in": expires_in,
        "token_type": "Bearer",
    }))
}

/// Sheets `values:append` reply.
pub fn append_reply(rows: usize) -> Reply {
    Reply::json(json!({
        "spreadsheetId": "sheet-id",
        "updates": {
            "updatedRange": format!("'Лист1'!A1:A{rows}"),
            "updatedRows": rows,
        }
    }))
}
