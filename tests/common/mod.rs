//! Common test utilities for settle integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch
//! the user's `~/.local/share/settle/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
pub use tempfile::TempDir;

/// A test environment with an isolated data directory.
///
/// The `settle()` method returns a `Command` that sets `SETTLE_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the settle binary with isolated data directory.
    ///
    /// Logging is silenced and the `SETTLE_*` config variables are cleared
    /// so the caller's environment cannot leak into results.
    pub fn settle(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_settle"));
        cmd.env("SETTLE_DATA_DIR", self.data_dir.path());
        cmd.env("SETTLE_LOG", "off");
        cmd.env_remove("SETTLE_APP_ID");
        cmd.env_remove("SETTLE_LANGUAGE");
        cmd.env_remove("SETTLE_SERVER_URL");
        cmd
    }

    pub fn data_path(&self) -> &Path {
        self.data_dir.path()
    }

    /// Path of the persisted file for `key`.
    pub fn persisted_path(&self, key: &str) -> PathBuf {
        self.data_dir.path().join(format!("{}.json", key))
    }

    /// Parsed contents of a persisted file, if present.
    pub fn persisted(&self, key: &str) -> Option<serde_json::Value> {
        let text = std::fs::read_to_string(self.persisted_path(key)).ok()?;
        Some(serde_json::from_str(&text).unwrap())
    }

    /// Write raw text to a persisted file.
    pub fn write_persisted(&self, key: &str, text: &str) {
        std::fs::write(self.persisted_path(key), text).unwrap();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn parse_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

/// A loopback HTTP server answering every request with one canned response.
///
/// The serving thread lives until the test process exits.
pub struct StubServer {
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn start(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let response = format!(
            concat!(
                "HTTP/1.1 {} Stub\r\n",
                "Content-Type: application/json\r\n",
                "Content-Length: {}\r\n",
                "Connection: close\r\n\r\n{}"
            ),
            status,
            body.len(),
            body
        );

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let Ok(reader) = stream.try_clone() else { continue };
                let mut lines = BufReader::new(reader).lines();
                let request_line = lines.next().and_then(|line| line.ok()).unwrap_or_default();
                // Drain the headers; requests are bodiless GETs
                for line in lines.by_ref() {
                    match line {
                        Ok(line) if !line.is_empty() => continue,
                        _ => break,
                    }
                }
                seen.lock().unwrap().push(request_line);
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Self { url, requests }
    }

    /// Request lines received so far, e.g. `GET /api/apps/x?lang=en-US HTTP/1.1`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}
