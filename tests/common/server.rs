//! Test server management.
//!
//! Spawns and manages leadcapd instances for integration testing.

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

pub const ADMIN_USER: &str = "ops";
pub const ADMIN_PASS: &str = "integration-secret-2026";

/// A test server instance backed by a temporary SQLite file.
pub struct TestServer {
    child: Child,
    port: u16,
    data_dir: Option<TempDir>,
}

impl TestServer {
    /// Spawn a new test server on a free port.
    pub async fn spawn() -> anyhow::Result<Self> {
        let data_dir = tempfile::tempdir()?;
        Self::spawn_in(data_dir).await
    }

    /// Spawn a server whose database lives in `data_dir`.
    pub async fn spawn_in(data_dir: TempDir) -> anyhow::Result<Self> {
        let port = free_port()?;
        let child = Command::new(binary_path())
            .env("DATABASE_URL", database_url(data_dir.path()))
            .env("LISTEN_ADDR", format!("127.0.0.1:{port}"))
            .env("ADMIN_USER", ADMIN_USER)
            .env("ADMIN_PASS", ADMIN_PASS)
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .spawn()?;

        let server = Self {
            child,
            port,
            data_dir: Some(data_dir),
        };

        // Wait for server to start listening
        server.wait_until_ready().await?;

        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Base URL for requests.
    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    /// Stop the server, keeping the data directory for a restart.
    pub fn stop(mut self) -> TempDir {
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.data_dir.take().expect("data dir is present until stop")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Kill the server process; the data directory is removed with the TempDir
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Path to the compiled `leadcapd` binary.
pub fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_leadcapd"))
}

pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}", data_dir.join("leads.db").display())
}

/// Ask the OS for a port nobody is listening on.
fn free_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
