//! Test lobby client.
//!
//! Provides a line client for integration testing that can send commands
//! and assert on received responses.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A test lobby client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    /// The greeting line sent on connect.
    pub greeting: String,
}

impl TestClient {
    /// Connect to a test server and read the greeting.
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;

        // Split stream for reading and writing
        let (read_half, write_half) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            greeting: String::new(),
        };
        client.greeting = client.recv().await?;
        Ok(client)
    }

    /// Send a raw line.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with('\n') {
            self.writer.write_all(b"\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Send raw bytes as-is, with no line terminator added.
    #[allow(dead_code)]
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive a single line from the server.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a line with a timeout. End of stream is an error.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("connection closed");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Receive lines until the given predicate returns true.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await?;
            let done = predicate(&line);
            lines.push(line);
            if done {
                break;
            }
        }
        Ok(lines)
    }

    /// Receive lines until one starts with `prefix`; returns that line.
    #[allow(dead_code)]
    pub async fn expect_prefix(&mut self, prefix: &str) -> anyhow::Result<String> {
        let lines = self.recv_until(|l| l.starts_with(prefix)).await?;
        lines
            .last()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no line received"))
    }

    /// Log in and consume the state burst up to `LOGININFOEND`.
    pub async fn login(&mut self, username: &str, password: &str) -> anyhow::Result<Vec<String>> {
        self.send_raw(&format!("LOGIN {username} {password} 0 0 TestClient 1.0"))
            .await?;
        let lines = self
            .recv_until(|l| l == "LOGININFOEND" || l.starts_with("DENIED"))
            .await?;
        match lines.first() {
            Some(first) if first.starts_with("ACCEPTED") => Ok(lines),
            other => anyhow::bail!("login failed: {other:?}"),
        }
    }

    /// Discard whatever arrives within a short quiet period.
    #[allow(dead_code)]
    pub async fn drain(&mut self) {
        tokio::time::sleep(Duration::from_millis(100)).await;
        while self.recv_timeout(Duration::from_millis(20)).await.is_ok() {}
    }

    /// Wait for the server to close the connection.
    #[allow(dead_code)]
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        loop {
            let mut line = String::new();
            let n = timeout(Duration::from_secs(5), self.reader.read_line(&mut line)).await?;
            match n {
                Ok(0) | Err(_) => return Ok(()),
                Ok(_) => continue,
            }
        }
    }
}
