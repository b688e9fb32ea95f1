//! Syslog forwarding over TCP.

use crate::{DeliveryError, DeliveryResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

/// Sends log lines to one syslog endpoint.
#[async_trait]
pub trait SyslogTransport: Send + Sync {
    /// Open one session to `host:port` and emit each line as a message.
    async fn send_lines(&self, host: &str, port: u16, lines: &[String]) -> DeliveryResult<()>;
}

/// One TCP connection per file, LF-framed messages.
#[derive(Debug, Clone)]
pub struct TcpSyslogTransport {
    timeout: Duration,
}

impl TcpSyslogTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TcpSyslogTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(20))
    }
}

#[async_trait]
impl SyslogTransport for TcpSyslogTransport {
    async fn send_lines(&self, host: &str, port: u16, lines: &[String]) -> DeliveryResult<()> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| DeliveryError::Syslog(format!("connect to {host}:{port} timed out")))?
            .map_err(|e| DeliveryError::Syslog(format!("connect to {host}:{port}: {e}")))?;

        let mut writer = BufWriter::new(stream);
        let write = async {
            for line in lines {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
            }
            writer.flush().await?;
            writer.shutdown().await
        };
        tokio::time::timeout(self.timeout, write)
            .await
            .map_err(|_| DeliveryError::Syslog(format!("write to {host}:{port} timed out")))?
            .map_err(|e| DeliveryError::Syslog(format!("write to {host}:{port}: {e}")))
    }
}
