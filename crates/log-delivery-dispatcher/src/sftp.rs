//! SFTP upload of locally persisted files.

use crate::{DeliveryError, DeliveryResult};
use async_trait::async_trait;
use logsync_config_and_utils::SftpSettings;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Uploads one local file to a remote path.
#[async_trait]
pub trait SftpUploader: Send + Sync {
    async fn upload(&self, local: &Path, remote_path: &str) -> DeliveryResult<()>;
}

/// The uploader used by the agent for `settings`.
///
/// Fails with [`DeliveryError::SftpUnsupported`] when built without the
/// `sftp` feature.
pub fn default_sftp_uploader(
    settings: &SftpSettings,
    timeout: Duration,
) -> DeliveryResult<Arc<dyn SftpUploader>> {
    #[cfg(feature = "sftp")]
    {
        Ok(Arc::new(Ssh2Uploader::new(settings.clone(), timeout)))
    }
    #[cfg(not(feature = "sftp"))]
    {
        let _ = (settings, timeout);
        Err(DeliveryError::SftpUnsupported)
    }
}

/// Password-authenticated SFTP over libssh2. Each upload opens its own
/// session on a blocking thread.
#[cfg(feature = "sftp")]
#[derive(Debug, Clone)]
pub struct Ssh2Uploader {
    settings: SftpSettings,
    timeout: Duration,
}

#[cfg(feature = "sftp")]
impl Ssh2Uploader {
    pub fn new(settings: SftpSettings, timeout: Duration) -> Self {
        Self { settings, timeout }
    }

    fn upload_blocking(&self, local: &Path, remote_path: &str) -> DeliveryResult<()> {
        let sftp_err = |e: ssh2::Error| DeliveryError::Sftp(e.to_string());
        let SftpSettings {
            host,
            port,
            username,
            password,
            ..
        } = &self.settings;

        let tcp = std::net::TcpStream::connect((host.as_str(), *port))?;
        tcp.set_read_timeout(Some(self.timeout))?;
        tcp.set_write_timeout(Some(self.timeout))?;

        let mut session = ssh2::Session::new().map_err(sftp_err)?;
        session.set_timeout(u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX));
        session.set_tcp_stream(tcp);
        session.handshake().map_err(sftp_err)?;
        session
            .userauth_password(username, password.expose())
            .map_err(sftp_err)?;

        let sftp = session.sftp().map_err(sftp_err)?;
        let mut remote = sftp.create(Path::new(remote_path)).map_err(sftp_err)?;
        let mut file = std::fs::File::open(local)?;
        std::io::copy(&mut file, &mut remote)?;
        Ok(())
    }
}

#[cfg(feature = "sftp")]
#[async_trait]
impl SftpUploader for Ssh2Uploader {
    async fn upload(&self, local: &Path, remote_path: &str) -> DeliveryResult<()> {
        let uploader = self.clone();
        let local = local.to_path_buf();
        let remote_path = remote_path.to_string();
        tokio::task::spawn_blocking(move || uploader.upload_blocking(&local, &remote_path))
            .await
            .map_err(|e| DeliveryError::Sftp(format!("upload task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsync_config_and_utils::Secret;

    fn settings() -> SftpSettings {
        SftpSettings {
            host: "127.0.0.1".to_string(),
            port: 1,
            username: "collector".to_string(),
            password: Secret::new("pw"),
            remote_dir: "/incoming".to_string(),
        }
    }

    #[cfg(not(feature = "sftp"))]
    #[test]
    fn default_uploader_requires_feature() {
        assert!(matches!(
            default_sftp_uploader(&settings(), Duration::from_secs(1)),
            Err(DeliveryError::SftpUnsupported)
        ));
    }

    #[cfg(feature = "sftp")]
    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let uploader = default_sftp_uploader(&settings(), Duration::from_secs(1)).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let local = dir.path().join("1_1.log");
        std::fs::write(&local, b"x").unwrap();

        assert!(uploader.upload(&local, "/incoming/1_1.log").await.is_err());
    }
}
