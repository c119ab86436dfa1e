//! File transfer to the Pi over the SFTP subsystem
//!
//! Payload files (WAV audio, JPG images, FreeDV RF samples) are staged in a
//! fixed temp directory under the remote user's home. The directory is
//! created, chowned to the operator, and chmodded before every transfer so a
//! previous root-owned run cannot block the upload.

use std::path::Path;
use std::time::Duration;

use russh_sftp::client::SftpSession;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::connection::SshConnectionManager;
use super::sanitize::escape_for_shell;
use crate::error::{Result, RpitxError};

/// Timeout for each directory preparation command
const PREP_TIMEOUT: Duration = Duration::from_secs(15);

impl SshConnectionManager {
    /// Remote staging directory for uploaded payload files
    pub fn remote_temp_dir(&self) -> String {
        format!("/home/{}/rpitx/temp", self.username())
    }

    /// Upload a local file to the Pi and return its remote path
    ///
    /// Ensures the staging directory exists with operator ownership and 755
    /// permissions, transfers the file over SFTP, then marks the uploaded
    /// file 755 so the transmission scripts can read it.
    pub async fn upload_file(
        &self,
        local_path: impl AsRef<Path>,
        remote_filename: &str,
    ) -> Result<String> {
        let local_path = local_path.as_ref();
        self.ensure_connected().await?;

        let temp_dir = self.remote_temp_dir();
        let remote_path = format!("{}/{}", temp_dir, remote_filename);

        self.prepare_temp_dir(&temp_dir).await?;

        let data = tokio::fs::read(local_path).await.map_err(|e| {
            RpitxError::upload(format!("cannot read {}: {}", local_path.display(), e))
        })?;

        debug!(
            "Uploading {} ({} bytes) to {}",
            local_path.display(),
            data.len(),
            remote_path
        );

        self.sftp_put(&remote_path, &data).await?;

        // Scripts run under sudo but still expect a world-readable file
        let chmod = chmod_command(&remote_path);
        self.exec_command(&chmod, PREP_TIMEOUT)
            .await
            .map_err(|e| RpitxError::upload(format!("chmod on uploaded file failed: {}", e)))?;

        info!("Uploaded {} to {}", local_path.display(), remote_path);
        Ok(remote_path)
    }

    /// Create/chown/chmod the staging directory
    async fn prepare_temp_dir(&self, temp_dir: &str) -> Result<()> {
        let user = self.username().to_string();
        let dir = escape_for_shell(temp_dir);
        let prep_commands = [
            format!("sudo mkdir -p '{}'", dir),
            format!("sudo chown -R {}:{} '{}'", user, user, dir),
            format!("sudo chmod -R 755 '{}'", dir),
        ];

        for cmd in &prep_commands {
            self.exec_command(cmd, PREP_TIMEOUT)
                .await
                .map_err(|e| RpitxError::upload(format!("'{}' failed: {}", cmd, e)))?;
        }

        Ok(())
    }

    /// Write `data` to `remote_path` via the SFTP subsystem
    async fn sftp_put(&self, remote_path: &str, data: &[u8]) -> Result<()> {
        let channel = self.open_channel().await?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| RpitxError::upload(format!("sftp subsystem request failed: {}", e)))?;

        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| RpitxError::upload(format!("sftp session failed: {}", e)))?;

        let mut remote_file = sftp
            .create(remote_path)
            .await
            .map_err(|e| RpitxError::upload(format!("cannot create {}: {}", remote_path, e)))?;

        remote_file
            .write_all(data)
            .await
            .map_err(|e| RpitxError::upload(format!("write to {} failed: {}", remote_path, e)))?;

        remote_file
            .shutdown()
            .await
            .map_err(|e| RpitxError::upload(format!("close of {} failed: {}", remote_path, e)))?;

        let _ = sftp.close().await;

        Ok(())
    }
}

/// Build the chmod command for an uploaded file
///
/// The filename is operator-supplied, so the path is single-quoted before
/// it reaches the remote shell.
fn chmod_command(remote_path: &str) -> String {
    format!("sudo chmod 755 '{}'", escape_for_shell(remote_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh::config::SshConfig;

    #[test]
    fn test_chmod_command_quotes_path() {
        assert_eq!(
            chmod_command("/home/pi/rpitx/temp/my file.wav"),
            "sudo chmod 755 '/home/pi/rpitx/temp/my file.wav'"
        );
    }

    #[test]
    fn test_chmod_command_escapes_quotes() {
        assert_eq!(
            chmod_command("/home/pi/rpitx/temp/it's.wav"),
            "sudo chmod 755 '/home/pi/rpitx/temp/it'\"'\"'s.wav'"
        );
    }

    #[test]
    fn test_remote_temp_dir_under_user_home() {
        let manager = SshConnectionManager::new(SshConfig::new("pi.local", "mwk"));
        assert_eq!(manager.remote_temp_dir(), "/home/mwk/rpitx/temp");
    }

    #[tokio::test]
    async fn test_upload_without_connection_fails() {
        // Port 1 on loopback refuses immediately, so connect fails before
        // any transfer is attempted
        let config = SshConfig::new("127.0.0.1", "mwk").with_port(1).with_password("x");
        let manager = SshConnectionManager::new(config);
        let result = manager.upload_file("/nonexistent/file.wav", "temp.wav").await;
        assert!(result.is_err());
    }
}
