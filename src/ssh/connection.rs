//! SSH Connection Manager
//!
//! Provides persistent SSH connection handling with reconnection on demand
//! and concurrent access protection. At most one session is live at a time;
//! reconnecting replaces the previous session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use russh::client::{self, Handle};
use russh::keys::PrivateKeyWithHashAlg;
use russh::Channel;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info};

use super::config::SshConfig;
use super::handler::SshHandler;
use crate::config::CONNECTION_TIMEOUT_SECS;
use crate::error::{Result, RpitxError};

/// SSH Connection Manager
///
/// Manages a persistent SSH connection to the Pi:
/// - Reconnection on demand via `ensure_connected()`
/// - Concurrent access protection via mutex/atomic flags
/// - 30-second connection timeout
pub struct SshConnectionManager {
    /// SSH configuration
    config: SshConfig,

    /// Active SSH session handle
    session: Arc<Mutex<Option<Handle<SshHandler>>>>,

    /// Flag to prevent concurrent connection attempts
    is_connecting: AtomicBool,
}

impl SshConnectionManager {
    /// Create a new SSH Connection Manager
    ///
    /// Does not establish connection immediately; call `connect()` or
    /// `ensure_connected()` to establish the connection.
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            session: Arc::new(Mutex::new(None)),
            is_connecting: AtomicBool::new(false),
        }
    }

    /// Username this manager authenticates as
    pub fn username(&self) -> &str {
        &self.config.username
    }

    /// Establish SSH connection
    ///
    /// If already connected, returns immediately. If another task is currently
    /// connecting, waits for that connection attempt to complete. On failure
    /// no session is stored; the caller must not assume the session is valid.
    pub async fn connect(&self) -> Result<()> {
        // Check if already connected
        if self.is_connected().await {
            debug!("Already connected to SSH server");
            return Ok(());
        }

        // Prevent concurrent connection attempts
        if self
            .is_connecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Another connection attempt in progress, waiting...");
            loop {
                tokio::time::sleep(Duration::from_millis(100)).await;
                if !self.is_connecting.load(Ordering::SeqCst) {
                    break;
                }
            }
            return if self.is_connected().await {
                Ok(())
            } else {
                Err(RpitxError::connection("Connection failed by another task"))
            };
        }

        // Perform connection with timeout
        let result = self.do_connect().await;

        // Reset connecting flag
        self.is_connecting.store(false, Ordering::SeqCst);

        result
    }

    /// Internal connection logic
    async fn do_connect(&self) -> Result<()> {
        info!(
            "Connecting to {}:{}...",
            self.config.host, self.config.port
        );

        let connection_timeout = Duration::from_secs(CONNECTION_TIMEOUT_SECS);

        let ssh_config = Arc::new(client::Config::default());

        // Connect with timeout
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let connect_result = timeout(
            connection_timeout,
            client::connect(ssh_config, addr.as_str(), SshHandler::new()),
        )
        .await;

        let mut session = match connect_result {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                error!("SSH connection failed: {}", e);
                return Err(RpitxError::connection(e.to_string()));
            }
            Err(_) => {
                error!("SSH connection timeout after {}s", CONNECTION_TIMEOUT_SECS);
                return Err(RpitxError::connection(format!(
                    "Connection timeout after {}s",
                    CONNECTION_TIMEOUT_SECS
                )));
            }
        };

        // Authenticate
        self.authenticate(&mut session).await?;

        // Store session, replacing any stale one
        {
            let mut session_guard = self.session.lock().await;
            *session_guard = Some(session);
        }

        info!(
            "Successfully connected to {}@{}:{}",
            self.config.username, self.config.host, self.config.port
        );

        Ok(())
    }

    /// Authenticate with the SSH server
    async fn authenticate(&self, session: &mut Handle<SshHandler>) -> Result<()> {
        // Try password authentication first
        if let Some(ref password) = self.config.password {
            debug!(
                "Attempting password authentication for user '{}'",
                self.config.username
            );
            let auth_result = session
                .authenticate_password(&self.config.username, password)
                .await
                .map_err(|e| RpitxError::auth(e.to_string()))?;

            if auth_result.success() {
                info!("Password authentication successful");
                return Ok(());
            } else {
                return Err(RpitxError::auth("Password authentication rejected"));
            }
        }

        // Try key authentication
        if let Some(ref key_content) = self.config.private_key {
            debug!(
                "Attempting key authentication for user '{}'",
                self.config.username
            );

            let key = russh::keys::PrivateKey::from_openssh(key_content.as_bytes())
                .map_err(|e| RpitxError::SshKey(format!("Failed to parse private key: {}", e)))?;

            let key_with_alg = PrivateKeyWithHashAlg::new(Arc::new(key), None);

            let auth_result = session
                .authenticate_publickey(&self.config.username, key_with_alg)
                .await
                .map_err(|e| RpitxError::auth(e.to_string()))?;

            if auth_result.success() {
                info!("Key authentication successful");
                return Ok(());
            } else {
                return Err(RpitxError::auth("Key authentication rejected"));
            }
        }

        Err(RpitxError::auth(
            "No authentication method available (require password or private_key)",
        ))
    }

    /// Whether a connection attempt is currently in flight
    pub fn is_connecting(&self) -> bool {
        self.is_connecting.load(Ordering::SeqCst)
    }

    /// Check if the connection is active
    pub async fn is_connected(&self) -> bool {
        let session_guard = self.session.lock().await;
        session_guard.is_some()
    }

    /// Ensure connection is established, reconnecting if necessary
    pub async fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected().await {
            self.connect().await?;
        }
        Ok(())
    }

    /// Open a new session channel
    pub async fn open_channel(&self) -> Result<Channel<client::Msg>> {
        let session_guard = self.session.lock().await;
        let session = session_guard
            .as_ref()
            .ok_or_else(|| RpitxError::connection("SSH connection not established"))?;

        let channel = session
            .channel_open_session()
            .await
            .map_err(|e| RpitxError::connection(format!("Failed to open channel: {}", e)))?;

        Ok(channel)
    }

    /// Close the SSH connection
    pub async fn close(&self) {
        let mut session_guard = self.session.lock().await;
        if let Some(session) = session_guard.take() {
            let _ = session
                .disconnect(russh::Disconnect::ByApplication, "", "")
                .await;
        }

        info!("SSH connection closed");
    }
}

impl std::fmt::Debug for SshConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConnectionManager")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("username", &self.config.username)
            .field("is_connecting", &self.is_connecting.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_manager_creation() {
        let config = SshConfig::new("localhost", "pi")
            .with_port(22)
            .with_password("raspberry");

        let manager = SshConnectionManager::new(config);

        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_not_connected_initially() {
        let config = SshConfig::new("localhost", "pi");
        let manager = SshConnectionManager::new(config);

        // Should return error when trying to open channel without connecting
        let result = manager.open_channel().await;
        assert!(result.is_err());
    }
}
