//! SSH configuration types
//!
//! Connection parameters for reaching the Raspberry Pi.

/// SSH connection configuration
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Pi hostname or IP address
    pub host: String,

    /// SSH port (default: 22)
    pub port: u16,

    /// Username for authentication
    pub username: String,

    /// Password for password authentication
    pub password: Option<String>,

    /// Private key content (not path!) for key authentication
    pub private_key: Option<String>,
}

impl SshConfig {
    /// Create a new SSH configuration with minimal required fields
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            password: None,
            private_key: None,
        }
    }

    /// Set the SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set password authentication
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set private key authentication (key content, not path)
    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_config_builder() {
        let config = SshConfig::new("192.168.0.197", "pi")
            .with_port(2222)
            .with_password("raspberry");

        assert_eq!(config.host, "192.168.0.197");
        assert_eq!(config.port, 2222);
        assert_eq!(config.username, "pi");
        assert_eq!(config.password, Some("raspberry".to_string()));
        assert!(config.private_key.is_none());
    }
}
