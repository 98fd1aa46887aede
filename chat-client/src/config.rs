//! Client configuration.

use chat_types::Auth;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::transport::ConnectOptions;

/// Access token presented during the connection handshake.
///
/// Zeroized on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for handing to the transport.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Configuration for ChatClient.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Server host including scheme, e.g. `ws://chat.example.com`.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Identity of the connecting user.
    pub user_id: String,
    /// Token authenticating `user_id`.
    pub access_token: AccessToken,
    /// Reconnection attempts after an unexpected loss (`None` = unlimited).
    pub max_reconnect_attempts: Option<u32>,
}

impl ChatConfig {
    /// Create a configuration with unlimited reconnection attempts.
    pub fn new(host: &str, port: u16, user_id: &str, access_token: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            user_id: user_id.to_string(),
            access_token: AccessToken::new(access_token),
            max_reconnect_attempts: None,
        }
    }

    /// Limit the number of reconnection attempts.
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }

    /// Connection target, `host:port`.
    pub fn url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Options handed to the transport on `start()`.
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            url: self.url(),
            auth: Auth {
                user_id: self.user_id.clone(),
                token: self.access_token.expose().to_string(),
            },
            reconnection_attempts: self.max_reconnect_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_host_and_port() {
        let config = ChatConfig::new("ws://localhost", 3000, "u1", "t");
        assert_eq!(config.url(), "ws://localhost:3000");
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new("ws://localhost", 3000, "u1", "t").with_max_reconnect_attempts(5);
        assert_eq!(config.max_reconnect_attempts, Some(5));
    }

    #[test]
    fn connect_options_carry_auth_and_attempt_limit() {
        let config =
            ChatConfig::new("ws://chat.test", 443, "alice", "tok-1").with_max_reconnect_attempts(2);
        let options = config.connect_options();

        assert_eq!(options.url, "ws://chat.test:443");
        assert_eq!(options.auth.user_id, "alice");
        assert_eq!(options.auth.token, "tok-1");
        assert_eq!(options.reconnection_attempts, Some(2));
    }

    #[test]
    fn default_reconnect_attempts_are_unlimited() {
        let config = ChatConfig::new("ws://localhost", 3000, "u1", "t");
        assert_eq!(config.connect_options().reconnection_attempts, None);
    }

    #[test]
    fn debug_redacts_token() {
        let config = ChatConfig::new("ws://localhost", 3000, "u1", "very-secret-token");
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"), "got: {}", debug);
        assert!(!debug.contains("very-secret-token"));
    }
}
