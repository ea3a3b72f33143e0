//! LipaChat messaging configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Outbound transport and inbound webhook settings.
///
/// Without an API key replies are kept in memory, which is only useful for
/// local development.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    pub lipachat_api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Shared secret used to sign inbound webhooks
    pub webhook_secret: Option<String>,

    /// Accepted clock skew for webhook signatures
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl MessagingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn signature_tolerance(&self) -> Duration {
        Duration::from_secs(self.signature_tolerance_secs)
    }

    pub fn has_api_key(&self) -> bool {
        self.lipachat_api_key
            .as_ref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    pub fn has_webhook_secret(&self) -> bool {
        self.webhook_secret
            .as_ref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    /// Production requires real delivery and signed webhooks.
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl("messaging.base_url"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if production {
            if !self.has_api_key() {
                return Err(ValidationError::MissingRequired("MESSAGING__LIPACHAT_API_KEY"));
            }
            if !self.has_webhook_secret() {
                return Err(ValidationError::MissingRequired("MESSAGING__WEBHOOK_SECRET"));
            }
        }
        Ok(())
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            lipachat_api_key: None,
            base_url: default_base_url(),
            webhook_secret: None,
            signature_tolerance_secs: default_signature_tolerance(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.lipachat.com/v1".to_string()
}

fn default_signature_tolerance() -> u64 {
    300
}

fn default_timeout() -> u64 {
    30
}
