//! LipaChat platform transport.
//!
//! Delivers replies over the LipaChat messaging API and files hand-off
//! tickets with the support desk. Bearer-token authenticated JSON over HTTPS.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::escalation::EscalationTicket;
use crate::domain::foundation::{Channel, CustomerId};
use crate::ports::{DeliveryAck, MessagingError, MessagingTransport};

#[derive(Debug, Clone)]
pub struct LipaChatTransportConfig {
    api_key: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl LipaChatTransportConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for the LipaChat API.
pub struct LipaChatTransport {
    config: LipaChatTransportConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    customer_id: &'a str,
    channel: Channel,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct Created {
    #[serde(default)]
    id: Option<String>,
}

impl LipaChatTransport {
    pub fn new(config: LipaChatTransportConfig) -> Result<Self, MessagingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MessagingError::Unavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<DeliveryAck, MessagingError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| MessagingError::Unavailable(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: Response) -> Result<DeliveryAck, MessagingError> {
        let status = response.status();
        if status.is_success() {
            // An empty or unexpected body still counts as delivered.
            let reference = response.json::<Created>().await.ok().and_then(|c| c.id);
            return Ok(DeliveryAck { reference });
        }

        let message = response.text().await.unwrap_or_default();
        tracing::error!(status = status.as_u16(), body = %message, "LipaChat API error");
        Err(status_error(status, message))
    }
}

fn status_error(status: StatusCode, message: String) -> MessagingError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MessagingError::AuthenticationFailed,
        s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
            MessagingError::Unavailable(format!("{}: {}", s, message))
        }
        s => MessagingError::Rejected {
            status: s.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl MessagingTransport for LipaChatTransport {
    async fn send_reply(
        &self,
        customer: &CustomerId,
        channel: Channel,
        text: &str,
    ) -> Result<DeliveryAck, MessagingError> {
        self.post(
            "/messages",
            &OutboundMessage {
                customer_id: customer.as_str(),
                channel,
                text,
            },
        )
        .await
    }

    async fn notify_human(&self, ticket: &EscalationTicket) -> Result<DeliveryAck, MessagingError> {
        self.post("/support/tickets", ticket).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let transport = LipaChatTransport::new(LipaChatTransportConfig::new(
            "key",
            "https://api.lipachat.com/v1/",
        ))
        .unwrap();
        assert_eq!(transport.url("/messages"), "https://api.lipachat.com/v1/messages");
    }

    #[test]
    fn status_codes_map_to_errors() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            MessagingError::AuthenticationFailed
        );
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "down".into()),
            MessagingError::Unavailable(_)
        ));
        assert_eq!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, "bad number".into()),
            MessagingError::Rejected {
                status: 422,
                message: "bad number".into()
            }
        );
    }

    #[test]
    fn outbound_message_uses_lowercase_channel() {
        let customer = CustomerId::new("+254700000030").unwrap();
        let body = serde_json::to_value(OutboundMessage {
            customer_id: customer.as_str(),
            channel: Channel::WhatsApp,
            text: "Hello",
        })
        .unwrap();
        assert_eq!(body["channel"], "whatsapp");
        assert_eq!(body["customer_id"], "+254700000030");
    }

    #[tokio::test]
    async fn unreachable_api_is_unavailable() {
        let transport = LipaChatTransport::new(
            LipaChatTransportConfig::new("key", "http://127.0.0.1:9")
                .with_timeout(Duration::from_millis(200)),
        )
        .unwrap();
        let customer = CustomerId::new("+254700000031").unwrap();
        assert!(matches!(
            transport.send_reply(&customer, Channel::Sms, "hi").await,
            Err(MessagingError::Unavailable(_))
        ));
    }
}
