//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Declares a UUID-backed identifier with the usual constructors.
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates the identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_identifier!(
    /// Identifies one opening of a conversation. A customer who returns after
    /// their previous conversation was closed gets a new session under the
    /// same [`ConversationId`].
    SessionId
);

uuid_identifier!(
    /// Unique identifier for a single turn.
    TurnId
);

uuid_identifier!(
    /// Unique identifier for an escalation ticket.
    TicketId
);

/// Customer identifier as reported by the messaging platform (usually an
/// E.164 phone number for WhatsApp).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Creates a new CustomerId, returning error if empty or containing the
    /// key separator.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(ValidationError::empty_field("customer_id"));
        }
        if id.contains(KEY_SEPARATOR) {
            return Err(ValidationError::invalid_format(
                "customer_id",
                format!("must not contain '{}'", KEY_SEPARATOR),
            ));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messaging channel a customer talks to us on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    WhatsApp,
    Sms,
    Web,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::WhatsApp => "whatsapp",
            Channel::Sms => "sms",
            Channel::Web => "web",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whatsapp" => Ok(Channel::WhatsApp),
            "sms" => Ok(Channel::Sms),
            "web" => Ok(Channel::Web),
            other => Err(ValidationError::invalid_format(
                "channel",
                format!("unknown channel '{}'", other),
            )),
        }
    }
}

const KEY_SEPARATOR: char = ':';

/// Conversation key: one conversation per customer per channel.
///
/// Renders as `<channel>:<customer>`, e.g. `whatsapp:+254700000001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId {
    customer: CustomerId,
    channel: Channel,
}

impl ConversationId {
    pub fn new(customer: CustomerId, channel: Channel) -> Self {
        Self { customer, channel }
    }

    pub fn customer(&self) -> &CustomerId {
        &self.customer
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.channel, KEY_SEPARATOR, self.customer)
    }
}

impl FromStr for ConversationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (channel, customer) = s.split_once(KEY_SEPARATOR).ok_or_else(|| {
            ValidationError::invalid_format("conversation_id", "expected '<channel>:<customer>'")
        })?;
        Ok(Self::new(CustomerId::new(customer)?, channel.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_id_rejects_empty() {
        assert!(CustomerId::new("   ").is_err());
    }

    #[test]
    fn customer_id_rejects_separator() {
        assert!(CustomerId::new("a:b").is_err());
    }

    #[test]
    fn customer_id_trims_whitespace() {
        let id = CustomerId::new(" +254700000001 ").unwrap();
        assert_eq!(id.as_str(), "+254700000001");
    }

    #[test]
    fn channel_parses_case_insensitively() {
        assert_eq!("WhatsApp".parse::<Channel>().unwrap(), Channel::WhatsApp);
        assert_eq!("sms".parse::<Channel>().unwrap(), Channel::Sms);
        assert!("fax".parse::<Channel>().is_err());
    }

    #[test]
    fn conversation_id_displays_channel_then_customer() {
        let id = ConversationId::new(CustomerId::new("+254700000001").unwrap(), Channel::WhatsApp);
        assert_eq!(id.to_string(), "whatsapp:+254700000001");
    }

    #[test]
    fn conversation_id_parses_its_display_form() {
        let id: ConversationId = "sms:+254711111111".parse().unwrap();
        assert_eq!(id.channel(), Channel::Sms);
        assert_eq!(id.customer().as_str(), "+254711111111");
        assert_eq!(id.to_string().parse::<ConversationId>().unwrap(), id);
    }

    #[test]
    fn conversation_id_without_separator_fails() {
        assert!("whatsapp".parse::<ConversationId>().is_err());
    }

    #[test]
    fn uuid_identifiers_are_unique() {
        assert_ne!(TicketId::new(), TicketId::new());
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
