//! Notification message shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery channel for a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    /// Short message to a mobile phone
    Sms,
    /// E-mail
    Mail,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Sms => "SMS",
            Channel::Mail => "Mail",
        }
    }
}

/// An outbound notification.
///
/// Delivery is fire-and-forget: a failed send is logged and never fails
/// the operation that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Delivery channel
    pub channel: Channel,

    /// Phone number or e-mail address
    pub to: String,

    /// Message body
    pub contents: String,

    /// When the notification was created
    pub created: DateTime<Utc>,
}

impl Notification {
    /// Create an SMS notification
    pub fn sms(to: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            channel: Channel::Sms,
            to: to.into(),
            contents: contents.into(),
            created: Utc::now(),
        }
    }

    /// Create a mail notification
    pub fn mail(to: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            channel: Channel::Mail,
            to: to.into(),
            contents: contents.into(),
            created: Utc::now(),
        }
    }
}
