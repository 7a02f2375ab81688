//! The root message aggregate sent to the FCM v1 API.
//!
//! A [`Message`] holds the cross-platform payload plus optional per-platform
//! configuration blocks, and exactly one targeting field (token, topic or
//! condition). Topics are stored bare; a `/topics/` prefix supplied by the
//! caller is a wire-cosmetic convention and is stripped at the boundary.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::android::AndroidConfig;
use crate::apns::ApnsConfig;
use crate::webpush::WebpushConfig;

pub(crate) const TOPIC_PREFIX: &str = "/topics/";

/// A message to be sent via Firebase Cloud Messaging.
///
/// Exactly one of `token`, `topic` or `condition` must be non-empty; this is
/// enforced by [`crate::validate::validate`], not by construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub data: HashMap<String, String>,
    pub notification: Option<Notification>,
    pub android: Option<AndroidConfig>,
    pub webpush: Option<WebpushConfig>,
    pub apns: Option<ApnsConfig>,
    pub fcm_options: Option<FcmOptions>,

    pub token: String,
    /// Stored in bare form, without the `/topics/` prefix.
    pub topic: String,
    pub condition: String,
}

impl Message {
    /// Runs the full validation rule set against this message.
    pub fn is_valid(&self) -> Result<(), crate::errors::ValidationError> {
        crate::validate::validate(self)
    }
}

/// The basic notification template shared across all platforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(rename = "image", default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
}

/// Platform-independent FCM SDK options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FcmOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub analytics_label: String,
}

/// Strips the wire-cosmetic `/topics/` prefix if the caller included it.
pub(crate) fn bare_topic(topic: &str) -> &str {
    topic.strip_prefix(TOPIC_PREFIX).unwrap_or(topic)
}

/// Explicit transport record for [`Message`]; every field is copied in each
/// direction so the bare-topic rewrite stays local to this boundary.
#[derive(Serialize, Deserialize, Default)]
struct MessageWire {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    data: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notification: Option<Notification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    android: Option<AndroidConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    webpush: Option<WebpushConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    apns: Option<ApnsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fcm_options: Option<FcmOptions>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    topic: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    condition: String,
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = MessageWire {
            data: self.data.clone(),
            notification: self.notification.clone(),
            android: self.android.clone(),
            webpush: self.webpush.clone(),
            apns: self.apns.clone(),
            fcm_options: self.fcm_options.clone(),
            token: self.token.clone(),
            topic: bare_topic(&self.topic).to_string(),
            condition: self.condition.clone(),
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = MessageWire::deserialize(deserializer)?;
        Ok(Message {
            data: wire.data,
            notification: wire.notification,
            android: wire.android,
            webpush: wire.webpush,
            apns: wire.apns,
            fcm_options: wire.fcm_options,
            token: wire.token,
            topic: bare_topic(&wire.topic).to_string(),
            condition: wire.condition,
        })
    }
}
