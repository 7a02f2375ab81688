//! WebPush-specific delivery options.
//!
//! The notification override here is an extensible record: a fixed set of
//! standard fields plus an arbitrary caller-supplied bag, merged into one
//! flat JSON object on the wire and recovered by key subtraction on decode.

use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::wire::{merge_custom, split_custom};

/// Messaging options specific to the WebPush protocol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebpushConfig {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<WebpushNotification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_options: Option<WebpushFcmOptions>,
}

/// An action button shown on a WebPush notification.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WebpushNotificationAction {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub icon: String,
}

impl WebpushNotificationAction {
    fn to_wire_value(&self) -> Value {
        let mut m = Map::new();
        if !self.action.is_empty() {
            m.insert("action".to_string(), Value::String(self.action.clone()));
        }
        if !self.title.is_empty() {
            m.insert("title".to_string(), Value::String(self.title.clone()));
        }
        if !self.icon.is_empty() {
            m.insert("icon".to_string(), Value::String(self.icon.clone()));
        }
        Value::Object(m)
    }
}

/// Fixed field names of [`WebpushNotification`]; decode subtracts these from
/// the flat wire object regardless of whether they were present.
const STANDARD_KEYS: &[&str] = &[
    "actions",
    "title",
    "body",
    "icon",
    "badge",
    "dir",
    "data",
    "image",
    "lang",
    "renotify",
    "requireInteraction",
    "silent",
    "tag",
    "timestamp",
    "vibrate",
];

/// A notification override to send via the WebPush protocol.
///
/// `custom_data` entries become siblings of the standard fields in the wire
/// object. A custom key that shadows a populated standard field is rejected
/// at validation time rather than silently overwritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebpushNotification {
    pub actions: Vec<WebpushNotificationAction>,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// One of `"ltr"`, `"rtl"` or `"auto"`; checked at validation time.
    pub direction: String,
    pub data: Option<Value>,
    pub image: String,
    pub language: String,
    pub renotify: bool,
    pub require_interaction: bool,
    pub silent: bool,
    pub tag: String,
    pub timestamp_millis: Option<i64>,
    pub vibrate: Vec<i64>,
    pub custom_data: Option<Map<String, Value>>,
}

#[derive(Deserialize, Default)]
struct WebpushNotificationWire {
    #[serde(default)]
    actions: Vec<WebpushNotificationAction>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    badge: String,
    #[serde(rename = "dir", default)]
    direction: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    image: String,
    #[serde(rename = "lang", default)]
    language: String,
    #[serde(default)]
    renotify: bool,
    #[serde(rename = "requireInteraction", default)]
    require_interaction: bool,
    #[serde(default)]
    silent: bool,
    #[serde(default)]
    tag: String,
    #[serde(rename = "timestamp", default)]
    timestamp_millis: Option<i64>,
    #[serde(default)]
    vibrate: Vec<i64>,
}

impl WebpushNotification {
    /// Wire object holding only the populated standard fields ("omit empty").
    pub(crate) fn standard_fields(&self) -> Map<String, Value> {
        let mut m = Map::new();
        let mut add_non_empty = |key: &str, value: &str| {
            if !value.is_empty() {
                m.insert(key.to_string(), Value::String(value.to_string()));
            }
        };
        add_non_empty("title", &self.title);
        add_non_empty("body", &self.body);
        add_non_empty("icon", &self.icon);
        add_non_empty("badge", &self.badge);
        add_non_empty("dir", &self.direction);
        add_non_empty("image", &self.image);
        add_non_empty("lang", &self.language);
        add_non_empty("tag", &self.tag);

        if !self.actions.is_empty() {
            let actions = self
                .actions
                .iter()
                .map(WebpushNotificationAction::to_wire_value)
                .collect();
            m.insert("actions".to_string(), Value::Array(actions));
        }
        if self.renotify {
            m.insert("renotify".to_string(), Value::Bool(true));
        }
        if self.require_interaction {
            m.insert("requireInteraction".to_string(), Value::Bool(true));
        }
        if self.silent {
            m.insert("silent".to_string(), Value::Bool(true));
        }
        if let Some(data) = &self.data {
            m.insert("data".to_string(), data.clone());
        }
        if let Some(ts) = self.timestamp_millis {
            m.insert("timestamp".to_string(), Value::from(ts));
        }
        if !self.vibrate.is_empty() {
            m.insert(
                "vibrate".to_string(),
                Value::Array(self.vibrate.iter().map(|&v| Value::from(v)).collect()),
            );
        }
        m
    }
}

impl Serialize for WebpushNotification {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        merge_custom(self.standard_fields(), self.custom_data.as_ref()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WebpushNotification {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let all = Map::<String, Value>::deserialize(deserializer)?;
        let wire: WebpushNotificationWire =
            serde_json::from_value(Value::Object(all.clone())).map_err(D::Error::custom)?;

        Ok(WebpushNotification {
            actions: wire.actions,
            title: wire.title,
            body: wire.body,
            icon: wire.icon,
            badge: wire.badge,
            direction: wire.direction,
            data: wire.data,
            image: wire.image,
            language: wire.language,
            renotify: wire.renotify,
            require_interaction: wire.require_interaction,
            silent: wire.silent,
            tag: wire.tag,
            timestamp_millis: wire.timestamp_millis,
            vibrate: wire.vibrate,
            custom_data: split_custom(all, STANDARD_KEYS),
        })
    }
}

/// Additional options for the FCM web SDK.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebpushFcmOptions {
    /// Target link opened when the user clicks the notification. Must be an
    /// absolute `https` URL; checked at validation time.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn custom_data_merges_flat() {
        let mut custom = Map::new();
        custom.insert("foo".to_string(), Value::String("bar".to_string()));
        let notification = WebpushNotification {
            title: "T".to_string(),
            custom_data: Some(custom),
            ..Default::default()
        };
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value, json!({"title": "T", "foo": "bar"}));
    }

    #[test]
    fn decode_recovers_custom_data_by_subtraction() {
        let back: WebpushNotification =
            serde_json::from_value(json!({"title": "T", "foo": "bar"})).unwrap();
        assert_eq!(back.title, "T");
        let custom = back.custom_data.expect("custom bag");
        assert_eq!(custom.len(), 1);
        assert_eq!(custom["foo"], "bar");
    }

    #[test]
    fn decode_without_extras_yields_no_bag() {
        let back: WebpushNotification =
            serde_json::from_value(json!({"title": "T", "silent": true})).unwrap();
        assert!(back.custom_data.is_none());
        assert!(back.silent);
    }

    #[test]
    fn actions_keep_only_populated_fields() {
        let notification = WebpushNotification {
            actions: vec![WebpushNotificationAction {
                action: "open".to_string(),
                title: "Open".to_string(),
                icon: String::new(),
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value, json!({"actions": [{"action": "open", "title": "Open"}]}));

        let back: WebpushNotification = serde_json::from_value(value).unwrap();
        assert_eq!(back, notification);
    }

    #[test]
    fn round_trip_preserves_standard_and_custom_fields() {
        let mut custom = Map::new();
        custom.insert("campaign".to_string(), json!({"id": 7}));
        let notification = WebpushNotification {
            title: "T".to_string(),
            direction: "rtl".to_string(),
            timestamp_millis: Some(1_700_000_000_000),
            vibrate: vec![100, 50, 100],
            custom_data: Some(custom),
            ..Default::default()
        };
        let value = serde_json::to_value(&notification).unwrap();
        let back: WebpushNotification = serde_json::from_value(value).unwrap();
        assert_eq!(back, notification);
    }
}
