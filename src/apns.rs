//! APNs-specific delivery options.
//!
//! The payload is an extensible record wrapping the `aps` dictionary plus
//! arbitrary custom top-level keys; `aps` is itself a second extensible
//! record. Two wire quirks live here: `alert` and `sound` each accept either
//! a bare string or a structured object, and the `content-available` /
//! `mutable-content` flags travel as the integer `1` rather than a boolean.

use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::wire::{merge_custom, split_custom};

/// Messaging options specific to the Apple Push Notification service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApnsConfig {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ApnsPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_options: Option<ApnsFcmOptions>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub live_activity_token: String,
}

/// The APNs payload: one fixed `aps` dictionary plus custom top-level keys.
///
/// The `aps` key is always present on the wire (as `null` when unset), so a
/// custom key named `"aps"` is always a validation error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApnsPayload {
    pub aps: Option<Aps>,
    pub custom_data: Option<Map<String, Value>>,
}

impl Serialize for ApnsPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut standard = Map::new();
        standard.insert(
            "aps".to_string(),
            match &self.aps {
                Some(aps) => aps.to_wire_value(),
                None => Value::Null,
            },
        );
        merge_custom(standard, self.custom_data.as_ref()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ApnsPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let all = Map::<String, Value>::deserialize(deserializer)?;
        let aps = match all.get("aps") {
            None | Some(Value::Null) => None,
            Some(value) => {
                Some(serde_json::from_value(value.clone()).map_err(D::Error::custom)?)
            }
        };
        Ok(ApnsPayload {
            aps,
            custom_data: split_custom(all, &["aps"]),
        })
    }
}

/// Fixed field names of the [`Aps`] dictionary.
const APS_STANDARD_KEYS: &[&str] = &[
    "alert",
    "badge",
    "sound",
    "content-available",
    "mutable-content",
    "category",
    "thread-id",
];

/// The `aps` dictionary of an APNs payload.
///
/// The alert may be given as a plain string (`alert_string`) or a structured
/// [`ApsAlert`] (`alert`), never both; the same either/or applies to `sound`
/// and `critical_sound`. Validation rejects the doubly-populated states.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aps {
    pub alert_string: String,
    pub alert: Option<ApsAlert>,
    pub badge: Option<i64>,
    pub sound: String,
    pub critical_sound: Option<CriticalSound>,
    pub content_available: bool,
    pub mutable_content: bool,
    pub category: String,
    pub thread_id: String,
    pub custom_data: Option<Map<String, Value>>,
}

impl Aps {
    /// Wire object holding only the populated standard fields. The structured
    /// alert/sound forms take precedence over their string twins, and the two
    /// boolean flags are flattened to the integer `1`.
    pub(crate) fn standard_fields(&self) -> Map<String, Value> {
        let mut m = Map::new();
        if let Some(alert) = &self.alert {
            m.insert("alert".to_string(), alert.to_wire_value());
        } else if !self.alert_string.is_empty() {
            m.insert("alert".to_string(), Value::String(self.alert_string.clone()));
        }
        if self.content_available {
            m.insert("content-available".to_string(), Value::from(1));
        }
        if self.mutable_content {
            m.insert("mutable-content".to_string(), Value::from(1));
        }
        if let Some(badge) = self.badge {
            m.insert("badge".to_string(), Value::from(badge));
        }
        if let Some(sound) = &self.critical_sound {
            m.insert("sound".to_string(), sound.to_wire_value());
        } else if !self.sound.is_empty() {
            m.insert("sound".to_string(), Value::String(self.sound.clone()));
        }
        if !self.category.is_empty() {
            m.insert("category".to_string(), Value::String(self.category.clone()));
        }
        if !self.thread_id.is_empty() {
            m.insert("thread-id".to_string(), Value::String(self.thread_id.clone()));
        }
        m
    }

    fn to_wire_value(&self) -> Value {
        Value::Object(merge_custom(self.standard_fields(), self.custom_data.as_ref()))
    }
}

impl Serialize for Aps {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_wire_value().serialize(serializer)
    }
}

/// Reads an APNs boolean flag carried as an integer: `1` is true, any other
/// integer (or an absent key) is false. A non-integer value is a decode error.
fn int_flag<E: serde::de::Error>(all: &Map<String, Value>, key: &str) -> Result<bool, E> {
    match all.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(value) => value
            .as_i64()
            .map(|n| n == 1)
            .ok_or_else(|| E::custom(format!("{key} must be an integer, got {value}"))),
    }
}

fn string_field<E: serde::de::Error>(all: &Map<String, Value>, key: &str) -> Result<String, E> {
    match all.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(E::custom(format!("{key} must be a string, got {other}"))),
    }
}

impl<'de> Deserialize<'de> for Aps {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let all = Map::<String, Value>::deserialize(deserializer)?;
        let mut aps = Aps::default();

        if let Some(alert) = all.get("alert").filter(|v| !v.is_null()) {
            // Structured form first; any failure falls back to the string
            // form, so a malformed alert object decodes as a string attempt
            // and only a double failure is surfaced.
            match serde_json::from_value::<ApsAlert>(alert.clone()) {
                Ok(parsed) => aps.alert = Some(parsed),
                Err(_) => match serde_json::from_value::<String>(alert.clone()) {
                    Ok(s) => aps.alert_string = s,
                    Err(err) => {
                        return Err(D::Error::custom(format!(
                            "failed to parse alert as a struct or a string: {err}"
                        )))
                    }
                },
            }
        }

        if let Some(sound) = all.get("sound").filter(|v| !v.is_null()) {
            match serde_json::from_value::<CriticalSound>(sound.clone()) {
                Ok(parsed) => aps.critical_sound = Some(parsed),
                Err(_) => match serde_json::from_value::<String>(sound.clone()) {
                    Ok(s) => aps.sound = s,
                    Err(err) => {
                        return Err(D::Error::custom(format!(
                            "failed to parse sound as a struct or a string: {err}"
                        )))
                    }
                },
            }
        }

        aps.content_available = int_flag(&all, "content-available")?;
        aps.mutable_content = int_flag(&all, "mutable-content")?;
        aps.badge = match all.get("badge") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_i64().ok_or_else(|| {
                D::Error::custom(format!("badge must be an integer, got {value}"))
            })?),
        };
        aps.category = string_field(&all, "category")?;
        aps.thread_id = string_field(&all, "thread-id")?;
        aps.custom_data = split_custom(all, APS_STANDARD_KEYS);

        Ok(aps)
    }
}

/// A sound to play, optionally marked critical. The `critical` flag travels
/// as the integer `1` and the volume must lie in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriticalSound {
    pub critical: bool,
    pub name: String,
    pub volume: f64,
}

#[derive(Deserialize)]
struct CriticalSoundWire {
    #[serde(default)]
    critical: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    volume: f64,
}

impl CriticalSound {
    fn to_wire_value(&self) -> Value {
        let mut m = Map::new();
        if self.critical {
            m.insert("critical".to_string(), Value::from(1));
        }
        if !self.name.is_empty() {
            m.insert("name".to_string(), Value::String(self.name.clone()));
        }
        if self.volume != 0.0 {
            m.insert("volume".to_string(), Value::from(self.volume));
        }
        Value::Object(m)
    }
}

impl Serialize for CriticalSound {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_wire_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CriticalSound {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = CriticalSoundWire::deserialize(deserializer)?;
        Ok(CriticalSound {
            critical: wire.critical == 1,
            name: wire.name,
            volume: wire.volume,
        })
    }
}

/// The structured alert payload of an `aps` dictionary.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApsAlert {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "subtitle", default)]
    pub sub_title: String,
    #[serde(default)]
    pub body: String,
    #[serde(rename = "loc-key", default)]
    pub loc_key: String,
    #[serde(rename = "loc-args", default)]
    pub loc_args: Vec<String>,
    #[serde(rename = "title-loc-key", default)]
    pub title_loc_key: String,
    #[serde(rename = "title-loc-args", default)]
    pub title_loc_args: Vec<String>,
    #[serde(rename = "subtitle-loc-key", default)]
    pub sub_title_loc_key: String,
    #[serde(rename = "subtitle-loc-args", default)]
    pub sub_title_loc_args: Vec<String>,
    #[serde(rename = "action-loc-key", default)]
    pub action_loc_key: String,
    #[serde(rename = "launch-image", default)]
    pub launch_image: String,
}

impl ApsAlert {
    fn to_wire_value(&self) -> Value {
        let mut m = Map::new();
        let mut add_non_empty = |key: &str, value: &str| {
            if !value.is_empty() {
                m.insert(key.to_string(), Value::String(value.to_string()));
            }
        };
        add_non_empty("title", &self.title);
        add_non_empty("subtitle", &self.sub_title);
        add_non_empty("body", &self.body);
        add_non_empty("loc-key", &self.loc_key);
        add_non_empty("title-loc-key", &self.title_loc_key);
        add_non_empty("subtitle-loc-key", &self.sub_title_loc_key);
        add_non_empty("action-loc-key", &self.action_loc_key);
        add_non_empty("launch-image", &self.launch_image);

        let mut add_args = |key: &str, args: &[String]| {
            if !args.is_empty() {
                m.insert(
                    key.to_string(),
                    Value::Array(args.iter().map(|a| Value::String(a.clone())).collect()),
                );
            }
        };
        add_args("loc-args", &self.loc_args);
        add_args("title-loc-args", &self.title_loc_args);
        add_args("subtitle-loc-args", &self.sub_title_loc_args);
        Value::Object(m)
    }
}

impl Serialize for ApsAlert {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_wire_value().serialize(serializer)
    }
}

/// Additional options for the FCM Apple SDK.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApnsFcmOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub analytics_label: String,
    #[serde(rename = "image", default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn boolean_flags_encode_as_integer_one() {
        let aps = Aps {
            content_available: true,
            mutable_content: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&aps).unwrap();
        assert_eq!(value, json!({"content-available": 1, "mutable-content": 1}));
    }

    #[test]
    fn any_other_flag_value_decodes_as_false() {
        for flag in [json!(0), json!(2), json!(-1)] {
            let aps: Aps = serde_json::from_value(json!({"content-available": flag})).unwrap();
            assert!(!aps.content_available);
        }
        let aps: Aps = serde_json::from_value(json!({})).unwrap();
        assert!(!aps.content_available);

        let err = serde_json::from_value::<Aps>(json!({"content-available": "yes"}));
        assert!(err.is_err());
    }

    #[test]
    fn alert_string_and_struct_are_mutually_exclusive_on_the_wire() {
        let plain = Aps {
            alert_string: "hello".to_string(),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&plain).unwrap(), json!({"alert": "hello"}));

        let structured = Aps {
            alert: Some(ApsAlert {
                title: "T".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&structured).unwrap(),
            json!({"alert": {"title": "T"}})
        );
    }

    #[test]
    fn alert_decodes_structured_first_then_string() {
        let aps: Aps = serde_json::from_value(json!({"alert": {"title": "T"}})).unwrap();
        assert_eq!(aps.alert.unwrap().title, "T");

        let aps: Aps = serde_json::from_value(json!({"alert": "hello"})).unwrap();
        assert_eq!(aps.alert_string, "hello");
        assert!(aps.alert.is_none());

        let err = serde_json::from_value::<Aps>(json!({"alert": 5})).unwrap_err();
        assert!(
            err.to_string().contains("failed to parse alert as a struct or a string"),
            "{err}"
        );
    }

    #[test]
    fn sound_follows_the_same_union_pattern() {
        let aps: Aps = serde_json::from_value(json!({"sound": "default"})).unwrap();
        assert_eq!(aps.sound, "default");

        let aps: Aps = serde_json::from_value(
            json!({"sound": {"critical": 1, "name": "siren", "volume": 0.75}}),
        )
        .unwrap();
        let cs = aps.critical_sound.unwrap();
        assert!(cs.critical);
        assert_eq!(cs.name, "siren");
        assert_eq!(cs.volume, 0.75);
    }

    #[test]
    fn critical_flag_round_trips_as_integer() {
        let sound = CriticalSound {
            critical: true,
            name: "siren".to_string(),
            volume: 0.5,
        };
        let value = serde_json::to_value(&sound).unwrap();
        assert_eq!(value, json!({"critical": 1, "name": "siren", "volume": 0.5}));

        let back: CriticalSound = serde_json::from_value(json!({"name": "x", "critical": 0})).unwrap();
        assert!(!back.critical);
    }

    #[test]
    fn payload_always_carries_the_aps_key() {
        let payload = ApnsPayload::default();
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({"aps": null}));

        let back: ApnsPayload = serde_json::from_value(json!({"aps": null})).unwrap();
        assert!(back.aps.is_none());
        assert!(back.custom_data.is_none());
    }

    #[test]
    fn payload_custom_keys_merge_beside_aps() {
        let mut custom = Map::new();
        custom.insert("acme".to_string(), json!({"id": 42}));
        let payload = ApnsPayload {
            aps: Some(Aps {
                alert_string: "hi".to_string(),
                ..Default::default()
            }),
            custom_data: Some(custom),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({"aps": {"alert": "hi"}, "acme": {"id": 42}}));

        let back: ApnsPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn aps_custom_data_survives_round_trip() {
        let value = json!({
            "alert": "hi",
            "badge": 3,
            "thread-id": "t1",
            "extra": true,
        });
        let aps: Aps = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(aps.badge, Some(3));
        assert_eq!(aps.thread_id, "t1");
        assert_eq!(aps.custom_data.as_ref().unwrap()["extra"], true);
        assert_eq!(serde_json::to_value(&aps).unwrap(), value);
    }
}
