//! Android-specific delivery options and notification overrides.
//!
//! The wire representation differs from the native one in three spots: the
//! TTL is a duration string, the priority/visibility/proxy enums are string
//! tokens with an unset value that never appears on the wire, and vibrate
//! timings plus the LED light settings carry their durations as strings.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::FormatError;
use crate::wire::{duration_to_string, string_to_duration, Color};

/// Nanosecond-precision Zulu timestamp used by `event_time`.
const EVENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// Messaging options specific to the Android platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AndroidConfig {
    pub collapse_key: String,
    /// One of `"normal"` or `"high"`; checked at validation time.
    pub priority: String,
    pub ttl: Option<Duration>,
    pub restricted_package_name: String,
    /// If set, overrides the top-level [`crate::Message`] data map.
    pub data: HashMap<String, String>,
    pub notification: Option<AndroidNotification>,
    pub fcm_options: Option<AndroidFcmOptions>,
    pub direct_boot_ok: bool,
}

#[derive(Serialize, Deserialize, Default)]
struct AndroidConfigWire {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    ttl: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    collapse_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    priority: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    restricted_package_name: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    data: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notification: Option<AndroidNotification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fcm_options: Option<AndroidFcmOptions>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    direct_boot_ok: bool,
}

impl Serialize for AndroidConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = AndroidConfigWire {
            ttl: self.ttl.map(duration_to_string).unwrap_or_default(),
            collapse_key: self.collapse_key.clone(),
            priority: self.priority.clone(),
            restricted_package_name: self.restricted_package_name.clone(),
            data: self.data.clone(),
            notification: self.notification.clone(),
            fcm_options: self.fcm_options.clone(),
            direct_boot_ok: self.direct_boot_ok,
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AndroidConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = AndroidConfigWire::deserialize(deserializer)?;
        let ttl = if wire.ttl.is_empty() {
            None
        } else {
            Some(string_to_duration(&wire.ttl).map_err(D::Error::custom)?)
        };
        Ok(AndroidConfig {
            collapse_key: wire.collapse_key,
            priority: wire.priority,
            ttl,
            restricted_package_name: wire.restricted_package_name,
            data: wire.data,
            notification: wire.notification,
            fcm_options: wire.fcm_options,
            direct_boot_ok: wire.direct_boot_ok,
        })
    }
}

/// A notification override to send to Android devices. Non-empty `title` and
/// `body` take precedence over the cross-platform template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AndroidNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// `#RRGGBB` format; checked at validation time.
    pub color: String,
    pub sound: String,
    pub tag: String,
    pub click_action: String,
    pub body_loc_key: String,
    pub body_loc_args: Vec<String>,
    pub title_loc_key: String,
    pub title_loc_args: Vec<String>,
    pub channel_id: String,
    pub ticker: String,
    pub sticky: bool,
    pub event_timestamp: Option<DateTime<Utc>>,
    pub local_only: bool,
    pub priority: AndroidNotificationPriority,
    pub default_sound: bool,
    pub default_vibrate_timings: bool,
    pub default_light_settings: bool,
    pub vibrate_timing_millis: Vec<i64>,
    pub visibility: AndroidNotificationVisibility,
    pub notification_count: Option<i32>,
    pub light_settings: Option<LightSettings>,
    pub image_url: String,
    pub proxy: AndroidNotificationProxy,
}

#[derive(Serialize, Deserialize, Default)]
struct AndroidNotificationWire {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    event_time: String,
    #[serde(rename = "notification_priority", default, skip_serializing_if = "String::is_empty")]
    priority: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    visibility: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    proxy: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    vibrate_timings: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    body: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    icon: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    sound: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    click_action: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    body_loc_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    body_loc_args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    title_loc_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    title_loc_args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    channel_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    ticker: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    sticky: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    local_only: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    default_sound: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    default_vibrate_timings: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    default_light_settings: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notification_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    light_settings: Option<LightSettings>,
    #[serde(rename = "image", default, skip_serializing_if = "String::is_empty")]
    image_url: String,
}

impl Serialize for AndroidNotification {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut vibrate_timings = Vec::with_capacity(self.vibrate_timing_millis.len());
        for &millis in &self.vibrate_timing_millis {
            let millis = u64::try_from(millis)
                .map_err(|_| S::Error::custom("vibrate timing must not be negative"))?;
            vibrate_timings.push(duration_to_string(Duration::from_millis(millis)));
        }

        let wire = AndroidNotificationWire {
            event_time: self
                .event_timestamp
                .map(|ts| ts.format(EVENT_TIME_FORMAT).to_string())
                .unwrap_or_default(),
            priority: self.priority.wire_token().unwrap_or_default().to_string(),
            visibility: self.visibility.wire_token().unwrap_or_default().to_string(),
            proxy: self.proxy.wire_token().unwrap_or_default().to_string(),
            vibrate_timings,
            title: self.title.clone(),
            body: self.body.clone(),
            icon: self.icon.clone(),
            color: self.color.clone(),
            sound: self.sound.clone(),
            tag: self.tag.clone(),
            click_action: self.click_action.clone(),
            body_loc_key: self.body_loc_key.clone(),
            body_loc_args: self.body_loc_args.clone(),
            title_loc_key: self.title_loc_key.clone(),
            title_loc_args: self.title_loc_args.clone(),
            channel_id: self.channel_id.clone(),
            ticker: self.ticker.clone(),
            sticky: self.sticky,
            local_only: self.local_only,
            default_sound: self.default_sound,
            default_vibrate_timings: self.default_vibrate_timings,
            default_light_settings: self.default_light_settings,
            notification_count: self.notification_count,
            light_settings: self.light_settings.clone(),
            image_url: self.image_url.clone(),
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AndroidNotification {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = AndroidNotificationWire::deserialize(deserializer)?;

        let priority = match wire.priority.as_str() {
            "" => AndroidNotificationPriority::Unspecified,
            token => AndroidNotificationPriority::from_wire_token(token).map_err(D::Error::custom)?,
        };
        let visibility = match wire.visibility.as_str() {
            "" => AndroidNotificationVisibility::Unspecified,
            token => {
                AndroidNotificationVisibility::from_wire_token(token).map_err(D::Error::custom)?
            }
        };
        let proxy = match wire.proxy.as_str() {
            "" => AndroidNotificationProxy::Unspecified,
            token => AndroidNotificationProxy::from_wire_token(token).map_err(D::Error::custom)?,
        };

        let event_timestamp = if wire.event_time.is_empty() {
            None
        } else {
            let naive = NaiveDateTime::parse_from_str(&wire.event_time, EVENT_TIME_FORMAT)
                .map_err(|_| {
                    D::Error::custom(FormatError::Timestamp {
                        value: wire.event_time.clone(),
                    })
                })?;
            Some(naive.and_utc())
        };

        let mut vibrate_timing_millis = Vec::with_capacity(wire.vibrate_timings.len());
        for timing in &wire.vibrate_timings {
            let d = string_to_duration(timing).map_err(D::Error::custom)?;
            let millis = i64::try_from(d.as_millis())
                .map_err(|_| D::Error::custom(format!("vibrate timing overflows: {timing:?}")))?;
            vibrate_timing_millis.push(millis);
        }

        Ok(AndroidNotification {
            title: wire.title,
            body: wire.body,
            icon: wire.icon,
            color: wire.color,
            sound: wire.sound,
            tag: wire.tag,
            click_action: wire.click_action,
            body_loc_key: wire.body_loc_key,
            body_loc_args: wire.body_loc_args,
            title_loc_key: wire.title_loc_key,
            title_loc_args: wire.title_loc_args,
            channel_id: wire.channel_id,
            ticker: wire.ticker,
            sticky: wire.sticky,
            event_timestamp,
            local_only: wire.local_only,
            priority,
            default_sound: wire.default_sound,
            default_vibrate_timings: wire.default_vibrate_timings,
            default_light_settings: wire.default_light_settings,
            vibrate_timing_millis,
            visibility,
            notification_count: wire.notification_count,
            light_settings: wire.light_settings,
            image_url: wire.image_url,
            proxy,
        })
    }
}

/// Relative priority of the notification on the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AndroidNotificationPriority {
    /// Not set; never emitted on the wire.
    #[default]
    Unspecified,
    Min,
    Low,
    Normal,
    High,
    Max,
}

impl AndroidNotificationPriority {
    fn wire_token(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Min => Some("PRIORITY_MIN"),
            Self::Low => Some("PRIORITY_LOW"),
            Self::Normal => Some("PRIORITY_DEFAULT"),
            Self::High => Some("PRIORITY_HIGH"),
            Self::Max => Some("PRIORITY_MAX"),
        }
    }

    fn from_wire_token(token: &str) -> Result<Self, FormatError> {
        match token {
            "PRIORITY_MIN" => Ok(Self::Min),
            "PRIORITY_LOW" => Ok(Self::Low),
            "PRIORITY_DEFAULT" => Ok(Self::Normal),
            "PRIORITY_HIGH" => Ok(Self::High),
            "PRIORITY_MAX" => Ok(Self::Max),
            other => Err(FormatError::UnknownEnumToken {
                field: "notification_priority",
                value: other.to_string(),
            }),
        }
    }
}

/// Lockscreen visibility of the notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AndroidNotificationVisibility {
    /// Not set; never emitted on the wire.
    #[default]
    Unspecified,
    Private,
    Public,
    Secret,
}

impl AndroidNotificationVisibility {
    fn wire_token(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Private => Some("PRIVATE"),
            Self::Public => Some("PUBLIC"),
            Self::Secret => Some("SECRET"),
        }
    }

    fn from_wire_token(token: &str) -> Result<Self, FormatError> {
        match token {
            "PRIVATE" => Ok(Self::Private),
            "PUBLIC" => Ok(Self::Public),
            "SECRET" => Ok(Self::Secret),
            other => Err(FormatError::UnknownEnumToken {
                field: "visibility",
                value: other.to_string(),
            }),
        }
    }
}

/// Controls when a notification may be proxied through another device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AndroidNotificationProxy {
    /// Not set; never emitted on the wire.
    #[default]
    Unspecified,
    Allow,
    Deny,
    IfPriorityLowered,
}

impl AndroidNotificationProxy {
    fn wire_token(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Allow => Some("ALLOW"),
            Self::Deny => Some("DENY"),
            Self::IfPriorityLowered => Some("IF_PRIORITY_LOWERED"),
        }
    }

    fn from_wire_token(token: &str) -> Result<Self, FormatError> {
        match token {
            "ALLOW" => Ok(Self::Allow),
            "DENY" => Ok(Self::Deny),
            "IF_PRIORITY_LOWERED" => Ok(Self::IfPriorityLowered),
            other => Err(FormatError::UnknownEnumToken {
                field: "proxy",
                value: other.to_string(),
            }),
        }
    }
}

/// LED light settings: a color plus on/off blink durations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightSettings {
    /// `#RRGGBB` or `#RRGGBBAA`; carried as a normalized RGBA object on the wire.
    pub color: String,
    pub light_on_duration_millis: i64,
    pub light_off_duration_millis: i64,
}

#[derive(Serialize, Deserialize)]
struct LightSettingsWire {
    color: Color,
    light_on_duration: String,
    light_off_duration: String,
}

impl Serialize for LightSettings {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let color = Color::parse(&self.color).map_err(S::Error::custom)?;
        let on = u64::try_from(self.light_on_duration_millis)
            .map_err(|_| S::Error::custom("light_on_duration must not be negative"))?;
        let off = u64::try_from(self.light_off_duration_millis)
            .map_err(|_| S::Error::custom("light_off_duration must not be negative"))?;

        let wire = LightSettingsWire {
            color,
            light_on_duration: duration_to_string(Duration::from_millis(on)),
            light_off_duration: duration_to_string(Duration::from_millis(off)),
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LightSettings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = LightSettingsWire::deserialize(deserializer)?;
        let on = string_to_duration(&wire.light_on_duration).map_err(D::Error::custom)?;
        let off = string_to_duration(&wire.light_off_duration).map_err(D::Error::custom)?;

        Ok(LightSettings {
            color: wire.color.to_hex(),
            light_on_duration_millis: i64::try_from(on.as_millis())
                .map_err(|_| D::Error::custom("light_on_duration overflows"))?,
            light_off_duration_millis: i64::try_from(off.as_millis())
                .map_err(|_| D::Error::custom("light_off_duration overflows"))?,
        })
    }
}

/// Additional options for the FCM Android SDK.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AndroidFcmOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub analytics_label: String,
}
