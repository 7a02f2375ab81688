//! Cross-field validation of a fully-built [`Message`].
//!
//! One pure pass, evaluated before send, short-circuiting on the first
//! failing rule. The rule order is pinned by the tests below so the "first
//! error wins" behavior stays deterministic.

use url::Url;

use crate::android::{AndroidConfig, AndroidNotification, LightSettings};
use crate::apns::{ApnsConfig, Aps, ApsAlert};
use crate::errors::ValidationError;
use crate::message::{bare_topic, Message, Notification};
use crate::webpush::WebpushConfig;

/// Checks every invariant of the message and its platform blocks.
///
/// Absent optional blocks pass trivially. TTL negativity needs no rule here:
/// `std::time::Duration` cannot represent a negative value.
pub fn validate(message: &Message) -> Result<(), ValidationError> {
    let targets = [&message.token, &message.topic, &message.condition]
        .iter()
        .filter(|s| !s.is_empty())
        .count();
    if targets != 1 {
        return Err(ValidationError::TargetCount { count: targets });
    }

    if !message.topic.is_empty() {
        let bare = bare_topic(&message.topic);
        if bare.is_empty() || !bare.chars().all(is_topic_char) {
            return Err(ValidationError::MalformedTopic {
                topic: message.topic.clone(),
            });
        }
    }

    validate_notification(message.notification.as_ref())?;
    validate_android(message.android.as_ref())?;
    validate_webpush(message.webpush.as_ref())?;
    validate_apns(message.apns.as_ref())?;
    Ok(())
}

fn is_topic_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '%')
}

fn check_absolute_url(link: &str) -> Result<(), ValidationError> {
    Url::parse(link).map_err(|_| ValidationError::InvalidImageUrl {
        url: link.to_string(),
    })?;
    Ok(())
}

fn validate_notification(notification: Option<&Notification>) -> Result<(), ValidationError> {
    let Some(notification) = notification else {
        return Ok(());
    };
    if !notification.image_url.is_empty() {
        check_absolute_url(&notification.image_url)?;
    }
    Ok(())
}

fn validate_android(config: Option<&AndroidConfig>) -> Result<(), ValidationError> {
    let Some(config) = config else {
        return Ok(());
    };
    if !config.priority.is_empty() && config.priority != "normal" && config.priority != "high" {
        return Err(ValidationError::InvalidAndroidPriority {
            value: config.priority.clone(),
        });
    }
    validate_android_notification(config.notification.as_ref())
}

fn validate_android_notification(
    notification: Option<&AndroidNotification>,
) -> Result<(), ValidationError> {
    let Some(notification) = notification else {
        return Ok(());
    };

    if !notification.color.is_empty() && !is_hex_color(&notification.color, false) {
        return Err(ValidationError::InvalidColor {
            value: notification.color.clone(),
        });
    }
    if !notification.title_loc_args.is_empty() && notification.title_loc_key.is_empty() {
        return Err(ValidationError::MissingLocKey {
            key_field: "title_loc_key",
            args_field: "title_loc_args",
        });
    }
    if !notification.body_loc_args.is_empty() && notification.body_loc_key.is_empty() {
        return Err(ValidationError::MissingLocKey {
            key_field: "body_loc_key",
            args_field: "body_loc_args",
        });
    }
    if !notification.image_url.is_empty() {
        check_absolute_url(&notification.image_url)?;
    }
    for &timing in &notification.vibrate_timing_millis {
        if timing < 0 {
            return Err(ValidationError::NegativeVibrateTiming { millis: timing });
        }
    }
    validate_light_settings(notification.light_settings.as_ref())
}

fn validate_light_settings(light: Option<&LightSettings>) -> Result<(), ValidationError> {
    let Some(light) = light else {
        return Ok(());
    };
    if !is_hex_color(&light.color, true) {
        return Err(ValidationError::InvalidLightColor {
            value: light.color.clone(),
        });
    }
    if light.light_on_duration_millis < 0 {
        return Err(ValidationError::NegativeLightDuration {
            field: "light_on_duration",
            millis: light.light_on_duration_millis,
        });
    }
    if light.light_off_duration_millis < 0 {
        return Err(ValidationError::NegativeLightDuration {
            field: "light_off_duration",
            millis: light.light_off_duration_millis,
        });
    }
    Ok(())
}

fn is_hex_color(value: &str, allow_alpha: bool) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    let len_ok = hex.len() == 6 || (allow_alpha && hex.len() == 8);
    len_ok && hex.chars().all(|c| c.is_ascii_hexdigit())
}

fn validate_webpush(webpush: Option<&WebpushConfig>) -> Result<(), ValidationError> {
    let Some(webpush) = webpush else {
        return Ok(());
    };

    if let Some(notification) = &webpush.notification {
        let dir = notification.direction.as_str();
        if !dir.is_empty() && dir != "ltr" && dir != "rtl" && dir != "auto" {
            return Err(ValidationError::InvalidDirection {
                value: dir.to_string(),
            });
        }

        if let Some(custom) = &notification.custom_data {
            let standard = notification.standard_fields();
            for key in custom.keys() {
                if standard.contains_key(key) {
                    return Err(ValidationError::CustomKeyCollision { key: key.clone() });
                }
            }
        }
    }

    if let Some(options) = &webpush.fcm_options {
        let link = Url::parse(&options.link).map_err(|_| ValidationError::InvalidLinkUrl {
            url: options.link.clone(),
        })?;
        if link.scheme() != "https" {
            return Err(ValidationError::LinkSchemeNotHttps {
                url: options.link.clone(),
            });
        }
    }
    Ok(())
}

fn validate_apns(config: Option<&ApnsConfig>) -> Result<(), ValidationError> {
    let Some(config) = config else {
        return Ok(());
    };

    if let Some(options) = &config.fcm_options {
        if !options.image_url.is_empty() {
            check_absolute_url(&options.image_url)?;
        }
    }

    let Some(payload) = &config.payload else {
        return Ok(());
    };
    if let Some(custom) = &payload.custom_data {
        // "aps" is always emitted, so the collision is checked by name.
        if custom.contains_key("aps") {
            return Err(ValidationError::CustomKeyCollision {
                key: "aps".to_string(),
            });
        }
    }
    validate_aps(payload.aps.as_ref())
}

fn validate_aps(aps: Option<&Aps>) -> Result<(), ValidationError> {
    let Some(aps) = aps else {
        return Ok(());
    };

    if aps.alert.is_some() && !aps.alert_string.is_empty() {
        return Err(ValidationError::MultipleAlerts);
    }
    if let Some(sound) = &aps.critical_sound {
        if !aps.sound.is_empty() {
            return Err(ValidationError::MultipleSounds);
        }
        if !(0.0..=1.0).contains(&sound.volume) {
            return Err(ValidationError::VolumeOutOfRange {
                volume: sound.volume,
            });
        }
    }

    if let Some(custom) = &aps.custom_data {
        let standard = aps.standard_fields();
        for key in custom.keys() {
            if standard.contains_key(key) {
                return Err(ValidationError::CustomKeyCollision { key: key.clone() });
            }
        }
    }
    validate_aps_alert(aps.alert.as_ref())
}

fn validate_aps_alert(alert: Option<&ApsAlert>) -> Result<(), ValidationError> {
    let Some(alert) = alert else {
        return Ok(());
    };
    if !alert.title_loc_args.is_empty() && alert.title_loc_key.is_empty() {
        return Err(ValidationError::MissingLocKey {
            key_field: "title-loc-key",
            args_field: "title-loc-args",
        });
    }
    if !alert.sub_title_loc_args.is_empty() && alert.sub_title_loc_key.is_empty() {
        return Err(ValidationError::MissingLocKey {
            key_field: "subtitle-loc-key",
            args_field: "subtitle-loc-args",
        });
    }
    if !alert.loc_args.is_empty() && alert.loc_key.is_empty() {
        return Err(ValidationError::MissingLocKey {
            key_field: "loc-key",
            args_field: "loc-args",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apns::{ApnsFcmOptions, ApnsPayload, CriticalSound};
    use crate::webpush::{WebpushFcmOptions, WebpushNotification};
    use serde_json::{json, Map};

    fn token_message() -> Message {
        Message {
            token: "abc".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn exactly_one_target_is_required() {
        assert_eq!(
            validate(&Message::default()),
            Err(ValidationError::TargetCount { count: 0 })
        );

        let both = Message {
            token: "abc".to_string(),
            topic: "news".to_string(),
            ..Default::default()
        };
        assert_eq!(
            validate(&both),
            Err(ValidationError::TargetCount { count: 2 })
        );

        assert!(validate(&token_message()).is_ok());
    }

    #[test]
    fn target_count_is_checked_before_topic_shape() {
        let msg = Message {
            token: "abc".to_string(),
            topic: "bad topic!".to_string(),
            ..Default::default()
        };
        assert_eq!(validate(&msg), Err(ValidationError::TargetCount { count: 2 }));
    }

    #[test]
    fn topic_must_match_the_character_class() {
        for topic in ["news", "/topics/news", "a-b_c.d~e%f"] {
            let msg = Message {
                topic: topic.to_string(),
                ..Default::default()
            };
            assert!(validate(&msg).is_ok(), "{topic}");
        }
        for topic in ["bad topic!", "/topics/", "news/extra", "emoji🔥"] {
            let msg = Message {
                topic: topic.to_string(),
                ..Default::default()
            };
            assert!(
                matches!(validate(&msg), Err(ValidationError::MalformedTopic { .. })),
                "{topic}"
            );
        }
    }

    #[test]
    fn notification_image_must_be_an_absolute_url() {
        let mut msg = token_message();
        msg.notification = Some(Notification {
            image_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(
            validate(&msg),
            Err(ValidationError::InvalidImageUrl { .. })
        ));

        msg.notification.as_mut().unwrap().image_url = "https://example.com/a.png".to_string();
        assert!(validate(&msg).is_ok());
    }

    #[test]
    fn android_priority_tokens_are_literal() {
        let mut msg = token_message();
        msg.android = Some(AndroidConfig {
            priority: "urgent".to_string(),
            ..Default::default()
        });
        assert!(matches!(
            validate(&msg),
            Err(ValidationError::InvalidAndroidPriority { .. })
        ));

        for ok in ["", "normal", "high"] {
            msg.android.as_mut().unwrap().priority = ok.to_string();
            assert!(validate(&msg).is_ok(), "{ok}");
        }
    }

    #[test]
    fn android_color_must_be_six_hex_digits() {
        let mut msg = token_message();
        msg.android = Some(AndroidConfig {
            notification: Some(AndroidNotification {
                color: "#FF000080".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(matches!(
            validate(&msg),
            Err(ValidationError::InvalidColor { .. })
        ));
    }

    #[test]
    fn android_loc_args_require_their_key() {
        let mut msg = token_message();
        msg.android = Some(AndroidConfig {
            notification: Some(AndroidNotification {
                body_loc_args: vec!["x".to_string()],
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(
            validate(&msg),
            Err(ValidationError::MissingLocKey {
                key_field: "body_loc_key",
                args_field: "body_loc_args",
            })
        );
    }

    #[test]
    fn android_vibrate_and_light_rules() {
        let mut msg = token_message();
        msg.android = Some(AndroidConfig {
            notification: Some(AndroidNotification {
                vibrate_timing_millis: vec![100, -5],
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(
            validate(&msg),
            Err(ValidationError::NegativeVibrateTiming { millis: -5 })
        );

        msg.android = Some(AndroidConfig {
            notification: Some(AndroidNotification {
                light_settings: Some(LightSettings {
                    color: "#00FF0080".to_string(),
                    light_on_duration_millis: 100,
                    light_off_duration_millis: -1,
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(
            validate(&msg),
            Err(ValidationError::NegativeLightDuration {
                field: "light_off_duration",
                millis: -1,
            })
        );
    }

    #[test]
    fn webpush_direction_and_custom_collision() {
        let mut msg = token_message();
        msg.webpush = Some(WebpushConfig {
            notification: Some(WebpushNotification {
                direction: "up".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(matches!(
            validate(&msg),
            Err(ValidationError::InvalidDirection { .. })
        ));

        let mut custom = Map::new();
        custom.insert("title".to_string(), json!("shadow"));
        msg.webpush = Some(WebpushConfig {
            notification: Some(WebpushNotification {
                title: "T".to_string(),
                custom_data: Some(custom),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(
            validate(&msg),
            Err(ValidationError::CustomKeyCollision {
                key: "title".to_string(),
            })
        );
    }

    #[test]
    fn webpush_link_must_be_absolute_https() {
        let mut msg = token_message();
        msg.webpush = Some(WebpushConfig {
            fcm_options: Some(WebpushFcmOptions {
                link: "http://example.com".to_string(),
            }),
            ..Default::default()
        });
        assert!(matches!(
            validate(&msg),
            Err(ValidationError::LinkSchemeNotHttps { .. })
        ));

        msg.webpush.as_mut().unwrap().fcm_options = Some(WebpushFcmOptions {
            link: "https://example.com".to_string(),
        });
        assert!(validate(&msg).is_ok());
    }

    #[test]
    fn apns_alert_and_sound_exclusivity() {
        let mut msg = token_message();
        msg.apns = Some(ApnsConfig {
            payload: Some(ApnsPayload {
                aps: Some(Aps {
                    alert_string: "hi".to_string(),
                    alert: Some(ApsAlert::default()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(validate(&msg), Err(ValidationError::MultipleAlerts));

        msg.apns = Some(ApnsConfig {
            payload: Some(ApnsPayload {
                aps: Some(Aps {
                    sound: "default".to_string(),
                    critical_sound: Some(CriticalSound::default()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(validate(&msg), Err(ValidationError::MultipleSounds));
    }

    #[test]
    fn critical_sound_volume_range() {
        let mut msg = token_message();
        msg.apns = Some(ApnsConfig {
            payload: Some(ApnsPayload {
                aps: Some(Aps {
                    critical_sound: Some(CriticalSound {
                        volume: 1.5,
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(
            validate(&msg),
            Err(ValidationError::VolumeOutOfRange { volume: 1.5 })
        );
    }

    #[test]
    fn apns_custom_key_collisions() {
        let mut payload_custom = Map::new();
        payload_custom.insert("aps".to_string(), json!({}));
        let mut msg = token_message();
        msg.apns = Some(ApnsConfig {
            payload: Some(ApnsPayload {
                aps: None,
                custom_data: Some(payload_custom),
            }),
            ..Default::default()
        });
        assert_eq!(
            validate(&msg),
            Err(ValidationError::CustomKeyCollision {
                key: "aps".to_string(),
            })
        );

        let mut aps_custom = Map::new();
        aps_custom.insert("badge".to_string(), json!(9));
        msg.apns = Some(ApnsConfig {
            payload: Some(ApnsPayload {
                aps: Some(Aps {
                    badge: Some(1),
                    custom_data: Some(aps_custom),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(
            validate(&msg),
            Err(ValidationError::CustomKeyCollision {
                key: "badge".to_string(),
            })
        );
    }

    #[test]
    fn apns_structured_alert_loc_pairs() {
        let mut msg = token_message();
        msg.apns = Some(ApnsConfig {
            payload: Some(ApnsPayload {
                aps: Some(Aps {
                    alert: Some(ApsAlert {
                        sub_title_loc_args: vec!["x".to_string()],
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(
            validate(&msg),
            Err(ValidationError::MissingLocKey {
                key_field: "subtitle-loc-key",
                args_field: "subtitle-loc-args",
            })
        );
    }

    #[test]
    fn apns_options_image_url_is_checked() {
        let mut msg = token_message();
        msg.apns = Some(ApnsConfig {
            fcm_options: Some(ApnsFcmOptions {
                image_url: "nope".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(matches!(
            validate(&msg),
            Err(ValidationError::InvalidImageUrl { .. })
        ));
    }
}
