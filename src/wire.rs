//! Micro-format codecs shared across the platform blocks.
//!
//! FCM carries durations as `"{seconds}s"` strings with an optional
//! nine-digit nanosecond fraction, and LED colors as normalized RGBA float
//! objects backed by `#RRGGBB`/`#RRGGBBAA` strings. Both formats have their
//! own parse rules independent of the surrounding JSON document.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::FormatError;

/// Formats a duration the way the FCM v1 API expects: `"90s"`, or
/// `"1.500000000s"` when there is a sub-second remainder.
pub fn duration_to_string(d: Duration) -> String {
    let seconds = d.as_secs();
    let nanos = d.subsec_nanos();
    if nanos > 0 {
        format!("{seconds}.{nanos:09}s")
    } else {
        format!("{seconds}s")
    }
}

/// Parses an FCM duration string back into a native duration.
///
/// Accepts at most one `.` separating integer seconds from an integer
/// nanosecond fraction. Negative durations are unrepresentable and rejected.
pub fn string_to_duration(s: &str) -> Result<Duration, FormatError> {
    let trimmed = s.strip_suffix('s').unwrap_or(s);
    let segments: Vec<&str> = trimmed.split('.').collect();
    if segments.len() != 1 && segments.len() != 2 {
        return Err(FormatError::DurationSegments {
            value: s.to_string(),
        });
    }

    let seconds: u64 = segments[0].parse().map_err(|_| FormatError::DurationParse {
        value: s.to_string(),
    })?;
    let mut out = Duration::from_secs(seconds);

    if segments.len() == 2 {
        let nanos: u64 = segments[1]
            .trim_start_matches('0')
            .parse()
            .map_err(|_| FormatError::DurationParse {
                value: s.to_string(),
            })?;
        out += Duration::from_nanos(nanos);
    }
    Ok(out)
}

/// Normalized RGBA color as it appears inside `light_settings` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    /// Parses a `#RRGGBB` or `#RRGGBBAA` hex string; alpha defaults to opaque.
    pub fn parse(s: &str) -> Result<Self, FormatError> {
        let syntax_err = || FormatError::ColorSyntax {
            value: s.to_string(),
        };
        let hex = s.strip_prefix('#').ok_or_else(syntax_err)?;
        if (hex.len() != 6 && hex.len() != 8) || !hex.is_ascii() {
            return Err(syntax_err());
        }

        let channel = |range: std::ops::Range<usize>| -> Result<f64, FormatError> {
            u8::from_str_radix(&hex[range], 16)
                .map(|v| f64::from(v) / 255.0)
                .map_err(|_| syntax_err())
        };

        Ok(Self {
            red: channel(0..2)?,
            green: channel(2..4)?,
            blue: channel(4..6)?,
            alpha: if hex.len() == 8 { channel(6..8)? } else { 1.0 },
        })
    }

    /// Renders back to hex. The alpha pair is omitted when fully opaque.
    pub fn to_hex(self) -> String {
        let denorm = |v: f64| (v * 255.0) as u8;
        let (r, g, b, a) = (
            denorm(self.red),
            denorm(self.green),
            denorm(self.blue),
            denorm(self.alpha),
        );
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

/// Overlays a caller-supplied custom bag on top of the standard-field map.
/// Custom entries win on key collision; validation rejects such collisions
/// before encoding ever runs, so in practice the overlay is disjoint.
pub(crate) fn merge_custom(
    mut standard: Map<String, Value>,
    custom: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    if let Some(extra) = custom {
        for (key, value) in extra {
            standard.insert(key.clone(), value.clone());
        }
    }
    standard
}

/// Removes every standard key by name, present or not, and returns whatever
/// is left as the custom bag. An empty remainder decodes as no bag at all.
pub(crate) fn split_custom(
    mut all: Map<String, Value>,
    standard_keys: &[&str],
) -> Option<Map<String, Value>> {
    for key in standard_keys {
        all.remove(*key);
    }
    if all.is_empty() {
        None
    } else {
        Some(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds_have_no_fraction() {
        assert_eq!(duration_to_string(Duration::from_secs(90)), "90s");
        assert_eq!(duration_to_string(Duration::ZERO), "0s");
    }

    #[test]
    fn subsecond_remainder_is_nine_digits() {
        assert_eq!(duration_to_string(Duration::from_millis(1500)), "1.500000000s");
        assert_eq!(duration_to_string(Duration::from_nanos(1)), "0.000000001s");
    }

    #[test]
    fn duration_round_trips() {
        for d in [
            Duration::ZERO,
            Duration::from_secs(3),
            Duration::from_millis(4500),
            Duration::from_nanos(123_456_789),
        ] {
            assert_eq!(string_to_duration(&duration_to_string(d)).unwrap(), d);
        }
    }

    #[test]
    fn duration_parse_accepts_plain_seconds() {
        assert_eq!(string_to_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(string_to_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn duration_parse_rejects_garbage() {
        assert!(matches!(
            string_to_duration("1.2.3s"),
            Err(FormatError::DurationSegments { .. })
        ));
        assert!(matches!(
            string_to_duration("abcs"),
            Err(FormatError::DurationParse { .. })
        ));
        assert!(matches!(
            string_to_duration("-5s"),
            Err(FormatError::DurationParse { .. })
        ));
    }

    #[test]
    fn color_parse_normalizes_channels() {
        let red = Color::parse("#FF0000").unwrap();
        assert_eq!(red, Color { red: 1.0, green: 0.0, blue: 0.0, alpha: 1.0 });

        let translucent = Color::parse("#FF000080").unwrap();
        assert!((translucent.alpha - 128.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn color_encode_omits_opaque_alpha() {
        assert_eq!(Color::parse("#FF0000").unwrap().to_hex(), "#FF0000");
        assert_eq!(Color::parse("#FF0000FF").unwrap().to_hex(), "#FF0000");
        assert_eq!(Color::parse("#FF000080").unwrap().to_hex(), "#FF000080");
        assert_eq!(Color::parse("#0102030a").unwrap().to_hex(), "#0102030A");
    }

    #[test]
    fn color_parse_rejects_bad_input() {
        for bad in ["FF0000", "#F00", "#GG0000", "#FF00001", "#FF0000800"] {
            assert!(matches!(Color::parse(bad), Err(FormatError::ColorSyntax { .. })), "{bad}");
        }
    }

    #[test]
    fn custom_bag_overlay_wins_on_collision() {
        let mut standard = Map::new();
        standard.insert("title".to_string(), Value::String("T".to_string()));
        let mut custom = Map::new();
        custom.insert("title".to_string(), Value::String("X".to_string()));
        custom.insert("foo".to_string(), Value::String("bar".to_string()));

        let merged = merge_custom(standard, Some(&custom));
        assert_eq!(merged["title"], "X");
        assert_eq!(merged["foo"], "bar");
    }

    #[test]
    fn split_removes_standard_keys_by_name() {
        let mut all = Map::new();
        all.insert("title".to_string(), Value::String(String::new()));
        all.insert("foo".to_string(), Value::String("bar".to_string()));

        let custom = split_custom(all.clone(), &["title", "body"]).unwrap();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom["foo"], "bar");

        assert!(split_custom(all, &["title", "foo"]).is_none());
    }
}
