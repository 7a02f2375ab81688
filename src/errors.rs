//! Error types for the FCM message codec and client.
//!
//! Three families: [`FormatError`] for malformed wire input on decode,
//! [`ValidationError`] for structurally valid but semantically invalid
//! messages, and [`ClientError`] for transport failures surfaced unchanged
//! from the send path.

use thiserror::Error;

/// Malformed micro-format input encountered while decoding a wire document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("incorrect number of segments in duration: {value:?}")]
    DurationSegments { value: String },

    #[error("failed to parse duration: {value:?}")]
    DurationParse { value: String },

    #[error("color must be in #RRGGBB or #RRGGBBAA form: {value:?}")]
    ColorSyntax { value: String },

    #[error("unknown {field} value: {value:?}")]
    UnknownEnumToken { field: &'static str, value: String },

    #[error("failed to parse event_time: {value:?}")]
    Timestamp { value: String },
}

/// A structurally valid message that violates a cross-field invariant.
///
/// Returned by [`crate::validate::validate`], which short-circuits on the
/// first failing rule. Every variant names the offending field or value so
/// the caller can fix its input without guessing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("exactly one of token, topic or condition must be specified, got {count}")]
    TargetCount { count: usize },

    #[error("malformed topic name: {topic:?}")]
    MalformedTopic { topic: String },

    #[error("invalid image URL: {url:?}")]
    InvalidImageUrl { url: String },

    #[error("priority must be 'normal' or 'high', got {value:?}")]
    InvalidAndroidPriority { value: String },

    #[error("color must be in the #RRGGBB form, got {value:?}")]
    InvalidColor { value: String },

    #[error("{key_field} is required when specifying {args_field}")]
    MissingLocKey {
        key_field: &'static str,
        args_field: &'static str,
    },

    #[error("vibrate timing must not be negative, got {millis}")]
    NegativeVibrateTiming { millis: i64 },

    #[error("light settings color must be in #RRGGBB or #RRGGBBAA form, got {value:?}")]
    InvalidLightColor { value: String },

    #[error("{field} must not be negative, got {millis}")]
    NegativeLightDuration { field: &'static str, millis: i64 },

    #[error("direction must be 'ltr', 'rtl' or 'auto', got {value:?}")]
    InvalidDirection { value: String },

    #[error("multiple specifications for the key {key:?}")]
    CustomKeyCollision { key: String },

    #[error("invalid link URL: {url:?}")]
    InvalidLinkUrl { url: String },

    #[error("link URL {url:?} must use the https scheme")]
    LinkSchemeNotHttps { url: String },

    #[error("multiple alert specifications")]
    MultipleAlerts,

    #[error("multiple sound specifications")]
    MultipleSounds,

    #[error("critical sound volume must be in the interval [0, 1], got {volume}")]
    VolumeOutOfRange { volume: f64 },
}

/// Failures from the thin send path.
///
/// The HTTP layer is a deliberately small collaborator: one deterministic
/// attempt per call, no retries. Transport errors pass through unchanged.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("project ID is required to access the FCM send endpoint")]
    MissingProjectId,

    #[error("access token not provided")]
    MissingAccessToken,

    #[error("invalid message: {0}")]
    Validation(#[from] ValidationError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("FCM returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse FCM response: {0}")]
    ResponseParse(#[source] serde_json::Error),
}
