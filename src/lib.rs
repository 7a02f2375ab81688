//! Firebase Cloud Messaging (FCM) HTTP v1 message model.
//!
//! Build one semantic [`Message`], validate it with [`validate::validate`],
//! and serialize it with `serde_json` to the exact wire document the v1 API
//! expects: per-platform override blocks, flat custom-data merging, enum
//! string tokens and the duration/color micro-formats.
//!
//! The codec and validation core is pure and synchronous; [`client`] is a
//! thin, swappable send path on top of it.

pub mod android;
pub mod apns;
pub mod client;
pub mod errors;
pub mod message;
pub mod validate;
pub mod webpush;
pub mod wire;

// Re-export commonly used types for convenience
pub use android::{
    AndroidConfig, AndroidFcmOptions, AndroidNotification, AndroidNotificationPriority,
    AndroidNotificationProxy, AndroidNotificationVisibility, LightSettings,
};
pub use apns::{ApnsConfig, ApnsFcmOptions, ApnsPayload, Aps, ApsAlert, CriticalSound};
pub use client::{Client, ClientConfig, PushSender};
pub use errors::{ClientError, FormatError, ValidationError};
pub use message::{FcmOptions, Message, Notification};
pub use webpush::{
    WebpushConfig, WebpushFcmOptions, WebpushNotification, WebpushNotificationAction,
};
