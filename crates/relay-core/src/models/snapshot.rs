//! Notification snapshot model
//!
//! Mirrors the JSON document the Android listener persists under the
//! `@lastNotification` key, hence the camelCase wire names. Every field
//! is optional; the platform omits whatever a notification does not set.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The most recently observed notification, as persisted by the listener.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationSnapshot {
    /// Source application identifier, e.g. `com.whatsapp`.
    pub app: Option<String>,
    pub title: Option<String>,
    pub title_big: Option<String>,
    pub text: Option<String>,
    pub big_text: Option<String>,
    pub sub_text: Option<String>,
    pub summary_text: Option<String>,
    pub time: Option<String>,
    #[serde(rename = "audioContentsURI")]
    pub audio_contents_uri: Option<String>,
    #[serde(rename = "imageBackgroundURI")]
    pub image_background_uri: Option<String>,
    pub extra_info_text: Option<String>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub icon_large: Option<String>,
}

impl NotificationSnapshot {
    /// Parse a snapshot from the serialized form the listener stores.
    ///
    /// Unknown fields are ignored so newer listener builds can add fields
    /// without breaking older agents.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// A snapshot carries information only if one of the three forwarded
    /// fields is present; all-absent means "no notification yet".
    pub fn is_meaningful(&self) -> bool {
        self.title.is_some() || self.text.is_some() || self.big_text.is_some()
    }

    /// Project the three forwarded fields, copied verbatim.
    pub fn payload(&self) -> NotificationPayload {
        NotificationPayload {
            title: self.title.clone(),
            text: self.text.clone(),
            big_text: self.big_text.clone(),
        }
    }
}

/// The full body of the remote notification document.
///
/// Absent fields serialize as explicit nulls: the remote write is a full
/// overwrite, so every document always carries exactly these three keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: Option<String>,
    pub text: Option<String>,
    pub big_text: Option<String>,
}
