//! Notification-access permission tracking.
//!
//! The monitor re-checks the OS permission on app-foreground transitions
//! and on an explicit forced check at startup. `unknown` counts as
//! permitted: the optimistic default keeps the indicator green until the
//! platform actually says no.

use tracing::{debug, warn};

use crate::error::Result;

/// OS notification-access status as reported by the platform bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Unknown,
}

impl PermissionStatus {
    /// Parse the status string the bridge writes. Anything unrecognized
    /// maps to `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "granted" => Self::Granted,
            "denied" => Self::Denied,
            _ => Self::Unknown,
        }
    }

    /// Everything except an explicit denial counts as permitted.
    pub const fn is_permitted(self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// Application lifecycle state, as delivered by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    Active,
    Background,
    Inactive,
}

/// Trait for the platform facility that owns notification access.
#[allow(async_fn_in_trait)]
pub trait NotificationSource {
    /// Query the current notification-access status.
    async fn permission_status(&self) -> Result<PermissionStatus>;

    /// Ask the OS to surface its permission settings. Fire-and-forget;
    /// the caller never consumes a result beyond logging.
    async fn request_permission(&self) -> Result<()>;
}

/// Tracks whether the process currently holds notification access.
pub struct PermissionMonitor<N> {
    source: N,
    has_permission: bool,
}

impl<N: NotificationSource> PermissionMonitor<N> {
    pub const fn new(source: N) -> Self {
        Self {
            source,
            has_permission: false,
        }
    }

    pub const fn has_permission(&self) -> bool {
        self.has_permission
    }

    /// React to a lifecycle transition. Only the transition into the
    /// foreground (or a forced check) triggers a query; a failed query
    /// leaves the previous value unchanged.
    pub async fn handle_app_state(&mut self, state: AppState, force: bool) {
        if state != AppState::Active && !force {
            return;
        }

        match self.source.permission_status().await {
            Ok(status) => {
                self.has_permission = status.is_permitted();
                debug!(?status, has_permission = self.has_permission, "permission status updated");
            }
            Err(error) => {
                debug!("permission status query failed, keeping previous value: {error}");
            }
        }
    }

    /// Request the OS permission surface. Outcome is only logged.
    pub async fn request_permission(&self) {
        if let Err(error) = self.source.request_permission().await {
            warn!("permission request failed: {error}");
        }
    }
}
