//! Store-backed bridge to the platform notification listener.
//!
//! The Android listener process owns the OS-facing side: it writes
//! snapshots, mirrors its notification-access status into the shared
//! store, and watches for permission requests. This bridge is the
//! relay's view of that contract.

use chrono::Utc;
use relay_core::permission::{NotificationSource, PermissionStatus};
use relay_core::store::{
    SnapshotStore, Store, PERMISSION_REQUESTED_AT_KEY, PERMISSION_STATUS_KEY,
};
use relay_core::Result;

/// `NotificationSource` backed by the shared key-value store.
pub struct StoreBridge {
    store: Store,
}

impl StoreBridge {
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

impl NotificationSource for StoreBridge {
    async fn permission_status(&self) -> Result<PermissionStatus> {
        let raw = self.store.get(PERMISSION_STATUS_KEY).await?;
        Ok(raw.map_or(PermissionStatus::Unknown, |value| {
            PermissionStatus::parse(&value)
        }))
    }

    async fn request_permission(&self) -> Result<()> {
        // The listener watches this key and opens the OS settings surface.
        let now = Utc::now().timestamp_millis().to_string();
        self.store.set(PERMISSION_REQUESTED_AT_KEY, &now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn absent_status_maps_to_unknown() {
        let store = Store::open_in_memory().await.unwrap();
        let bridge = StoreBridge::new(store);

        assert_eq!(
            bridge.permission_status().await.unwrap(),
            PermissionStatus::Unknown
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mirrored_status_is_parsed() {
        let store = Store::open_in_memory().await.unwrap();
        store.set(PERMISSION_STATUS_KEY, "denied").await.unwrap();
        let bridge = StoreBridge::new(store);

        assert_eq!(
            bridge.permission_status().await.unwrap(),
            PermissionStatus::Denied
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn request_permission_records_a_timestamp() {
        let store = Store::open_in_memory().await.unwrap();
        let bridge = StoreBridge::new(store.clone());

        bridge.request_permission().await.unwrap();

        let recorded = store
            .get(PERMISSION_REQUESTED_AT_KEY)
            .await
            .unwrap()
            .unwrap();
        assert!(recorded.parse::<i64>().unwrap() > 0);
    }
}
