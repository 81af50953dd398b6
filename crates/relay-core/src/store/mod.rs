//! Local snapshot store
//!
//! Key-value persistence shared with the out-of-process platform
//! listener: the listener writes the latest notification snapshot and
//! mirrors the OS permission status; the relay reads those and owns the
//! sync code.

use std::path::Path;

use libsql::{Builder, Connection};

use crate::error::Result;
use crate::models::{NotificationSnapshot, SyncCode};

/// Key holding the serialized snapshot written by the platform listener.
pub const LAST_NOTIFICATION_KEY: &str = "@lastNotification";
/// Key holding the user-entered sync code.
pub const SYNC_CODE_KEY: &str = "notiCode";
/// Key the listener mirrors the OS notification-access status into.
pub const PERMISSION_STATUS_KEY: &str = "permissionStatus";
/// Key recording when the relay last asked for notification access.
pub const PERMISSION_REQUESTED_AT_KEY: &str = "permissionRequestedAt";

/// Trait for async key-value access to the shared store.
#[allow(async_fn_in_trait)]
pub trait SnapshotStore {
    /// Read a value; absent keys are `None`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, overwriting any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// libSQL-backed implementation of `SnapshotStore`.
///
/// Cloning is cheap and clones share the same underlying connection.
#[derive(Clone)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store at the given path, creating it if it doesn't exist.
    ///
    /// Runs the migration automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        let conn = db.connect()?;

        let store = Self { conn };
        store.configure().await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Open an in-memory store (useful for testing).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;

        let store = Self { conn };
        store.configure().await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Configure `SQLite` for concurrent listener/relay access.
    async fn configure(&self) -> Result<()> {
        // WAL lets the listener keep writing while the relay polls.
        self.conn.execute("PRAGMA journal_mode = WAL;", ()).await.ok();
        self.conn
            .execute("PRAGMA synchronous = NORMAL;", ())
            .await
            .ok();
        Ok(())
    }

    async fn migrate(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                (),
            )
            .await?;
        Ok(())
    }

    /// Load and parse the last notification snapshot, if any.
    pub async fn load_snapshot(&self) -> Result<Option<NotificationSnapshot>> {
        match self.get(LAST_NOTIFICATION_KEY).await? {
            Some(raw) => Ok(Some(NotificationSnapshot::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    /// Load the configured sync code, if any.
    ///
    /// A stored-but-blank code reads as absent.
    pub async fn load_sync_code(&self) -> Result<Option<SyncCode>> {
        Ok(self
            .get(SYNC_CODE_KEY)
            .await?
            .and_then(|raw| SyncCode::new(raw).ok()))
    }

    /// Persist the sync code.
    pub async fn store_sync_code(&self, code: &SyncCode) -> Result<()> {
        self.set(SYNC_CODE_KEY, code.as_str()).await
    }
}

impl SnapshotStore for Store {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM kv WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis().to_string();
        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                [key, value, now.as_str()],
            )
            .await?;
        Ok(())
    }
}
