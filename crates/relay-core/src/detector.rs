//! Notification change detection and sync loop.
//!
//! On a fixed cadence the detector reads the snapshot the platform
//! listener persisted, compares it against the last snapshot it already
//! processed, and hands accepted changes to a remote writer. The writer
//! runs as its own task behind a single-slot channel: at most one upsert
//! is in flight and a newer accepted payload supersedes an older queued
//! one, so writes to the same remote document never interleave.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::models::{NotificationPayload, NotificationSnapshot, SyncCode};
use crate::remote::{DocumentClient, NOTIFICATION_COLLECTION};
use crate::store::{SnapshotStore, LAST_NOTIFICATION_KEY};

/// App whose `bigText`-only changes are suppressed: the system UI keeps
/// rewriting its notification body without carrying new content. Title
/// and text changes from it still pass.
pub const EXCLUDED_SYSTEM_APP: &str = "com.android.systemui";

/// Default poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Decide whether `candidate` carries new information relative to the
/// last processed snapshot.
///
/// Accepted when `title` or `text` changed for any app, or when
/// `big_text` changed for any app other than the system UI. An absent
/// processed snapshot compares as all-empty, so the first meaningful
/// snapshot is always accepted.
pub fn is_accepted(
    candidate: &NotificationSnapshot,
    processed: Option<&NotificationSnapshot>,
) -> bool {
    let empty = NotificationSnapshot::default();
    let processed = processed.unwrap_or(&empty);

    if candidate.title != processed.title || candidate.text != processed.text {
        return true;
    }

    candidate.big_text != processed.big_text
        && candidate.app.as_deref() != Some(EXCLUDED_SYSTEM_APP)
}

/// What a single poll tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No snapshot stored yet; nothing to do.
    Empty,
    /// Stored snapshot could not be read or parsed; state untouched.
    Skipped,
    /// Snapshot matched the processed one; nothing forwarded.
    Unchanged,
    /// Snapshot accepted and handed to the remote writer.
    Forwarded,
    /// Snapshot accepted, but no sync code is configured, so the remote
    /// write was skipped. Processed state is still replaced.
    AcceptedWithoutCode,
}

/// A queued remote write: the document id and its full new body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteRequest {
    pub code: SyncCode,
    pub payload: NotificationPayload,
}

/// Build a connected detector/writer pair.
///
/// The two halves run as separate tasks; the watch channel between them
/// is the single-slot write queue.
pub fn pipeline<S, C>(
    store: S,
    client: C,
    sync_code: Option<SyncCode>,
) -> (ChangeDetector<S>, RemoteWriter<C>) {
    let (writes, requests) = watch::channel(None);
    (
        ChangeDetector {
            store,
            processed: None,
            sync_code,
            poll_interval: DEFAULT_POLL_INTERVAL,
            writes,
        },
        RemoteWriter { client, requests },
    )
}

/// Polls the local store and decides which snapshots to forward.
pub struct ChangeDetector<S> {
    store: S,
    processed: Option<NotificationSnapshot>,
    sync_code: Option<SyncCode>,
    poll_interval: Duration,
    writes: watch::Sender<Option<WriteRequest>>,
}

impl<S: SnapshotStore> ChangeDetector<S> {
    /// Override the poll cadence (tests use a short one).
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The last snapshot accepted by the detector.
    pub const fn processed(&self) -> Option<&NotificationSnapshot> {
        self.processed.as_ref()
    }

    /// Replace the sync code used for subsequent writes. The code is read
    /// from memory at the moment of each accepted change, so a change
    /// here redirects the next write without touching in-flight ones.
    pub fn set_sync_code(&mut self, code: Option<SyncCode>) {
        self.sync_code = code;
    }

    /// Execute one poll tick.
    pub async fn tick(&mut self) -> TickOutcome {
        let raw = match self.store.get(LAST_NOTIFICATION_KEY).await {
            Ok(value) => value,
            Err(error) => {
                warn!("snapshot read failed, treating as absent: {error}");
                return TickOutcome::Skipped;
            }
        };
        let Some(raw) = raw else {
            return TickOutcome::Empty;
        };

        let candidate = match NotificationSnapshot::from_json(&raw) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!("stored snapshot is malformed, skipping tick: {error}");
                return TickOutcome::Skipped;
            }
        };

        if !is_accepted(&candidate, self.processed.as_ref()) {
            return TickOutcome::Unchanged;
        }

        let payload = candidate.payload();
        self.processed = Some(candidate);

        let Some(code) = self.sync_code.clone() else {
            warn!("notification changed but no sync code is configured, skipping remote write");
            return TickOutcome::AcceptedWithoutCode;
        };

        debug!(code = %code, "handing accepted change to the remote writer");
        if self.writes.send(Some(WriteRequest { code, payload })).is_err() {
            warn!("remote writer has stopped, dropping write");
        }
        TickOutcome::Forwarded
    }

    /// Run the poll loop until `shutdown` flips to true.
    ///
    /// The interval is owned by this loop, so there is never more than
    /// one armed timer; after an accepted change it is reset, restarting
    /// the 3-second phase the same way the timer used to be rearmed.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval =
            tokio::time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?self.poll_interval, "change detector started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.tick().await == TickOutcome::Forwarded {
                        interval.reset();
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("change detector stopped");
    }
}

/// Consumes queued write requests and issues the remote upserts.
///
/// Failures are logged and never reach the detector's control flow.
pub struct RemoteWriter<C> {
    client: C,
    requests: watch::Receiver<Option<WriteRequest>>,
}

impl<C: DocumentClient> RemoteWriter<C> {
    /// Run until `shutdown` flips to true or the detector goes away.
    /// A write already picked up is finished before shutdown is observed.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                biased;

                changed = self.requests.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let request = self.requests.borrow_and_update().clone();
                    let Some(request) = request else { continue };
                    self.write(&request).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("remote writer stopped");
    }

    async fn write(&self, request: &WriteRequest) {
        match self
            .client
            .upsert_document(
                NOTIFICATION_COLLECTION,
                request.code.as_str(),
                &request.payload,
            )
            .await
        {
            Ok(()) => info!(code = %request.code, "notification forwarded"),
            Err(error) => warn!("remote write failed: {error}"),
        }
    }
}
