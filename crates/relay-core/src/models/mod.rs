//! Data models for the relay

mod service_info;
mod snapshot;
mod sync_code;

pub use service_info::ServiceInfo;
pub use snapshot::{NotificationPayload, NotificationSnapshot};
pub use sync_code::{mask_code, SyncCode};
