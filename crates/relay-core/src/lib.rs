//! relay-core - Core library for the notification relay
//!
//! This crate contains the shared models, the local snapshot store, the
//! remote document client, and the change-detection loop used by the
//! relay agent.

pub mod config;
pub mod detector;
pub mod error;
pub mod models;
pub mod permission;
pub mod remote;
pub mod store;
pub mod util;

pub use error::{Error, Result};
pub use models::{NotificationPayload, NotificationSnapshot, SyncCode};
