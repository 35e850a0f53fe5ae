//! Best-effort user notification side channel.
//!
//! # Responsibility
//! - Gate dispatch on the platform permission state.
//! - Keep notification failures from ever failing a lifecycle operation.
//!
//! # Invariants
//! - `Default -> Granted | Denied` happens only through
//!   `NotificationGateway::request_permission`.
//! - A skipped dispatch is silent to the caller.

mod gateway;

pub use gateway::{
    LogNotificationBackend, NotificationBackend, NotificationGateway, PermissionState,
    UnsupportedBackend,
};
