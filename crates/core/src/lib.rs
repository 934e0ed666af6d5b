//! Shared vocabulary for the Glowdesk client core.
//!
//! Holds the types every other crate speaks: entity id and timestamp
//! aliases, the [`Notification`](notification::Notification) data model,
//! the toast-reporting capability, and the session token pair with its
//! persistence seam.

pub mod notification;
pub mod session;
pub mod toast;
pub mod types;
