//! Real-time notification synchronizer for the Glowdesk dashboard.
//!
//! Keeps a local, always-consistent view of the authenticated user's
//! notifications: an initial pull through the REST backend, ongoing push
//! updates over a WebSocket channel scoped to the business, and
//! imperative actions that confirm with the backend before mutating
//! local state. The unread count is maintained in lockstep with the
//! list by every mutation path.

pub mod api;
pub mod backoff;
pub mod channel;
pub mod messages;
pub mod store;
pub mod sync;
