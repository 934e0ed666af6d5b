//! Authenticated HTTP client for the Glowdesk backend.
//!
//! [`ApiClient`](http::ApiClient) attaches the session's bearer token to
//! every outbound call and transparently recovers from expired access
//! tokens: concurrent requests that hit a 401 share a single refresh
//! operation coordinated by [`SessionManager`](session::SessionManager).
//! Every other failure class is reported once through the injected toast
//! collaborator and returned to the caller.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
