//! Toast-reporting capability.
//!
//! The HTTP client and the notification synchronizer surface user-facing
//! errors through this seam but do not own its rendering. The UI layer
//! injects its own implementation at construction time.

/// How prominently a toast should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastSeverity {
    Success,
    Info,
    Warning,
    Error,
}

/// Capability to report a transient message with a severity.
pub trait ToastReporter: Send + Sync {
    fn show(&self, message: &str, severity: ToastSeverity);
}

/// Reporter that drops every toast. Useful for headless callers and tests
/// that don't assert on toast output.
pub struct NullToast;

impl ToastReporter for NullToast {
    fn show(&self, _message: &str, _severity: ToastSeverity) {}
}

/// Reporter that forwards toasts to the `tracing` log stream.
///
/// Default for non-UI consumers of the client (scripts, background jobs).
pub struct TracingToast;

impl ToastReporter for TracingToast {
    fn show(&self, message: &str, severity: ToastSeverity) {
        match severity {
            ToastSeverity::Error => tracing::error!(toast = message),
            ToastSeverity::Warning => tracing::warn!(toast = message),
            ToastSeverity::Success | ToastSeverity::Info => tracing::info!(toast = message),
        }
    }
}
