// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Bootstrap-phase logging abstraction.
//!
//! `jottery::infrastructure::logging` owns the real `tracing-subscriber`
//! setup once the application is running; this module exists for the
//! narrow window before that subscriber is installed (argument parsing,
//! config loading) where a trait-based logger lets bootstrap code stay
//! testable without a global subscriber.

pub trait BootstrapLogger: Send + Sync {
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
}

/// Routes bootstrap messages through `tracing`, same as the rest of the
/// application once the subscriber is installed; before that, they fall
/// back to `tracing`'s own no-subscriber behavior (silently dropped),
/// which is acceptable for the brief pre-init window this type covers.
pub struct ConsoleLogger;

impl BootstrapLogger for ConsoleLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "bootstrap", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "bootstrap", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "bootstrap", "{message}");
    }
}

/// Discards everything; used by tests that exercise bootstrap logic
/// without wanting log output.
pub struct NoOpLogger;

impl BootstrapLogger for NoOpLogger {
    fn error(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
}
