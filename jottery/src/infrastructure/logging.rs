// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Structured logging setup, shared by both binaries.
//!
//! A thin `init()` wraps `tracing-subscriber`'s `EnvFilter` so `RUST_LOG`
//! always takes precedence; the configured `log_level` is only the floor
//! used when `RUST_LOG` is unset. Server request spans and CLI command
//! spans are opened by their respective callers, not here.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber. Call once per binary, as
/// early in `main` as possible.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
