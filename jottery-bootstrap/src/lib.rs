// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # jottery-bootstrap
//!
//! Entry-point concerns that sit outside the domain/application/
//! infrastructure layers: CLI argument validation, OS signal handling,
//! graceful shutdown coordination, and exit-code mapping. Both binaries
//! (`jottery`, `jottery-server`) depend on this crate; nothing in
//! `jottery-domain` or `jottery`'s application/infrastructure modules
//! depends back on it.

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod shutdown;

pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};
pub use shutdown::{listen_for_signals, CancellationToken, ShutdownCoordinator};
