// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure
//!
//! Everything that touches the outside world: the crypto envelope, the
//! SQLite-backed repositories, environment configuration, and logging
//! setup. The application and server layers depend on this module through
//! the trait seams declared in `jottery_domain::repositories`; nothing
//! outside this module talks to `sqlx`, `aes_gcm`, or `ring` directly.

pub mod config;
pub mod crypto;
pub mod http;
pub mod logging;
pub mod repositories;
