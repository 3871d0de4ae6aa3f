// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # jottery-domain
//!
//! The pure core of the Jottery note system: entities, value objects, the
//! error taxonomy, repository contracts, and wire protocol DTOs shared by
//! the local store, note service, sync engine, and server core.
//!
//! This crate performs no I/O. It has no dependency on an async runtime,
//! a database driver, an HTTP client, or a logging framework — those
//! belong to the `jottery` crate, which implements the repository traits
//! defined here against SQLite and exposes them over HTTP and a CLI.

pub mod entities;
pub mod error;
pub mod repositories;
pub mod value_objects;
pub mod wire;

pub use error::JotteryError;
