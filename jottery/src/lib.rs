// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # jottery
//!
//! The application, infrastructure, and server layers built on top of
//! `jottery-domain`. This crate houses everything that actually touches
//! SQLite, the network, or the process environment; the two binaries
//! (`jottery`, `jottery-server`) are thin wiring over what lives here.

pub mod application;
pub mod infrastructure;
pub mod server;
