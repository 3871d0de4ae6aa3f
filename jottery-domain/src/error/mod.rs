// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error Module
//!
//! A single, flat error enum shared by every layer: the crypto envelope, the
//! local store, the note service, the sync engine, and the server core all
//! return `JotteryError`. Callers pattern-match on the variant to recover;
//! nothing here is a string-typed catch-all.

mod jottery_error;

pub use jottery_error::JotteryError;
