// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Caller-selectable ordering for note listings.
//!
//! Pinned notes always precede unpinned ones; within each group this
//! selects the secondary ordering. Defined on the cleartext view, so only
//! the note service (which has already decrypted) can apply it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// `modifiedAt` descending.
    Recent,
    /// `modifiedAt` ascending.
    Oldest,
    /// `createdAt` descending.
    Created,
    /// First line of cleartext content, case-folded, locale-aware.
    Alpha,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Recent
    }
}
