// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Local, unencrypted presentation preferences: one row per store, never
//! synced. Unlike [`crate::entities::EncryptionMetadata`] this singleton is
//! meant to be updated in place over the store's lifetime.

use serde::{Deserialize, Serialize};

use crate::value_objects::SortOrder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Default for a new note's `word_wrap` flag.
    pub word_wrap_default: bool,
    /// Minutes of inactivity before the key manager auto-locks.
    pub auto_lock_minutes: u32,
    /// Default list ordering, applied until the caller picks another.
    pub default_sort: SortOrder,
}

impl Settings {
    pub const DEFAULT_AUTO_LOCK_MINUTES: u32 = 15;

    /// Applies `patch` over `self` field by field; a `None` leaves the
    /// existing value untouched. Used by [`SettingsRepository::update`](crate::repositories::SettingsRepository::update)'s
    /// merge semantics.
    pub fn merge(&self, patch: &SettingsPatch) -> Self {
        Self {
            word_wrap_default: patch.word_wrap_default.unwrap_or(self.word_wrap_default),
            auto_lock_minutes: patch.auto_lock_minutes.unwrap_or(self.auto_lock_minutes),
            default_sort: patch.default_sort.unwrap_or(self.default_sort),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            word_wrap_default: true,
            auto_lock_minutes: Self::DEFAULT_AUTO_LOCK_MINUTES,
            default_sort: SortOrder::default(),
        }
    }
}

/// A partial [`Settings`] update; every field is independently optional.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub word_wrap_default: Option<bool>,
    pub auto_lock_minutes: Option<u32>,
    pub default_sort: Option<SortOrder>,
}
