// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! The singleton settings row: word-wrap default, auto-lock timeout, and
//! default sort order. Not encrypted, since none of it is note content.

use async_trait::async_trait;

use crate::entities::{Settings, SettingsPatch};
use crate::error::JotteryError;

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Returns [`Settings::default`] if no row has been written yet,
    /// rather than `None` — callers never have to special-case "not
    /// configured".
    async fn get(&self) -> Result<Settings, JotteryError>;

    /// Applies `patch` over the current row (or the default, if none
    /// exists yet) and persists the result, returning it.
    async fn update(&self, patch: &SettingsPatch) -> Result<Settings, JotteryError>;

    /// Deletes the row, reverting subsequent `get` calls to
    /// [`Settings::default`].
    async fn reset(&self) -> Result<(), JotteryError>;

    /// Whether a row has ever been written (distinct from it existing
    /// with every field left at its default).
    async fn exists(&self) -> Result<bool, JotteryError>;
}
