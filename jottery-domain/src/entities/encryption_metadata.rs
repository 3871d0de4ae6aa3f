// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Encryption metadata: one row per local store, immutable after the store
//! is first initialized. Changing the password or the iteration count
//! requires a full re-encryption pass, which is explicitly out of scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    /// Raw PBKDF2 salt, 32 bytes.
    pub salt: Vec<u8>,
    pub iterations: u32,
    pub created_at: DateTime<Utc>,
    /// Fixed to `"AES-256-GCM"` today; recorded so a future store can carry
    /// a different algorithm without guessing at what an older store used.
    pub algorithm: String,
}

impl EncryptionMetadata {
    pub const DEFAULT_ITERATIONS: u32 = 100_000;
    pub const ALGORITHM: &'static str = "AES-256-GCM";

    pub fn new(salt: Vec<u8>) -> Self {
        Self {
            salt,
            iterations: Self::DEFAULT_ITERATIONS,
            created_at: Utc::now(),
            algorithm: Self::ALGORITHM.to_string(),
        }
    }
}
