// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Server-side registered client record.
//!
//! The raw bearer API key is stored nowhere; only its SHA-256 hash is
//! persisted, so a database leak does not hand out usable credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ClientId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredClient {
    pub id: ClientId,
    /// Hex-encoded SHA-256 hash of the bearer API key.
    pub api_key_hash: String,
    pub device_name: String,
    pub device_type: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub active: bool,
}
