// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `GET /api/v1/sync/status`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ClientId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub client_id: ClientId,
    pub server_last_modified: Option<DateTime<Utc>>,
    pub note_count: u64,
    pub last_synced_at: Option<DateTime<Utc>>,
}
