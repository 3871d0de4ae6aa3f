// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `POST /api/v1/auth/register`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ClientId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Web,
    Cli,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub device_name: String,
    pub device_type: DeviceType,
}

/// The plaintext API key is present exactly once, in this response. No
/// other endpoint ever returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub api_key: String,
    pub client_id: ClientId,
    pub created_at: DateTime<Utc>,
}
