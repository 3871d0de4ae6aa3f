// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `POST /api/v1/sync/push`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Note;
use crate::value_objects::NoteId;
use crate::wire::pull::AttachmentPayload;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    pub notes: Vec<Note>,
    pub attachments: Vec<AttachmentPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedNote {
    pub id: NoteId,
    pub server_version: u64,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedNote {
    pub id: NoteId,
    pub reason: String,
    pub server_modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    pub accepted: Vec<AcceptedNote>,
    pub rejected: Vec<RejectedNote>,
    pub errors: Vec<String>,
}
