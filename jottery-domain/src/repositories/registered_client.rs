// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Server-side registered client lookup and bookkeeping.

use async_trait::async_trait;

use crate::entities::RegisteredClient;
use crate::error::JotteryError;
use crate::value_objects::ClientId;

#[async_trait]
pub trait RegisteredClientRepository: Send + Sync {
    async fn insert(&self, client: &RegisteredClient) -> Result<(), JotteryError>;

    async fn get_by_id(&self, id: ClientId) -> Result<Option<RegisteredClient>, JotteryError>;

    /// Looked up on every authenticated request; `api_key_hash` is the
    /// hex-encoded SHA-256 digest of the bearer token presented.
    async fn get_by_api_key_hash(&self, api_key_hash: &str) -> Result<Option<RegisteredClient>, JotteryError>;

    async fn touch_last_seen(&self, id: ClientId) -> Result<(), JotteryError>;

    async fn deactivate(&self, id: ClientId) -> Result<(), JotteryError>;
}
