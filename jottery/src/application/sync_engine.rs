// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! The sync engine: registration, credential export/import, and
//! bidirectional `syncNow` (push then pull) against a Jottery server.
//!
//! Transport is a trait seam ([`SyncTransport`]), the same
//! repository-trait-for-testability pattern the rest of the application
//! uses — the engine itself never touches `reqwest` directly, so its
//! push/pull/merge logic is testable against a fake transport. The real
//! implementation ([`crate::infrastructure::http::HttpSyncTransport`])
//! lives in infrastructure.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use jottery_domain::entities::{NoteSyncMetadata, SyncMetadataGlobal};
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::{
    AttachmentBlobRepository, AttachmentReferenceRepository, NoteFilter, NoteRepository, SyncMetadataRepository,
};
use jottery_domain::value_objects::{transition, ApiKey, ClientId, NoteId, SyncEvent, SyncStatus};
use jottery_domain::wire::{
    AttachmentPayload, CredentialPayload, DeviceType, PullRequest, PullResponse, PushRequest, PushResponse,
    RegisterRequest, RegisterResponse, StatusResponse,
};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument, warn};

use crate::infrastructure::crypto::{cipher, KeyManager};

/// Default auto-sync interval, minutes, per spec §4.4's registration step.
pub const DEFAULT_AUTO_SYNC_MINUTES: u32 = 5;

/// The transport seam a [`SyncEngine`] drives. One call per wire endpoint
/// in spec §6's table (`/health` is not modeled here; it carries no
/// authenticated state worth retrying against).
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn register(&self, endpoint: &str, request: RegisterRequest) -> Result<RegisterResponse, JotteryError>;

    async fn status(&self, endpoint: &str, api_key: &str) -> Result<StatusResponse, JotteryError>;

    async fn push(&self, endpoint: &str, api_key: &str, request: PushRequest) -> Result<PushResponse, JotteryError>;

    async fn pull(&self, endpoint: &str, api_key: &str, request: PullRequest) -> Result<PullResponse, JotteryError>;
}

/// Summary of one `syncNow` invocation, surfaced to the shell.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub pushed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub pulled_notes: usize,
    pub pulled_deletions: usize,
    /// Set when the optional status probe (step 3 of `syncNow`) failed;
    /// the sync itself still proceeds, per spec §4.4 ("tolerate failure").
    pub status_warning: Option<String>,
}

pub struct SyncEngine {
    notes: Arc<dyn NoteRepository>,
    attachment_blobs: Arc<dyn AttachmentBlobRepository>,
    attachment_refs: Arc<dyn AttachmentReferenceRepository>,
    sync_metadata: Arc<dyn SyncMetadataRepository>,
    key_manager: KeyManager,
    transport: Arc<dyn SyncTransport>,
    /// Serializes `syncNow` against itself; concurrent callers get
    /// `SyncInProgress` immediately rather than queuing (spec §4.4).
    in_flight: Arc<AsyncMutex<()>>,
}

impl SyncEngine {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        attachment_blobs: Arc<dyn AttachmentBlobRepository>,
        attachment_refs: Arc<dyn AttachmentReferenceRepository>,
        sync_metadata: Arc<dyn SyncMetadataRepository>,
        key_manager: KeyManager,
        transport: Arc<dyn SyncTransport>,
    ) -> Self {
        Self {
            notes,
            attachment_blobs,
            attachment_refs,
            sync_metadata,
            key_manager,
            transport,
            in_flight: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Registers this device, encrypts the returned API key under the
    /// master key, and persists global sync metadata. Returns the
    /// plaintext key so the shell can display it exactly once; the server
    /// never returns it again.
    #[instrument(level = "info", skip(self))]
    pub async fn register(&self, endpoint: &str, device_name: String, device_type: DeviceType) -> Result<String, JotteryError> {
        let key = self.key_manager.current_key().ok_or(JotteryError::Locked)?;
        let endpoint = normalize_endpoint(endpoint);

        let response = self
            .transport
            .register(&endpoint, RegisterRequest { device_name, device_type })
            .await?;

        let envelope = cipher::encrypt_text(&response.api_key, &key)?;

        let metadata = SyncMetadataGlobal {
            last_sync_at: None,
            last_push_attempt_at: None,
            last_pull_attempt_at: None,
            api_key: ApiKey::Encrypted {
                ciphertext: envelope.ciphertext,
                iv: envelope.iv,
            },
            client_id: Some(response.client_id.to_string()),
            sync_enabled: true,
            sync_endpoint: Some(endpoint),
            auto_sync_interval_minutes: DEFAULT_AUTO_SYNC_MINUTES,
        };
        self.sync_metadata.put_global(&metadata).await?;

        Ok(response.api_key)
    }

    /// Emits the base64-encoded JSON credential payload that seeds a
    /// second device, per spec §4.4. Requires the salt from encryption
    /// metadata, which this module does not own; callers pass it in
    /// since only the caller (which already holds an
    /// `EncryptionMetadataRepository`) knows it.
    #[instrument(level = "info", skip(self, salt))]
    pub async fn export_credentials(&self, salt: Vec<u8>) -> Result<String, JotteryError> {
        let key = self.key_manager.current_key().ok_or(JotteryError::Locked)?;
        let global = self.sync_metadata.get_global().await?;

        let endpoint = global.sync_endpoint.ok_or(JotteryError::SyncDisabled)?;
        let client_id: ClientId = global
            .client_id
            .ok_or(JotteryError::SyncDisabled)?
            .parse()
            .map_err(|_| JotteryError::InternalError("corrupt client id in sync metadata".into()))?;

        let api_key = match global.api_key {
            ApiKey::Encrypted { ciphertext, iv } => {
                let envelope = cipher::Envelope { ciphertext, iv };
                cipher::decrypt_text(&envelope, &key).map_err(|_| JotteryError::DecryptError)?
            }
            ApiKey::PendingImport(plaintext) => plaintext,
            ApiKey::Absent => return Err(JotteryError::SyncDisabled),
        };

        let payload = CredentialPayload { endpoint, client_id, api_key, salt };
        let json = serde_json::to_vec(&payload).map_err(|e| JotteryError::InternalError(e.to_string()))?;
        Ok(BASE64.encode(json))
    }

    /// Decodes and validates a credential payload, overwrites the local
    /// sync metadata with a `PendingImport` marker, and returns the salt
    /// the caller must write into encryption metadata before the next
    /// unlock. Per spec §4.5, this never deletes existing notes.
    #[instrument(level = "info", skip(self, encoded))]
    pub async fn import_credentials(&self, encoded: &str) -> Result<Vec<u8>, JotteryError> {
        let json = BASE64.decode(encoded.trim()).map_err(|_| JotteryError::InvalidInput {
            fields: vec!["credential payload is not valid base64".to_string()],
        })?;
        let payload: CredentialPayload = serde_json::from_slice(&json).map_err(|_| JotteryError::InvalidInput {
            fields: vec!["credential payload has an unexpected shape".to_string()],
        })?;

        let metadata = SyncMetadataGlobal {
            last_sync_at: None,
            last_push_attempt_at: None,
            last_pull_attempt_at: None,
            api_key: ApiKey::PendingImport(payload.api_key),
            client_id: Some(payload.client_id.to_string()),
            sync_enabled: false,
            sync_endpoint: Some(normalize_endpoint(&payload.endpoint)),
            auto_sync_interval_minutes: DEFAULT_AUTO_SYNC_MINUTES,
        };
        self.sync_metadata.put_global(&metadata).await?;

        Ok(payload.salt)
    }

    /// Detects a still-pending credential import after a successful
    /// unlock and completes it: encrypts the plaintext key under the
    /// freshly derived master key, rewrites the envelope, and re-enables
    /// sync. A no-op if there is nothing pending. Callers must invoke
    /// this immediately after every successful `KeyManager::unlock`.
    #[instrument(level = "info", skip(self))]
    pub async fn complete_pending_import(&self) -> Result<(), JotteryError> {
        let mut global = self.sync_metadata.get_global().await?;
        let ApiKey::PendingImport(plaintext) = global.api_key.clone() else {
            return Ok(());
        };

        let key = self.key_manager.current_key().ok_or(JotteryError::Locked)?;
        let envelope = cipher::encrypt_text(&plaintext, &key)?;
        global.api_key = ApiKey::Encrypted { ciphertext: envelope.ciphertext, iv: envelope.iv };
        global.sync_enabled = true;
        self.sync_metadata.put_global(&global).await?;
        info!("completed pending credential import");
        Ok(())
    }

    /// Bidirectional sync: push, then pull, per spec §4.4. Concurrent
    /// invocations return `SyncInProgress` immediately.
    #[instrument(level = "info", skip(self))]
    pub async fn sync_now(&self) -> Result<SyncOutcome, JotteryError> {
        let guard = self.in_flight.try_lock().map_err(|_| JotteryError::SyncInProgress)?;

        let result = self.sync_now_inner().await;

        drop(guard);
        result
    }

    async fn sync_now_inner(&self) -> Result<SyncOutcome, JotteryError> {
        let global = self.sync_metadata.get_global().await?;
        if !global.sync_enabled {
            return Err(JotteryError::SyncDisabled);
        }

        let key = self.key_manager.current_key().ok_or(JotteryError::Locked)?;
        let api_key = match &global.api_key {
            ApiKey::Encrypted { ciphertext, iv } => {
                let envelope = cipher::Envelope { ciphertext: ciphertext.clone(), iv: iv.clone() };
                cipher::decrypt_text(&envelope, &key).map_err(|_| JotteryError::DecryptError)?
            }
            ApiKey::PendingImport(_) => return Err(JotteryError::SyncDisabled),
            ApiKey::Absent => return Err(JotteryError::SyncDisabled),
        };
        let endpoint = global.sync_endpoint.clone().ok_or(JotteryError::SyncDisabled)?;

        let mut outcome = SyncOutcome::default();

        if let Err(e) = self.transport.status(&endpoint, &api_key).await {
            warn!(error = %e, "sync status probe failed, continuing anyway");
            outcome.status_warning = Some(e.to_string());
        }

        self.push(&endpoint, &api_key, &global, &mut outcome).await?;
        self.pull(&endpoint, &api_key, &global, &mut outcome).await?;

        let mut global = self.sync_metadata.get_global().await?;
        global.last_sync_at = Some(Utc::now());
        self.sync_metadata.put_global(&global).await?;

        Ok(outcome)
    }

    /// §4.4.a: notes modified since the last sync (or every note, on a
    /// first sync), plus every attachment they reference, deduplicated
    /// within the batch since this implementation keeps no cross-sync
    /// pushed-blobs cache (the spec allows either).
    async fn push(
        &self,
        endpoint: &str,
        api_key: &str,
        global: &SyncMetadataGlobal,
        outcome: &mut SyncOutcome,
    ) -> Result<(), JotteryError> {
        let changed = match global.last_sync_at {
            Some(since) => self.notes.list_modified_after(since).await?,
            None => {
                self.notes
                    .list(&NoteFilter { include_deleted: true, ..Default::default() })
                    .await?
            }
        };

        if changed.is_empty() {
            return Ok(());
        }

        let mut seen = HashSet::new();
        let mut attachments = Vec::new();
        for note in &changed {
            for attachment_id in &note.attachments {
                if !seen.insert(*attachment_id) {
                    continue;
                }
                let Some(reference) = self.attachment_refs.get(*attachment_id).await? else {
                    continue;
                };
                let Some(blob) = self.attachment_blobs.get(&reference.blob_handle).await? else {
                    continue;
                };
                attachments.push(AttachmentPayload {
                    id: *attachment_id,
                    blob: BASE64.encode(blob),
                    filename_ciphertext: reference.filename_ciphertext,
                    filename_iv: reference.filename_iv,
                    mime_type: reference.mime_type,
                    size_bytes: reference.size_bytes,
                });
            }
        }

        outcome.pushed = changed.len();

        let submitted_ids: Vec<NoteId> = changed.iter().map(|n| n.id).collect();
        let request = PushRequest { notes: changed, attachments };

        let response = match self.transport.push(endpoint, api_key, request).await {
            Ok(response) => response,
            Err(e) => {
                for id in submitted_ids {
                    self.set_note_sync_status(id, SyncEvent::TransientFailure, Some(e.to_string()), None).await?;
                }
                return Err(e);
            }
        };

        outcome.accepted = response.accepted.len();
        outcome.rejected = response.rejected.len();

        for accepted in response.accepted {
            self.notes.mark_synced(accepted.id, accepted.synced_at).await?;
            self.set_note_sync_status(accepted.id, SyncEvent::PushAccepted, None, Some(accepted.server_version))
                .await?;
        }

        for rejected in response.rejected {
            self.set_note_sync_status(rejected.id, SyncEvent::PushRejected, Some(rejected.reason), None).await?;
        }

        Ok(())
    }

    /// §4.4.b: Last-Write-Wins merge of every note the server reports
    /// newer than `lastSyncAt`, plus tombstone propagation and attachment
    /// hydration for notes this device has never seen.
    async fn pull(
        &self,
        endpoint: &str,
        api_key: &str,
        global: &SyncMetadataGlobal,
        outcome: &mut SyncOutcome,
    ) -> Result<(), JotteryError> {
        let known = self
            .notes
            .list(&NoteFilter { include_deleted: true, ..Default::default() })
            .await?
            .into_iter()
            .map(|n| n.id)
            .collect();

        let request = PullRequest { last_sync_at: global.last_sync_at, known_note_ids: known };
        let response = self.transport.pull(endpoint, api_key, request).await?;

        outcome.pulled_notes = response.notes.len();
        outcome.pulled_deletions = response.deletions.len();

        for mut remote in response.notes {
            match self.notes.get(remote.id).await? {
                None => {
                    remote.synced_at = Some(response.synced_at);
                    self.notes.insert(&remote).await?;
                }
                Some(local) => {
                    // Ties favor the local side, per the LWW glossary entry.
                    if remote.modified_at > local.modified_at {
                        remote.synced_at = Some(response.synced_at);
                        self.notes.update(&remote).await?;
                    }
                }
            }
            self.set_note_sync_status(remote.id, SyncEvent::PullAdoptedNewer, None, None).await?;
        }

        for deletion in response.deletions {
            if let Some(local) = self.notes.get(deletion.id).await? {
                if !local.deleted {
                    self.notes.soft_delete(deletion.id).await?;
                }
            }
        }

        for attachment in response.attachments {
            let blob = BASE64.decode(&attachment.blob).map_err(|_| JotteryError::ProtocolError("corrupt attachment blob".into()))?;
            let handle = self.attachment_blobs.put(&blob).await?;

            let reference = jottery_domain::entities::AttachmentReference {
                id: attachment.id,
                filename_ciphertext: attachment.filename_ciphertext,
                filename_iv: attachment.filename_iv,
                mime_type: attachment.mime_type,
                size_bytes: attachment.size_bytes,
                blob_handle: handle,
                thumbnail_handle: None,
            };

            if self.attachment_refs.get(attachment.id).await?.is_some() {
                self.attachment_refs.update(&reference).await?;
            } else {
                self.attachment_refs.insert(&reference).await?;
            }
        }

        Ok(())
    }

    async fn set_note_sync_status(
        &self,
        note_id: NoteId,
        event: SyncEvent,
        error_message: Option<String>,
        server_version: Option<u64>,
    ) -> Result<(), JotteryError> {
        let mut metadata = self
            .sync_metadata
            .get_note(note_id)
            .await?
            .unwrap_or_else(|| NoteSyncMetadata::new_pending(note_id));
        metadata.status = transition(metadata.status, event);
        metadata.error_message = error_message;
        if let Some(version) = server_version {
            metadata.server_version_at_sync = Some(version);
            metadata.last_synced_at = Some(Utc::now());
        }
        if metadata.status == SyncStatus::Synced && server_version.is_none() {
            metadata.last_synced_at = Some(Utc::now());
        }
        self.sync_metadata.put_note(&metadata).await
    }
}

/// Strips a trailing slash, per spec §4.4's endpoint normalization rule.
pub fn normalize_endpoint(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}

/// Spawns the auto-sync driver: fires `syncNow` every `interval` minutes,
/// coalescing missed ticks so at most one sync is ever outstanding
/// (`Semaphore(1)` with a non-blocking `try_acquire`, per REDESIGN FLAGS).
pub fn spawn_auto_sync_driver(
    engine: Arc<SyncEngine>,
    interval_minutes: u32,
    shutdown: jottery_bootstrap::CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let semaphore = Arc::new(tokio::sync::Semaphore::new(1));
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(u64::from(interval_minutes) * 60));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                        warn!("auto-sync tick skipped: previous sync still outstanding");
                        continue;
                    };
                    let engine = engine.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        match engine.sync_now().await {
                            Ok(outcome) => info!(
                                pushed = outcome.pushed,
                                accepted = outcome.accepted,
                                rejected = outcome.rejected,
                                pulled = outcome.pulled_notes,
                                "auto-sync completed"
                            ),
                            Err(e) => warn!(error = %e, "auto-sync failed"),
                        }
                    });
                }
            }
        }
    })
}
