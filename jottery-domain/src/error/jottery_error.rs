// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Domain-wide error taxonomy.
//!
//! The categories mirror the stable, user-visible taxonomy from the system
//! specification: Auth, Crypto, Store, Sync, Validation. Propagation is
//! typed end to end — there is no control-flow-by-exception anywhere in the
//! core, and crypto verification failures collapse to a single opaque
//! variant so callers can never distinguish "wrong key" from "corrupt
//! ciphertext".

use thiserror::Error;

/// Domain-specific errors for the Jottery core.
///
/// Every fallible operation in the crypto envelope, local store, note
/// service, sync engine, and server core returns this type. Variants are
/// grouped by the taxonomy below but kept in one enum so a single `?` chain
/// can cross layer boundaries without a conversion dance.
#[derive(Error, Debug, Clone)]
pub enum JotteryError {
    // --- Auth --------------------------------------------------------
    #[error("store has not been initialized")]
    NotInitialized,

    #[error("store is already initialized")]
    AlreadyInitialized,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("the key manager is locked")]
    Locked,

    #[error("the store has been wiped and cannot be unlocked; initialize it again")]
    AlreadyWiped,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    // --- Crypto --------------------------------------------------------
    #[error("decryption failed")]
    DecryptError,

    #[error("key derivation failed: {0}")]
    KeyDerivationError(String),

    // --- Store --------------------------------------------------------
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("schema too new: store is at version {found}, this build supports up to {supported}")]
    SchemaTooNew { found: i64, supported: i64 },

    // --- Sync --------------------------------------------------------
    #[error("network error: {0}")]
    NetworkError(String),

    #[error("server error: {0}")]
    ServerError(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("a sync is already in progress")]
    SyncInProgress,

    #[error("sync is disabled")]
    SyncDisabled,

    #[error("push rejected for note {note_id}: {reason}")]
    PushRejected { note_id: String, reason: String },

    // --- Validation --------------------------------------------------------
    #[error("invalid input: {fields:?}")]
    InvalidInput { fields: Vec<String> },

    // --- Catch-all for infrastructure failures without a dedicated variant --
    #[error("internal error: {0}")]
    InternalError(String),
}

impl JotteryError {
    /// Enriches a propagated error with the id of the note it happened to,
    /// without inventing a new variant for every call site. Used by the
    /// note service when it passes store/crypto errors up unchanged except
    /// for this context, per the error-handling design.
    pub fn with_note_context(self, note_id: &str) -> Self {
        match self {
            JotteryError::NotFound(msg) => JotteryError::NotFound(format!("note {note_id}: {msg}")),
            JotteryError::Conflict(msg) => JotteryError::Conflict(format!("note {note_id}: {msg}")),
            JotteryError::InternalError(msg) => {
                JotteryError::InternalError(format!("note {note_id}: {msg}"))
            }
            other => other,
        }
    }

    /// True for errors the sync engine's next auto-sync tick may reasonably
    /// retry without user intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JotteryError::NetworkError(_) | JotteryError::ServerError(_) | JotteryError::StorageUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_context_enriches_only_the_variants_that_carry_a_message() {
        let err = JotteryError::NotFound("row missing".to_string()).with_note_context("abc-123");
        assert_eq!(err.to_string(), "not found: note abc-123: row missing");

        let unchanged = JotteryError::Locked.with_note_context("abc-123");
        assert!(matches!(unchanged, JotteryError::Locked));
    }

    #[test]
    fn only_transient_categories_are_retryable() {
        assert!(JotteryError::NetworkError("timeout".into()).is_retryable());
        assert!(JotteryError::ServerError("503".into()).is_retryable());
        assert!(!JotteryError::IncorrectPassword.is_retryable());
        assert!(!JotteryError::PushRejected {
            note_id: "n1".into(),
            reason: "stale".into()
        }
        .is_retryable());
    }
}
