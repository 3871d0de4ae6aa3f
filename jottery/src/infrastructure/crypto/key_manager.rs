// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! The key manager: owns the master key's lifecycle.
//!
//! `Uninitialized -> Unlocked -> Locked -> Unlocked -> ...`, with a
//! terminal `Wiped` reached only by a full-store delete. The manager holds
//! no process-global state; callers own an instance and pass it by
//! reference, per the explicit-dependency-injection design.
//!
//! Auto-lock is a driver loop, not a background timer tied to statics: the
//! shell feeds it `register_activity()` calls, and a spawned task wakes on
//! either a tick or a shutdown signal to decide whether to lock.

use std::sync::Arc;
use std::time::Duration;

use jottery_domain::entities::Note;
use jottery_domain::JotteryError;
use parking_lot::RwLock;
use tokio::sync::watch;

use super::cipher;
use super::secure_key::SecureKey;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum LifecycleState {
    Uninitialized,
    Unlocked,
    Locked,
    Wiped,
}

struct Inner {
    state: LifecycleState,
    key: Option<SecureKey>,
}

/// Owns the master key and its lock state. Cloning shares the same
/// underlying key via an `Arc`, so the auto-lock driver task and the rest
/// of the application observe the same state.
#[derive(Clone)]
pub struct KeyManager {
    inner: Arc<RwLock<Inner>>,
    activity_tx: watch::Sender<()>,
}

impl KeyManager {
    pub fn new() -> Self {
        let (activity_tx, _activity_rx) = watch::channel(());
        Self {
            inner: Arc::new(RwLock::new(Inner {
                state: LifecycleState::Uninitialized,
                key: None,
            })),
            activity_tx,
        }
    }

    /// Marks the store initialized and leaves the manager unlocked with
    /// the freshly derived key. Fails if already initialized.
    pub fn initialize(&self, key: SecureKey) -> Result<(), JotteryError> {
        let mut inner = self.inner.write();
        if inner.state != LifecycleState::Uninitialized {
            return Err(JotteryError::AlreadyInitialized);
        }
        inner.state = LifecycleState::Unlocked;
        inner.key = Some(key);
        Ok(())
    }

    /// Rederives the key from `password` and `salt`/`iterations`, then
    /// verifies it against `existing_note` if one is supplied: decrypting
    /// its content must succeed, or the password is wrong. With no
    /// existing note, unlock is provisionally accepted.
    pub fn unlock(
        &self,
        password: &str,
        salt: &[u8],
        iterations: u32,
        existing_note: Option<&Note>,
    ) -> Result<(), JotteryError> {
        if self.inner.read().state == LifecycleState::Wiped {
            return Err(JotteryError::AlreadyWiped);
        }

        let candidate = cipher::derive(password, salt, iterations)?;

        if let Some(note) = existing_note {
            let envelope = cipher::Envelope {
                ciphertext: note.content_ciphertext.clone(),
                iv: note.content_iv.clone(),
            };
            if cipher::decrypt_text(&envelope, &candidate).is_err() {
                // Discard the candidate key before the caller sees the error.
                drop(candidate);
                return Err(JotteryError::IncorrectPassword);
            }
        }

        let mut inner = self.inner.write();
        inner.state = LifecycleState::Unlocked;
        inner.key = Some(candidate);
        Ok(())
    }

    /// Zeroizes the key and moves to `Locked`. No-op if already locked or
    /// never initialized.
    pub fn lock(&self) {
        let mut inner = self.inner.write();
        if inner.state == LifecycleState::Unlocked {
            inner.key = None;
            inner.state = LifecycleState::Locked;
        }
    }

    /// Zeroizes the key and moves to the terminal `Wiped` state. Called
    /// once, as part of a full-store delete; there is no transition out.
    pub fn wipe(&self) {
        let mut inner = self.inner.write();
        inner.key = None;
        inner.state = LifecycleState::Wiped;
    }

    /// Returns a clone of the current key, or `None` if locked,
    /// uninitialized, or wiped. Every consumer must call this fresh on
    /// each operation rather than caching the result.
    pub fn current_key(&self) -> Option<SecureKey> {
        let inner = self.inner.read();
        if inner.state == LifecycleState::Unlocked {
            inner.key.clone()
        } else {
            None
        }
    }

    pub fn is_locked(&self) -> bool {
        !matches!(self.inner.read().state, LifecycleState::Unlocked)
    }

    /// Resets the auto-lock timer. The driver loop wakes on this signal as
    /// well as on its own tick interval.
    pub fn register_activity(&self) {
        let _ = self.activity_tx.send(());
    }

    fn subscribe_activity(&self) -> watch::Receiver<()> {
        self.activity_tx.subscribe()
    }
}

impl Default for KeyManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the auto-lock driver loop: on every tick, if no activity has
/// been observed since the previous tick, locks the manager. Returns a
/// handle whose drop does not stop the task — callers that want clean
/// shutdown should race it against a `tokio_util`-style cancellation
/// signal at the call site, consistent with how the rest of the
/// application's background tasks are supervised.
pub fn spawn_auto_lock_driver(manager: KeyManager, timeout: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut activity_rx = manager.subscribe_activity();
        loop {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    if !manager.is_locked() {
                        tracing::info!("auto-lock timeout elapsed, locking key manager");
                        manager.lock();
                    }
                }
                result = activity_rx.changed() => {
                    if result.is_err() {
                        break;
                    }
                }
            }
        }
    })
}
