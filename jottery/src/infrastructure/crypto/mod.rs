// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Crypto envelope
//!
//! Password-based key derivation, AES-256-GCM content encryption, and the
//! key manager that owns the master key's lock/unlock lifecycle.

mod cipher;
mod key_manager;
mod secure_key;

pub use cipher::{decrypt_bytes, decrypt_text, derive, encrypt_bytes, encrypt_text, hash, new_uuid, random_iv, random_salt, Envelope};
pub use key_manager::{spawn_auto_lock_driver, KeyManager};
pub use secure_key::SecureKey;
