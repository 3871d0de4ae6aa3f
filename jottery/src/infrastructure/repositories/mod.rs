// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SQLite adapters for every repository trait declared in `jottery_domain`,
//! plus schema bootstrap and version checking.
//!
//! Client-side adapters (note, attachment blob, settings, encryption
//! metadata, sync metadata) are built against the pool returned by
//! [`schema::initialize_client_database`]; server-side adapters
//! (registered client, server note) are built against
//! [`schema::initialize_server_database`]. Nothing here decrypts or
//! inspects plaintext; ciphertext, IVs, and hashes pass through as opaque
//! columns.

pub mod schema;
pub mod sqlite_attachment_blob_repository;
pub mod sqlite_attachment_reference_repository;
pub mod sqlite_encryption_metadata_repository;
pub mod sqlite_note_repository;
pub mod sqlite_registered_client_repository;
pub mod sqlite_server_attachment_repository;
pub mod sqlite_server_note_repository;
pub mod sqlite_settings_repository;
pub mod sqlite_sync_metadata_repository;
pub mod sqlite_sync_operations_audit;

pub use sqlite_attachment_blob_repository::SqliteAttachmentBlobRepository;
pub use sqlite_attachment_reference_repository::SqliteAttachmentReferenceRepository;
pub use sqlite_encryption_metadata_repository::SqliteEncryptionMetadataRepository;
pub use sqlite_note_repository::SqliteNoteRepository;
pub use sqlite_registered_client_repository::SqliteRegisteredClientRepository;
pub use sqlite_server_attachment_repository::SqliteServerAttachmentRepository;
pub use sqlite_server_note_repository::SqliteServerNoteRepository;
pub use sqlite_settings_repository::SqliteSettingsRepository;
pub use sqlite_sync_metadata_repository::SqliteSyncMetadataRepository;
pub use sqlite_sync_operations_audit::{SqliteSyncOperationsAudit, SyncOperationsAudit};
