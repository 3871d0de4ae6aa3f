// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `jottery`: the terminal client driver.
//!
//! A single invocation opens the local store, unlocks it against a
//! password read from `JOTTERY_PASSWORD` (falling back to an interactive
//! stdin prompt), performs one command, and exits — there is no resident
//! daemon here, so the auto-lock and auto-sync background drivers this
//! binary would otherwise run are only meaningful across invocations of a
//! long-lived shell, which is out of scope for a single CLI command.

use std::io::IsTerminal;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use jottery::application::sync_engine::SyncEngine;
use jottery::application::{CreateNoteInput, NoteService, UpdateNoteInput};
use jottery::infrastructure::config::AppConfig;
use jottery::infrastructure::crypto::cipher;
use jottery::infrastructure::crypto::KeyManager;
use jottery::infrastructure::http::HttpSyncTransport;
use jottery::infrastructure::logging;
use jottery::infrastructure::repositories::schema::initialize_client_database;
use jottery::infrastructure::repositories::{
    SqliteAttachmentBlobRepository, SqliteAttachmentReferenceRepository, SqliteEncryptionMetadataRepository,
    SqliteNoteRepository, SqliteSettingsRepository, SqliteSyncMetadataRepository,
};
use jottery_bootstrap::cli::{validate_device_name, validate_endpoint};
use jottery_domain::entities::{EncryptionMetadata, SettingsPatch};
use jottery_domain::repositories::{EncryptionMetadataRepository, NoteFilter, NoteRepository, SettingsRepository};
use jottery_domain::value_objects::{NoteId, SortOrder};
use jottery_domain::wire::DeviceType;
use jottery_domain::JotteryError;

#[derive(Parser)]
#[command(name = "jottery", about = "A privacy-focused, end-to-end-encrypted note taker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Creates a new note.
    New {
        content: String,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        pin: bool,
    },
    /// Lists notes.
    List {
        #[arg(long)]
        include_deleted: bool,
        #[arg(long)]
        pinned_only: bool,
        #[arg(long, value_enum, default_value = "modified")]
        sort: SortArg,
    },
    /// Shows a single note's decrypted content.
    Show { id: NoteId },
    /// Updates a note's content.
    Update {
        id: NoteId,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },
    /// Toggles a note's pinned flag.
    Pin { id: NoteId },
    /// Soft-deletes a note.
    Delete { id: NoteId },
    /// Restores a soft-deleted note.
    Restore { id: NoteId },
    /// Permanently removes a soft-deleted note.
    Purge { id: NoteId },
    /// Registers this device with a sync server.
    Register {
        endpoint: String,
        #[arg(long, default_value = "this device")]
        device_name: String,
        #[arg(long, value_enum, default_value = "cli")]
        device_type: DeviceTypeArg,
    },
    /// Emits a base64 credential payload for seeding a second device.
    ExportCredentials,
    /// Imports a base64 credential payload from another device.
    ImportCredentials { payload: String },
    /// Runs one bidirectional sync against the registered server.
    Sync,
    /// Permanently deletes every note, attachment, and sync/encryption
    /// record, then locks the store as if it had never been initialized.
    /// Irreversible; requires typing the confirmation phrase on stdin.
    Wipe {
        #[arg(long)]
        yes: bool,
    },
    /// Reads or changes local presentation preferences.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Prints the current settings.
    Show,
    /// Updates one or more fields; omitted fields are left unchanged.
    Set {
        #[arg(long)]
        word_wrap: Option<bool>,
        #[arg(long)]
        auto_lock_minutes: Option<u32>,
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },
    /// Reverts every field back to its default.
    Reset,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SortArg {
    Modified,
    Created,
    Alpha,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Modified => SortOrder::Recent,
            SortArg::Created => SortOrder::Created,
            SortArg::Alpha => SortOrder::Alpha,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum DeviceTypeArg {
    Web,
    Cli,
}

impl From<DeviceTypeArg> for DeviceType {
    fn from(value: DeviceTypeArg) -> Self {
        match value {
            DeviceTypeArg::Web => DeviceType::Web,
            DeviceTypeArg::Cli => DeviceType::Cli,
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    jottery_bootstrap::result_to_exit_code(run().await)
}

async fn run() -> Result<(), JotteryError> {
    let cli = Cli::parse();
    let config = AppConfig::load().map_err(|e| JotteryError::InternalError(e.to_string()))?;
    logging::init(&config.log_level);

    let pool = initialize_client_database(&config.database_url).await?;

    let notes_repo: Arc<dyn NoteRepository> = Arc::new(SqliteNoteRepository::new(pool.clone()));
    let attachment_blobs = Arc::new(SqliteAttachmentBlobRepository::new(pool.clone()));
    let attachment_refs = Arc::new(SqliteAttachmentReferenceRepository::new(pool.clone()));
    let sync_metadata = Arc::new(SqliteSyncMetadataRepository::new(pool.clone()));
    let settings_repo = SqliteSettingsRepository::new(pool.clone());
    let encryption_metadata = SqliteEncryptionMetadataRepository::new(pool.clone());

    let key_manager = KeyManager::new();
    unlock(&encryption_metadata, &notes_repo, &key_manager).await?;

    let encryption_metadata = Arc::new(encryption_metadata);
    let note_service = NoteService::new(
        notes_repo.clone(),
        attachment_blobs.clone(),
        attachment_refs.clone(),
        sync_metadata.clone(),
        encryption_metadata.clone(),
        key_manager.clone(),
    );

    // Reconcile any credential import left pending by a prior
    // `import-credentials` invocation now that the password just proved
    // correct against the freshly imported salt.
    sync_engine(&notes_repo, &attachment_blobs, &attachment_refs, &sync_metadata, &key_manager)?
        .complete_pending_import()
        .await?;

    match cli.command {
        Command::New { content, tags, pin } => {
            let mut note = note_service
                .create(CreateNoteInput { content, tags, word_wrap: true, syntax_language: None, ..Default::default() })
                .await?;
            if pin {
                note = note_service.toggle_pin(note.id).await?;
            }
            println!("created note {}", note.id);
        }
        Command::List { include_deleted, pinned_only, sort } => {
            let notes = note_service
                .list(NoteFilter { include_deleted, pinned_only, sort: sort.into() })
                .await?;
            for note in notes {
                let pin_marker = if note.pinned { "* " } else { "  " };
                let first_line = note.content.lines().next().unwrap_or("");
                println!("{pin_marker}{} {}", note.id, first_line);
            }
        }
        Command::Show { id } => {
            let note = note_service.get(id).await?;
            println!("{}", note.content);
            println!("tags: {}", note.tags.join(", "));
        }
        Command::Update { id, content, tags } => {
            note_service.update(id, UpdateNoteInput { content, tags, ..Default::default() }).await?;
            println!("updated note {id}");
        }
        Command::Pin { id } => {
            note_service.toggle_pin(id).await?;
            println!("toggled pin on note {id}");
        }
        Command::Delete { id } => {
            note_service.soft_delete(id).await?;
            println!("deleted note {id}");
        }
        Command::Restore { id } => {
            note_service.restore(id).await?;
            println!("restored note {id}");
        }
        Command::Purge { id } => {
            note_service.permanent_delete(id).await?;
            println!("purged note {id}");
        }
        Command::Register { endpoint, device_name, device_type } => {
            let endpoint =
                validate_endpoint(&endpoint).map_err(|e| JotteryError::InvalidInput { fields: vec![e.to_string()] })?;
            let device_name = validate_device_name(&device_name)
                .map_err(|e| JotteryError::InvalidInput { fields: vec![e.to_string()] })?;

            let engine = sync_engine(&notes_repo, &attachment_blobs, &attachment_refs, &sync_metadata, &key_manager)?;
            let api_key = engine.register(&endpoint, device_name, device_type.into()).await?;
            println!("registered. api key (shown once): {api_key}");
        }
        Command::ExportCredentials => {
            let metadata = encryption_metadata
                .get()
                .await?
                .ok_or(JotteryError::NotInitialized)?;
            let engine = sync_engine(&notes_repo, &attachment_blobs, &attachment_refs, &sync_metadata, &key_manager)?;
            let payload = engine.export_credentials(metadata.salt).await?;
            println!("{payload}");
        }
        Command::ImportCredentials { payload } => {
            let engine = sync_engine(&notes_repo, &attachment_blobs, &attachment_refs, &sync_metadata, &key_manager)?;
            let salt = engine.import_credentials(&payload).await?;
            encryption_metadata.clear().await?;
            encryption_metadata.initialize(&EncryptionMetadata::new(salt)).await?;
            println!("credentials imported. re-run any command to unlock against the imported password.");
        }
        Command::Sync => {
            let engine = sync_engine(&notes_repo, &attachment_blobs, &attachment_refs, &sync_metadata, &key_manager)?;
            let outcome = engine.sync_now().await?;
            println!(
                "sync complete: pushed {}, accepted {}, rejected {}, pulled {} notes, {} deletions",
                outcome.pushed, outcome.accepted, outcome.rejected, outcome.pulled_notes, outcome.pulled_deletions
            );
        }
        Command::Wipe { yes } => {
            if !yes {
                eprintln!("this permanently deletes every note, attachment, and credential on this device.");
                eprint!("type \"wipe\" to continue: ");
                let mut confirmation = String::new();
                std::io::stdin()
                    .read_line(&mut confirmation)
                    .map_err(|e| JotteryError::InternalError(e.to_string()))?;
                if confirmation.trim() != "wipe" {
                    println!("aborted.");
                    return Ok(());
                }
            }
            note_service.wipe_store().await?;
            println!("store wiped.");
        }
        Command::Settings { command } => match command {
            SettingsCommand::Show => {
                let settings = settings_repo.get().await?;
                println!("word_wrap_default: {}", settings.word_wrap_default);
                println!("auto_lock_minutes: {}", settings.auto_lock_minutes);
                println!("default_sort: {:?}", settings.default_sort);
            }
            SettingsCommand::Set { word_wrap, auto_lock_minutes, sort } => {
                let patch = SettingsPatch {
                    word_wrap_default: word_wrap,
                    auto_lock_minutes,
                    default_sort: sort.map(SortOrder::from),
                };
                settings_repo.update(&patch).await?;
                println!("settings updated.");
            }
            SettingsCommand::Reset => {
                settings_repo.reset().await?;
                println!("settings reset to defaults.");
            }
        },
    }

    Ok(())
}

fn sync_engine(
    notes: &Arc<dyn NoteRepository>,
    attachment_blobs: &Arc<SqliteAttachmentBlobRepository>,
    attachment_refs: &Arc<SqliteAttachmentReferenceRepository>,
    sync_metadata: &Arc<SqliteSyncMetadataRepository>,
    key_manager: &KeyManager,
) -> Result<SyncEngine, JotteryError> {
    let transport = Arc::new(HttpSyncTransport::new()?);
    Ok(SyncEngine::new(
        notes.clone(),
        attachment_blobs.clone(),
        attachment_refs.clone(),
        sync_metadata.clone(),
        key_manager.clone(),
        transport,
    ))
}

/// First-run: no encryption metadata yet, so a fresh password initializes
/// the store. Otherwise re-derives the key and verifies it against the
/// first existing note, per [`KeyManager::unlock`]'s contract, then
/// reconciles any pending credential import left over from a prior
/// `import-credentials` invocation.
async fn unlock(
    encryption_metadata: &SqliteEncryptionMetadataRepository,
    notes: &Arc<dyn NoteRepository>,
    key_manager: &KeyManager,
) -> Result<(), JotteryError> {
    let password = read_password()?;

    match encryption_metadata.get().await? {
        None => {
            let salt = cipher::random_salt()?;
            let metadata = EncryptionMetadata::new(salt.clone());
            let key = cipher::derive(&password, &salt, metadata.iterations)?;
            encryption_metadata.initialize(&metadata).await?;
            key_manager.initialize(key)?;
        }
        Some(metadata) => {
            let existing = notes.list(&NoteFilter { include_deleted: true, ..Default::default() }).await?;
            key_manager.unlock(&password, &metadata.salt, metadata.iterations, existing.first())?;
        }
    }

    Ok(())
}

fn read_password() -> Result<String, JotteryError> {
    if let Ok(password) = std::env::var("JOTTERY_PASSWORD") {
        return Ok(password);
    }

    if !std::io::stdin().is_terminal() {
        return Err(JotteryError::InvalidInput {
            fields: vec!["no JOTTERY_PASSWORD set and stdin is not a terminal".to_string()],
        });
    }

    eprint!("password: ");
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| JotteryError::InternalError(e.to_string()))?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
