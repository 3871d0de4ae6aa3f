// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Application layer
//!
//! Orchestrates the domain and infrastructure layers into the two
//! use-case surfaces a shell drives: note CRUD plus search/sort
//! ([`note_service`]), and bidirectional sync with a Jottery server
//! ([`sync_engine`]). Neither module talks to SQLite directly; both hold
//! repository trait objects handed to them at construction.

pub mod note_service;
pub mod sync_engine;

pub use note_service::{CreateNoteInput, NoteService, UpdateNoteInput};
pub use sync_engine::{SyncEngine, SyncOutcome};
