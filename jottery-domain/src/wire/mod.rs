// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Wire protocol DTOs
//!
//! Plain serde-derived request/response bodies for the HTTP sync API and
//! for the credential export/import payload. These types carry no
//! behavior and no domain invariants beyond shape validation; they exist
//! so the client and server agree on a schema without either depending on
//! the other's internal entity representation.

mod credential;
mod pull;
mod push;
mod register;
mod status;

pub use credential::CredentialPayload;
pub use pull::{AttachmentPayload, DeletionPayload, PullRequest, PullResponse};
pub use push::{AcceptedNote, PushRequest, PushResponse, RejectedNote};
pub use register::{DeviceType, RegisterRequest, RegisterResponse};
pub use status::StatusResponse;
