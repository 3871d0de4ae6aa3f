// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Value Objects
//!
//! Immutable, identity-free types defined entirely by their attributes:
//! typed ids, the per-note sync status machine, the tagged API-key
//! representation, tag-set normalization, and note sort order.

mod api_key;
mod ids;
mod sort_order;
mod sync_status;
mod tag;

pub use api_key::ApiKey;
pub use ids::{AttachmentId, ClientId, NoteId};
pub use sort_order::SortOrder;
pub use sync_status::{transition, SyncEvent, SyncStatus};
pub use tag::normalize_tags;
