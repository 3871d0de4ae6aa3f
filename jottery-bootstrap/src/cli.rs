// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Security validation for CLI arguments, shared by the `jottery` binary's
//! command parser.
//!
//! The CLI never takes file paths into untrusted territory the way a
//! pipeline tool would; the arguments worth validating here are the sync
//! endpoint URL (must be a well-formed `http`/`https` URL, so a typo
//! doesn't silently become a same-origin request to something unexpected)
//! and free-text fields the user will later see echoed back (device name,
//! tags) which are bounded in length to keep obviously-wrong input from
//! reaching the crypto layer.

use thiserror::Error;

const MAX_DEVICE_NAME_LEN: usize = 128;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("sync endpoint must be an http or https URL: {0}")]
    InvalidEndpoint(String),
}

pub fn validate_device_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: "device name".to_string() });
    }
    if trimmed.len() > MAX_DEVICE_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "device name".to_string(),
            max: MAX_DEVICE_NAME_LEN,
        });
    }
    Ok(trimmed.to_string())
}

pub fn validate_endpoint(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ValidationError::InvalidEndpoint(raw.to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
