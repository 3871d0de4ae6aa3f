// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Maps a top-level `Result<(), JotteryError>` to a Unix exit code so the
//! CLI's shell caller can branch on category (auth failure vs. storage
//! failure vs. transient sync error) instead of parsing stderr text.

use jottery_domain::JotteryError;

/// BSD `sysexits.h` codes, reused by the teacher's own bootstrap layer for
/// the same reason: they are a small, standard, shell-script-friendly
/// vocabulary instead of an invented one.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum ExitCode {
    Ok = 0,
    /// EX_USAGE: bad command-line invocation.
    Usage = 64,
    /// EX_DATAERR: input data was incorrect (bad credential payload, etc).
    DataErr = 65,
    /// EX_NOPERM: auth/crypto failure (locked, incorrect password).
    NoPerm = 77,
    /// EX_UNAVAILABLE: a dependent service (store, network) was unreachable.
    Unavailable = 69,
    /// EX_SOFTWARE: an internal invariant was violated.
    Software = 70,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

pub fn map_error_to_exit_code(error: &JotteryError) -> ExitCode {
    match error {
        JotteryError::IncorrectPassword
        | JotteryError::Locked
        | JotteryError::NotInitialized
        | JotteryError::AlreadyInitialized
        | JotteryError::Unauthorized(_)
        | JotteryError::Forbidden(_) => ExitCode::NoPerm,

        JotteryError::InvalidInput { .. } | JotteryError::ProtocolError(_) => ExitCode::DataErr,

        JotteryError::NetworkError(_) | JotteryError::ServerError(_) | JotteryError::StorageUnavailable(_) => {
            ExitCode::Unavailable
        }

        JotteryError::NotFound(_)
        | JotteryError::Conflict(_)
        | JotteryError::SchemaTooNew { .. }
        | JotteryError::DecryptError
        | JotteryError::KeyDerivationError(_)
        | JotteryError::SyncInProgress
        | JotteryError::SyncDisabled
        | JotteryError::PushRejected { .. }
        | JotteryError::InternalError(_) => ExitCode::Software,
    }
}

pub fn result_to_exit_code(result: Result<(), JotteryError>) -> std::process::ExitCode {
    match result {
        Ok(()) => ExitCode::Ok.into(),
        Err(e) => {
            eprintln!("error: {e}");
            map_error_to_exit_code(&e).into()
        }
    }
}
