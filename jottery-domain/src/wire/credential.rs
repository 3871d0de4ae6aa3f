// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Credential export/import payload.
//!
//! Serialized as JSON then base64-encoded for transport between devices
//! (clipboard, QR code, file). `#[serde(deny_unknown_fields)]` enforces
//! the spec's "unknown keys are rejected on import" rule directly at the
//! deserialization boundary rather than with a manual field scan.

use serde::{Deserialize, Serialize};

use crate::value_objects::ClientId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CredentialPayload {
    pub endpoint: String,
    pub client_id: ClientId,
    /// Plaintext API key. Exists in cleartext only for the lifetime of
    /// this payload and the `IMPORT:`-sentinel window on the receiving
    /// device; see [`crate::value_objects::ApiKey::PendingImport`].
    pub api_key: String,
    /// Raw PBKDF2 salt from the exporting device, required so the
    /// receiving device derives the identical data key.
    pub salt: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_are_rejected() {
        let json = serde_json::json!({
            "endpoint": "https://example.test",
            "clientId": "00000000-0000-0000-0000-000000000000",
            "apiKey": "deadbeef",
            "salt": [1, 2, 3],
            "extra": "nope",
        });
        let result: Result<CredentialPayload, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let json = serde_json::json!({
            "endpoint": "https://example.test",
            "clientId": "00000000-0000-0000-0000-000000000000",
        });
        let result: Result<CredentialPayload, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }
}
