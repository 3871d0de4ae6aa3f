// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `POST /api/v1/auth/register`

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use jottery_domain::entities::RegisteredClient;
use jottery_domain::error::JotteryError;
use jottery_domain::value_objects::ClientId;
use jottery_domain::wire::{RegisterRequest, RegisterResponse};
use ring::rand::{SecureRandom, SystemRandom};

use crate::infrastructure::crypto::cipher;
use crate::server::AppState;

/// Generates a cryptographically random 32-byte key, hex-encoded to 64
/// characters, per spec §4.5.
fn generate_api_key() -> Result<String, JotteryError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes).map_err(|_| JotteryError::KeyDerivationError("failed to generate api key".to_string()))?;
    Ok(hex::encode(bytes))
}

#[tracing::instrument(level = "info", skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), JotteryError> {
    let api_key = generate_api_key()?;
    let api_key_hash = hex::encode(cipher::hash(&api_key));
    let now = Utc::now();

    let client = RegisteredClient {
        id: ClientId::new(),
        api_key_hash,
        device_name: request.device_name,
        device_type: format!("{:?}", request.device_type).to_lowercase(),
        created_at: now,
        last_seen_at: now,
        active: true,
    };

    state.clients.insert(&client).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { api_key, client_id: client.id, created_at: client.created_at }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_api_keys_are_sixty_four_hex_characters() {
        let key = generate_api_key().unwrap();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn two_generated_keys_are_distinct() {
        assert_ne!(generate_api_key().unwrap(), generate_api_key().unwrap());
    }
}
