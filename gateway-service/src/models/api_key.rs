//! API key model - bare-secret credentials with frozen grants.

use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

use super::Role;

/// Random bytes per generated secret (256 bits).
pub const API_KEY_SECRET_BYTES: usize = 32;

/// API key record. `role` and `operator_id` are copied from the owning
/// account at creation and never re-synchronised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: Option<String>,
    pub role: Role,
    pub operator_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Lowercase hex SHA-256 of the presented secret; the stored lookup key.
    pub fn calculate_key_hash(secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Fresh plaintext secret: 32 bytes from the OS RNG, hex encoded.
    pub fn generate_secret() -> SecretString {
        let mut bytes = [0u8; API_KEY_SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        SecretString::new(hex::encode(bytes))
    }

    pub fn hash_secret(secret: &SecretString) -> String {
        Self::calculate_key_hash(secret.expose_secret())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: Option<String>,
    pub role: String,
    pub operator_id: Option<Uuid>,
    pub key_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl TryFrom<ApiKeyRow> for ApiKey {
    type Error = anyhow::Error;

    fn try_from(row: ApiKeyRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e| anyhow::anyhow!("api key {} has {}", row.id, e))?;
        Ok(Self {
            id: row.id,
            account_id: row.account_id,
            name: row.name,
            role,
            operator_id: row.operator_id,
            key_hash: row.key_hash,
            active: row.active,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secrets_carry_256_bits() {
        let secret = ApiKey::generate_secret();
        assert_eq!(secret.expose_secret().len(), API_KEY_SECRET_BYTES * 2);
        assert!(secret.expose_secret().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_secrets_differ() {
        let a = ApiKey::generate_secret();
        let b = ApiKey::generate_secret();
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn hash_is_deterministic_and_distinguishes_secrets() {
        let secret = ApiKey::generate_secret();
        let other = ApiKey::generate_secret();
        assert_eq!(ApiKey::hash_secret(&secret), ApiKey::hash_secret(&secret));
        assert_ne!(ApiKey::hash_secret(&secret), ApiKey::hash_secret(&other));
        assert_ne!(ApiKey::hash_secret(&secret), *secret.expose_secret());
    }

    #[test]
    fn hash_matches_known_sha256_vector() {
        assert_eq!(
            ApiKey::calculate_key_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
