use serde::{Deserialize, Serialize};

use super::errors::CryptoError;

/// AES-GCM nonce length in bytes.
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// Encrypted record as it crosses the storage boundary: `nonce || ciphertext || tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    pub nonce: [u8; NONCE_LENGTH],
    /// Ciphertext with the authentication tag appended.
    pub sealed: Vec<u8>,
}

impl EncryptedBlob {
    /// Splits stored bytes into nonce and sealed payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(CryptoError::MalformedBlob(bytes.len()));
        }
        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(&bytes[..NONCE_LENGTH]);
        Ok(Self {
            nonce,
            sealed: bytes[NONCE_LENGTH..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(NONCE_LENGTH + self.sealed.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.sealed);
        bytes
    }
}
