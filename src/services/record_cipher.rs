use std::sync::Mutex;

use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::services::key_provider::KeyProvider;
use crate::types::blob::{EncryptedBlob, NONCE_LENGTH, TAG_LENGTH};
use crate::types::errors::CryptoError;

/// AES-256-GCM key length in bytes. Derived keys are the first `KEY_LENGTH` bytes of the
/// 64-byte HMAC-SHA512 signature over the seed.
pub const KEY_LENGTH: usize = 32;

/// Per-record key derived from the master key and a seed. Wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LENGTH]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

/// A nonce sequence that uses a single nonce value.
/// Used for one-shot encryption/decryption operations.
struct SingleNonce {
    nonce: Option<[u8; NONCE_LENGTH]>,
}

impl SingleNonce {
    fn new(nonce_bytes: [u8; NONCE_LENGTH]) -> Self {
        Self {
            nonce: Some(nonce_bytes),
        }
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> Result<Nonce, ring::error::Unspecified> {
        self.nonce
            .take()
            .map(Nonce::assume_unique_for_key)
            .ok_or(ring::error::Unspecified)
    }
}

/// Authenticated record encryption with keys derived per seed.
///
/// The same seed always yields the same key, so no per-record key material is stored. Sibling
/// records sharing a seed share a key; every encryption draws a fresh random nonce.
///
/// All calls into the key provider go through one mutex.
pub struct RecordCipher {
    provider: Mutex<Box<dyn KeyProvider>>,
    rng: SystemRandom,
}

impl RecordCipher {
    pub fn new(provider: impl KeyProvider + 'static) -> Self {
        Self {
            provider: Mutex::new(Box::new(provider)),
            rng: SystemRandom::new(),
        }
    }

    /// Derives the record key for `seed`.
    pub fn derive_key(&self, seed: &[u8]) -> Result<DerivedKey, CryptoError> {
        let mut signature = {
            let mut provider = self
                .provider
                .lock()
                .map_err(|_| CryptoError::KeyProvider("Key provider lock poisoned".to_string()))?;
            provider.sign(seed)?
        };
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&signature[..KEY_LENGTH]);
        signature.zeroize();
        Ok(DerivedKey(key))
    }

    /// Encrypts `plaintext` with the key derived from `seed` and a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8], seed: &[u8]) -> Result<EncryptedBlob, CryptoError> {
        let key = self.derive_key(seed)?;

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CryptoError::RandomGeneration("Failed to generate nonce".to_string()))?;

        let unbound_key = UnboundKey::new(&AES_256_GCM, key.as_bytes())
            .map_err(|_| CryptoError::Encryption("Failed to create encryption key".to_string()))?;
        let mut sealing_key = aead::SealingKey::new(unbound_key, SingleNonce::new(nonce_bytes));

        // ring appends the tag to the buffer
        let mut in_out = plaintext.to_vec();
        sealing_key
            .seal_in_place_append_tag(Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::Encryption("Encryption operation failed".to_string()))?;

        Ok(EncryptedBlob {
            nonce: nonce_bytes,
            sealed: in_out,
        })
    }

    /// Decrypts a blob produced by [`RecordCipher::encrypt`] with the same seed.
    ///
    /// Fails with [`CryptoError::Authentication`] on any tampering, a wrong seed or a wrong
    /// master key.
    pub fn decrypt(&self, blob: &EncryptedBlob, seed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if blob.sealed.len() < TAG_LENGTH {
            return Err(CryptoError::MalformedBlob(NONCE_LENGTH + blob.sealed.len()));
        }
        let key = self.derive_key(seed)?;

        let unbound_key =
            UnboundKey::new(&AES_256_GCM, key.as_bytes()).map_err(|_| CryptoError::Authentication)?;
        let mut opening_key = aead::OpeningKey::new(unbound_key, SingleNonce::new(blob.nonce));

        let mut in_out = blob.sealed.clone();
        let plaintext = opening_key
            .open_in_place(Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::Authentication)?;

        Ok(plaintext.to_vec())
    }

    /// Decrypts raw `nonce || ciphertext || tag` bytes.
    pub fn decrypt_bytes(&self, bytes: &[u8], seed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.decrypt(&EncryptedBlob::from_bytes(bytes)?, seed)
    }
}
