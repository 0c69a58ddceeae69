//! Master key providers.
//!
//! The vault has exactly one long-lived secret: an HMAC-SHA512 master key that never leaves its
//! provider. Callers only ever see signatures over seed bytes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::types::errors::CryptoError;

/// Length of a signature produced by a provider (HMAC-SHA512 output).
pub const SIGNATURE_LENGTH: usize = 64;

/// Length of a generated master key in bytes.
pub const MASTER_KEY_LENGTH: usize = 64;

/// A store holding the non-exportable master key.
///
/// `sign` takes `&mut self`: key stores are not assumed to tolerate concurrent use, so owners
/// must serialize access (see [`crate::services::record_cipher::RecordCipher`]).
pub trait KeyProvider: Send {
    /// Signs `data` with the master key, creating the key on first use if needed.
    fn sign(&mut self, data: &[u8]) -> Result<[u8; SIGNATURE_LENGTH], CryptoError>;
}

fn sign_with(key: &hmac::Key, data: &[u8]) -> [u8; SIGNATURE_LENGTH] {
    let tag = hmac::sign(key, data);
    let mut out = [0u8; SIGNATURE_LENGTH];
    out.copy_from_slice(tag.as_ref());
    out
}

fn generate_master_key(rng: &SystemRandom) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut bytes = Zeroizing::new(vec![0u8; MASTER_KEY_LENGTH]);
    rng.fill(&mut bytes)
        .map_err(|_| CryptoError::RandomGeneration("Failed to generate master key".to_string()))?;
    Ok(bytes)
}

/// Provider holding the master key in process memory.
pub struct MemoryKeyProvider {
    key: hmac::Key,
}

impl MemoryKeyProvider {
    /// Uses the given bytes as master key.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA512, secret),
        }
    }

    /// Creates a provider with a fresh random master key.
    pub fn generate() -> Result<Self, CryptoError> {
        let secret = generate_master_key(&SystemRandom::new())?;
        Ok(Self::new(&secret))
    }
}

impl KeyProvider for MemoryKeyProvider {
    fn sign(&mut self, data: &[u8]) -> Result<[u8; SIGNATURE_LENGTH], CryptoError> {
        Ok(sign_with(&self.key, data))
    }
}

/// Provider persisting the master key in a private file.
///
/// The key is created lazily on the first `sign` and reused by every later process.
pub struct FileKeyProvider {
    path: PathBuf,
    key: Option<hmac::Key>,
    rng: SystemRandom,
}

impl FileKeyProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            key: None,
            rng: SystemRandom::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_or_create(&self) -> Result<hmac::Key, CryptoError> {
        if self.path.exists() {
            let encoded = Zeroizing::new(fs::read_to_string(&self.path).map_err(|e| {
                CryptoError::KeyProvider(format!("Failed to read master key: {}", e))
            })?);
            let secret = Zeroizing::new(STANDARD.decode(encoded.trim()).map_err(|e| {
                CryptoError::KeyProvider(format!("Master key file is not valid base64: {}", e))
            })?);
            if secret.len() != MASTER_KEY_LENGTH {
                return Err(CryptoError::KeyProvider(format!(
                    "Master key must be {} bytes, got {}",
                    MASTER_KEY_LENGTH,
                    secret.len()
                )));
            }
            debug!(path = %self.path.display(), "master key loaded");
            return Ok(hmac::Key::new(hmac::HMAC_SHA512, &secret));
        }

        let secret = generate_master_key(&self.rng)?;
        self.write_key_file(&secret)?;
        info!(path = %self.path.display(), "master key created");
        Ok(hmac::Key::new(hmac::HMAC_SHA512, &secret))
    }

    fn write_key_file(&self, secret: &[u8]) -> Result<(), CryptoError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CryptoError::KeyProvider(format!("Failed to create key directory: {}", e))
            })?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let encoded = Zeroizing::new(STANDARD.encode(secret));
        let mut file = options.open(&self.path).map_err(|e| {
            CryptoError::KeyProvider(format!("Failed to create master key file: {}", e))
        })?;
        file.write_all(encoded.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| CryptoError::KeyProvider(format!("Failed to write master key: {}", e)))
    }
}

impl KeyProvider for FileKeyProvider {
    fn sign(&mut self, data: &[u8]) -> Result<[u8; SIGNATURE_LENGTH], CryptoError> {
        if self.key.is_none() {
            self.key = Some(self.load_or_create()?);
        }
        match &self.key {
            Some(key) => Ok(sign_with(key, data)),
            None => Err(CryptoError::KeyProvider("Master key unavailable".to_string())),
        }
    }
}
