use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::keys::{ExportKey, KEY_LENGTH, SALT_LENGTH};
use super::CryptoError;

pub const NONCE_LENGTH: usize = 12;

/// One sealed blob. The ciphertext carries the GCM tag at its end.
#[derive(Debug, Clone)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_LENGTH],
    pub ciphertext: Vec<u8>,
}

fn cipher(key_bytes: &[u8; KEY_LENGTH]) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key_bytes))
}

impl EncryptedData {
    /// Fresh random nonce per call.
    pub(crate) fn seal(key_bytes: &[u8; KEY_LENGTH], plaintext: &[u8]) -> Result<Self, CryptoError> {
        let mut nonce = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = cipher(key_bytes)
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        Ok(Self { nonce, ciphertext })
    }

    pub(crate) fn open(&self, key_bytes: &[u8; KEY_LENGTH]) -> Result<Vec<u8>, CryptoError> {
        cipher(key_bytes)
            .decrypt(Nonce::from_slice(&self.nonce), self.ciphertext.as_slice())
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

/// Wire envelope of an encrypted export: `{"salt", "iv", "data"}`, base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub salt: String,
    pub iv: String,
    pub data: String,
}

impl EncryptedPayload {
    fn decode_fixed<const N: usize>(field: &str) -> Result<[u8; N], CryptoError> {
        let bytes = STANDARD
            .decode(field)
            .map_err(|_| CryptoError::MalformedPayload)?;
        bytes.try_into().map_err(|_| CryptoError::MalformedPayload)
    }
}

/// Encrypt text under a password. Salt and IV are fresh on every call,
/// so identical inputs never produce identical payloads.
pub fn encrypt_string(password: &str, plaintext: &str) -> Result<String, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::EmptyPassword);
    }

    let key = ExportKey::fresh(password);
    let encrypted = key.encrypt(plaintext.as_bytes())?;

    let payload = EncryptedPayload {
        salt: STANDARD.encode(key.salt()),
        iv: STANDARD.encode(encrypted.nonce),
        data: STANDARD.encode(&encrypted.ciphertext),
    };
    serde_json::to_string(&payload).map_err(|_| CryptoError::EncryptionFailed)
}

/// Decrypt a payload produced by [`encrypt_string`].
///
/// Fails on malformed envelopes, wrong passwords and tampered ciphertext;
/// never returns unauthenticated bytes.
pub fn decrypt_string(password: &str, payload: &str) -> Result<String, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::EmptyPassword);
    }

    let envelope: EncryptedPayload =
        serde_json::from_str(payload).map_err(|_| CryptoError::MalformedPayload)?;
    let salt: [u8; SALT_LENGTH] = EncryptedPayload::decode_fixed(&envelope.salt)?;
    let nonce: [u8; NONCE_LENGTH] = EncryptedPayload::decode_fixed(&envelope.iv)?;
    let ciphertext = STANDARD
        .decode(&envelope.data)
        .map_err(|_| CryptoError::MalformedPayload)?;

    let key = ExportKey::with_salt(password, salt);
    let plain = key.decrypt(&EncryptedData { nonce, ciphertext })?;
    String::from_utf8(plain).map_err(|_| CryptoError::MalformedPayload)
}
