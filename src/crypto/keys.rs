use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::encryption::EncryptedData;
use super::CryptoError;

pub const PBKDF2_ITERATIONS: u32 = 250_000;
pub const KEY_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

/// Password-derived AES-256 key for one export, remembering the salt that
/// must travel with the ciphertext. Key bytes are wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ExportKey {
    key_bytes: [u8; KEY_LENGTH],
    #[zeroize(skip)]
    salt: [u8; SALT_LENGTH],
}

impl ExportKey {
    /// New key under a fresh random salt (encrypt side).
    pub fn fresh(password: &str) -> Self {
        Self::with_salt(password, generate_salt())
    }

    /// Re-derive the key an export was sealed with (decrypt side).
    pub fn with_salt(password: &str, salt: [u8; SALT_LENGTH]) -> Self {
        let mut key_bytes = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut key_bytes);
        Self { key_bytes, salt }
    }

    pub fn salt(&self) -> &[u8; SALT_LENGTH] {
        &self.salt
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedData, CryptoError> {
        EncryptedData::seal(&self.key_bytes, plaintext)
    }

    pub fn decrypt(&self, encrypted: &EncryptedData) -> Result<Vec<u8>, CryptoError> {
        encrypted.open(&self.key_bytes)
    }
}

pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_password_and_salt_give_same_key() {
        let a = ExportKey::with_salt("correct horse", [7u8; SALT_LENGTH]);
        let b = ExportKey::with_salt("correct horse", [7u8; SALT_LENGTH]);
        assert_eq!(a.key_bytes, b.key_bytes);
    }

    #[test]
    fn key_depends_on_password_and_salt() {
        let base = ExportKey::with_salt("pw", [1u8; SALT_LENGTH]);
        let other_pw = ExportKey::with_salt("pw2", [1u8; SALT_LENGTH]);
        let other_salt = ExportKey::with_salt("pw", [2u8; SALT_LENGTH]);
        assert_ne!(base.key_bytes, other_pw.key_bytes);
        assert_ne!(base.key_bytes, other_salt.key_bytes);
    }

    #[test]
    fn fresh_keys_get_distinct_salts() {
        let a = ExportKey::fresh("pw");
        let b = ExportKey::fresh("pw");
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.key_bytes, b.key_bytes);
    }

    #[test]
    fn rederived_key_opens_fresh_key_output() {
        let sealing = ExportKey::fresh("pw");
        let sealed = sealing.encrypt(b"workers").unwrap();
        let opening = ExportKey::with_salt("pw", *sealing.salt());
        assert_eq!(opening.decrypt(&sealed).unwrap(), b"workers");
    }
}
