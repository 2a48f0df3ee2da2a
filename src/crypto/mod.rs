pub mod encryption;
pub mod keys;

pub use encryption::*;
pub use keys::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Password required")]
    EmptyPassword,

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: wrong password or corrupted data")]
    DecryptionFailed,

    #[error("Malformed encrypted payload")]
    MalformedPayload,
}
