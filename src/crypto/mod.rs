pub mod encryption;
pub mod keys;
pub mod token;

pub use encryption::*;
pub use keys::*;
pub use token::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Corrupted sealed blob")]
    CorruptedBlob,

    #[error("Secret too short: {len} bytes, need at least {min}")]
    WeakSecret { len: usize, min: usize },

    #[error("Key derivation failed")]
    KeyDerivation,
}
