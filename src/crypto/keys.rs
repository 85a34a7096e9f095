use hkdf::Hkdf;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use super::encryption::EncryptedData;
use super::CryptoError;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const KEY_LENGTH: usize = 32; // AES-256
pub const SALT_LENGTH: usize = 32;
pub const MIN_SECRET_LENGTH: usize = 32;

const TOKEN_KEY_INFO: &[u8] = b"geni/v1/token-signing";
const SEALING_KEY_INFO: &[u8] = b"geni/v1/report-sealing";

/// Server master secret from configuration: zeroed on drop
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterSecret {
    bytes: Vec<u8>,
}

impl MasterSecret {
    pub fn new(secret: &str) -> Result<Self, CryptoError> {
        let bytes = secret.as_bytes().to_vec();
        if bytes.len() < MIN_SECRET_LENGTH {
            return Err(CryptoError::WeakSecret {
                len: bytes.len(),
                min: MIN_SECRET_LENGTH,
            });
        }
        Ok(Self { bytes })
    }

    /// Split into independent keys via HKDF-SHA256 so the token signer
    /// and the report sealer never share key material.
    pub fn derive_subkeys(&self) -> Result<SubKeys, CryptoError> {
        let hk = Hkdf::<Sha256>::new(None, &self.bytes);
        let mut token_key = [0u8; KEY_LENGTH];
        let mut sealing_passphrase = [0u8; KEY_LENGTH];
        hk.expand(TOKEN_KEY_INFO, &mut token_key)
            .map_err(|_| CryptoError::KeyDerivation)?;
        hk.expand(SEALING_KEY_INFO, &mut sealing_passphrase)
            .map_err(|_| CryptoError::KeyDerivation)?;
        Ok(SubKeys {
            token_key,
            sealing_passphrase,
        })
    }
}

#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SubKeys {
    pub token_key: [u8; KEY_LENGTH],
    pub sealing_passphrase: [u8; KEY_LENGTH],
}

/// Per-report encryption key: zeroed on drop
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct ReportKey {
    pub(super) key_bytes: [u8; KEY_LENGTH],
}

impl ReportKey {
    /// Derive from passphrase + salt using PBKDF2-SHA256
    pub fn derive(passphrase: &[u8], salt: &[u8; SALT_LENGTH], iterations: u32) -> Self {
        let mut key_bytes = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(passphrase, salt, iterations, &mut key_bytes);
        Self { key_bytes }
    }

    /// Encrypt data using AES-256-GCM, binding `aad`
    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<EncryptedData, CryptoError> {
        EncryptedData::encrypt(&self.key_bytes, plaintext, aad)
    }

    /// Decrypt data using AES-256-GCM, checking `aad`
    pub fn decrypt(&self, encrypted: &EncryptedData, aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        encrypted.decrypt(&self.key_bytes, aad)
    }
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
