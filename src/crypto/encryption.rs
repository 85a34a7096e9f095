use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroize;

use super::keys::{generate_salt, ReportKey, KEY_LENGTH, PBKDF2_ITERATIONS, SALT_LENGTH};
use super::CryptoError;

const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;
const BLOB_MAGIC: &[u8; 4] = b"GNI1";
const HEADER_LENGTH: usize = 4 + 4 + SALT_LENGTH + NONCE_LENGTH;

/// Encrypted data container: nonce + ciphertext (includes AES-GCM auth tag)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_LENGTH],
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Encrypt plaintext using AES-256-GCM with a random nonce
    pub(crate) fn encrypt(
        key_bytes: &[u8; KEY_LENGTH],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<Self, CryptoError> {
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        let cipher = Aes256Gcm::new(key);

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, Payload { msg: plaintext, aad })
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(Self {
            nonce: nonce_bytes,
            ciphertext,
        })
    }

    /// Decrypt ciphertext using AES-256-GCM
    pub(crate) fn decrypt(
        &self,
        key_bytes: &[u8; KEY_LENGTH],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        let cipher = Aes256Gcm::new(key);
        let nonce = Nonce::from_slice(&self.nonce);

        cipher
            .decrypt(
                nonce,
                Payload {
                    msg: self.ciphertext.as_ref(),
                    aad,
                },
            )
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

/// Self-describing encrypted report as stored in the database.
///
/// Layout: `[magic "GNI1"][iterations u32 BE][32-byte salt][12-byte nonce][ciphertext+tag]`
#[derive(Debug, Clone)]
pub struct SealedBlob {
    pub iterations: u32,
    pub salt: [u8; SALT_LENGTH],
    pub data: EncryptedData,
}

impl SealedBlob {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LENGTH + self.data.ciphertext.len());
        bytes.extend_from_slice(BLOB_MAGIC);
        bytes.extend_from_slice(&self.iterations.to_be_bytes());
        bytes.extend_from_slice(&self.salt);
        bytes.extend_from_slice(&self.data.nonce);
        bytes.extend_from_slice(&self.data.ciphertext);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        // AES-GCM auth tag is 16 bytes minimum
        if bytes.len() < HEADER_LENGTH + TAG_LENGTH {
            return Err(CryptoError::CorruptedBlob);
        }
        let (magic, rest) = bytes.split_at(4);
        if magic != BLOB_MAGIC {
            return Err(CryptoError::CorruptedBlob);
        }

        let (iter_bytes, rest) = rest.split_at(4);
        let iterations = u32::from_be_bytes(
            iter_bytes
                .try_into()
                .map_err(|_| CryptoError::CorruptedBlob)?,
        );
        if iterations == 0 {
            return Err(CryptoError::CorruptedBlob);
        }

        let (salt_bytes, rest) = rest.split_at(SALT_LENGTH);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LENGTH);

        let mut salt = [0u8; SALT_LENGTH];
        salt.copy_from_slice(salt_bytes);
        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            iterations,
            salt,
            data: EncryptedData {
                nonce,
                ciphertext: ciphertext.to_vec(),
            },
        })
    }
}

/// Seals report JSON at rest. Each report gets a fresh salt and
/// therefore its own key; the report id is bound as associated data.
pub struct ReportSealer {
    passphrase: Vec<u8>,
    iterations: u32,
}

impl ReportSealer {
    pub fn new(passphrase: &[u8], iterations: u32) -> Self {
        Self {
            passphrase: passphrase.to_vec(),
            iterations: iterations.max(1),
        }
    }

    pub fn with_default_iterations(passphrase: &[u8]) -> Self {
        Self::new(passphrase, PBKDF2_ITERATIONS)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn seal(&self, report_id: Uuid, plaintext: &[u8]) -> Result<SealedBlob, CryptoError> {
        let salt = generate_salt();
        let key = ReportKey::derive(&self.passphrase, &salt, self.iterations);
        let data = key.encrypt(plaintext, report_id.as_bytes())?;
        Ok(SealedBlob {
            iterations: self.iterations,
            salt,
            data,
        })
    }

    /// Open with the iteration count recorded in the blob, not the
    /// currently configured one.
    pub fn open(&self, report_id: Uuid, blob: &SealedBlob) -> Result<Vec<u8>, CryptoError> {
        let key = ReportKey::derive(&self.passphrase, &blob.salt, blob.iterations);
        key.decrypt(&blob.data, report_id.as_bytes())
    }
}

impl Drop for ReportSealer {
    fn drop(&mut self) {
        self.passphrase.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    fn sealer() -> ReportSealer {
        ReportSealer::new(b"test-sealing-passphrase", FAST)
    }

    fn test_key() -> ReportKey {
        ReportKey::derive(b"test_password", &[0u8; SALT_LENGTH], FAST)
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = test_key();
        let plaintext = b"Hello, Geni report data!";
        let encrypted = key.encrypt(plaintext, b"").unwrap();
        let decrypted = key.decrypt(&encrypted, b"").unwrap();
        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn decrypt_with_wrong_key_fails() {
        let key1 = ReportKey::derive(b"password1", &[0u8; SALT_LENGTH], FAST);
        let key2 = ReportKey::derive(b"password2", &[0u8; SALT_LENGTH], FAST);
        let encrypted = key1.encrypt(b"secret", b"").unwrap();
        assert!(key2.decrypt(&encrypted, b"").is_err());
    }

    #[test]
    fn tampered_ciphertext_detected() {
        let key = test_key();
        let encrypted = key.encrypt(b"secret data", b"").unwrap();
        let mut tampered = encrypted.clone();
        tampered.ciphertext[0] ^= 0xFF;
        assert!(key.decrypt(&tampered, b"").is_err());
    }

    #[test]
    fn different_encryptions_produce_different_nonces() {
        let key = test_key();
        let e1 = key.encrypt(b"same data", b"").unwrap();
        let e2 = key.encrypt(b"same data", b"").unwrap();
        assert_ne!(e1.nonce, e2.nonce);
    }

    #[test]
    fn seal_open_round_trip() {
        let id = Uuid::new_v4();
        let blob = sealer().seal(id, b"{\"insights\":[]}").unwrap();
        let restored = SealedBlob::from_bytes(&blob.to_bytes()).unwrap();
        assert_eq!(restored.iterations, FAST);
        assert_eq!(sealer().open(id, &restored).unwrap(), b"{\"insights\":[]}");
    }

    #[test]
    fn blob_bound_to_report_id() {
        let blob = sealer().seal(Uuid::new_v4(), b"report").unwrap();
        let result = sealer().open(Uuid::new_v4(), &blob);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn wrong_passphrase_cannot_open() {
        let id = Uuid::new_v4();
        let blob = sealer().seal(id, b"report").unwrap();
        let other = ReportSealer::new(b"another-passphrase", FAST);
        assert!(other.open(id, &blob).is_err());
    }

    #[test]
    fn open_uses_iterations_from_blob() {
        let id = Uuid::new_v4();
        let blob = sealer().seal(id, b"report").unwrap();
        let reconfigured = ReportSealer::new(b"test-sealing-passphrase", FAST * 2);
        assert_eq!(reconfigured.open(id, &blob).unwrap(), b"report");
    }

    #[test]
    fn each_seal_uses_fresh_salt() {
        let id = Uuid::new_v4();
        let a = sealer().seal(id, b"report").unwrap();
        let b = sealer().seal(id, b"report").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn from_bytes_rejects_short_or_foreign_input() {
        assert!(matches!(
            SealedBlob::from_bytes(&[0u8; 10]),
            Err(CryptoError::CorruptedBlob)
        ));

        let mut bytes = sealer().seal(Uuid::new_v4(), b"x").unwrap().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            SealedBlob::from_bytes(&bytes),
            Err(CryptoError::CorruptedBlob)
        ));
    }

    #[test]
    fn from_bytes_rejects_zero_iterations() {
        let mut bytes = sealer().seal(Uuid::new_v4(), b"x").unwrap().to_bytes();
        bytes[4..8].copy_from_slice(&0u32.to_be_bytes());
        assert!(matches!(
            SealedBlob::from_bytes(&bytes),
            Err(CryptoError::CorruptedBlob)
        ));
    }

    #[test]
    fn empty_plaintext_round_trip() {
        let id = Uuid::new_v4();
        let blob = sealer().seal(id, b"").unwrap();
        assert!(sealer().open(id, &blob).unwrap().is_empty());
    }
}
