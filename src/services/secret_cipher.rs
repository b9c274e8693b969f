use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, KeyInit, Nonce};

/// Hex-encoded ciphertext (ct plus appended auth tag) and the nonce it was
/// sealed with. Stored side by side on the user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    pub cipher: String,
    pub nonce: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("Encryption failed")]
    Encrypt,
    #[error("Decryption failed")]
    Decrypt,
    #[error("Malformed ciphertext or nonce")]
    Malformed,
}

/// AES-256-GCM at-rest protection for TOTP secrets. A fresh 96-bit nonce is
/// drawn for every encryption; nonce reuse under one key voids both
/// confidentiality and integrity.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    pub fn new(key: &[u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<SealedSecret, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        Ok(SealedSecret {
            cipher: hex::encode(ciphertext),
            nonce: hex::encode(nonce),
        })
    }

    pub fn decrypt(&self, cipher_hex: &str, nonce_hex: &str) -> Result<String, CipherError> {
        let ciphertext = hex::decode(cipher_hex).map_err(|_| CipherError::Malformed)?;
        let nonce_bytes = hex::decode(nonce_hex).map_err(|_| CipherError::Malformed)?;
        if nonce_bytes.len() != 12 {
            return Err(CipherError::Malformed);
        }
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt)
    }
}
