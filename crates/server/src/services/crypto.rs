//! At-rest encryption for broker account addresses.
//!
//! Addresses are encrypted before they touch the database and are also used
//! as lookup keys (finding the local user behind a broker-reported owner).
//! That lookup requires encryption to be deterministic, so a fixed nonce is
//! used throughout: identical plaintexts produce identical ciphertexts.
//! Equality of addresses is therefore visible in the database, nothing else.

use aes_gcm_siv::aead::{Aead, KeyInit};
use aes_gcm_siv::{Aes256GcmSiv, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};

/// Errors from address encryption and decryption.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("encryption key must be 32 bytes of base64")]
    InvalidKey,

    #[error("failed to encrypt address")]
    Encrypt,

    #[error("failed to decrypt address")]
    Decrypt,
}

/// Deterministic AES-256-GCM-SIV cipher for broker addresses.
#[derive(Clone)]
pub struct AddressCipher {
    cipher: Aes256GcmSiv,
}

impl AddressCipher {
    const NONCE: [u8; 12] = [0u8; 12];

    /// Build a cipher from a base64-encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKey` if the key is not valid base64 or
    /// does not decode to exactly 32 bytes.
    pub fn new(key: &SecretString) -> Result<Self, CryptoError> {
        let key_bytes = BASE64
            .decode(key.expose_secret())
            .map_err(|_| CryptoError::InvalidKey)?;
        if key_bytes.len() != 32 {
            return Err(CryptoError::InvalidKey);
        }

        let key = Key::<Aes256GcmSiv>::from_slice(&key_bytes);
        Ok(Self {
            cipher: Aes256GcmSiv::new(key),
        })
    }

    /// Encrypt an address into base64 ciphertext.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Encrypt` if encryption fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Nonce::from_slice(&Self::NONCE);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;
        Ok(BASE64.encode(ciphertext))
    }

    /// Decrypt base64 ciphertext back into the address.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Decrypt` if the input is not valid base64 or
    /// the ciphertext fails authentication.
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let ciphertext = BASE64.decode(encoded).map_err(|_| CryptoError::Decrypt)?;
        let nonce = Nonce::from_slice(&Self::NONCE);
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| CryptoError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::Decrypt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cipher() -> AddressCipher {
        let key = SecretString::from(BASE64.encode([7u8; 32]));
        AddressCipher::new(&key).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let cipher = cipher();
        let encrypted = cipher.encrypt("0x1234abcd").unwrap();
        assert_ne!(encrypted, "0x1234abcd");
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), "0x1234abcd");
    }

    #[test]
    fn test_encryption_is_deterministic() {
        let cipher = cipher();
        let a = cipher.encrypt("0x1234abcd").unwrap();
        let b = cipher.encrypt("0x1234abcd").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_key() {
        assert!(matches!(
            AddressCipher::new(&SecretString::from("not base64!!")),
            Err(CryptoError::InvalidKey)
        ));
        assert!(matches!(
            AddressCipher::new(&SecretString::from(BASE64.encode([1u8; 16]))),
            Err(CryptoError::InvalidKey)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let cipher = cipher();
        let mut encrypted = cipher.encrypt("0x1234abcd").unwrap();
        encrypted.replace_range(0..1, "A");
        // either the base64 or the auth tag check fails
        assert!(cipher.decrypt(&encrypted).is_err() || cipher.decrypt(&encrypted).unwrap() != "0x1234abcd");
    }
}
