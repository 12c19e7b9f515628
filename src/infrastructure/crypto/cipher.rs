//! Deterministic AES-256-GCM cipher for bearer secrets
//!
//! The nonce is derived from the plaintext with a keyed HMAC, so the same
//! secret always encrypts to the same bytes under the same key. Stores rely
//! on this to look a credential up by ciphertext equality without keeping
//! plaintext anywhere.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::Aes256Gcm;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::EncryptionConfig;
use crate::domain::DomainError;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const ENCRYPTION_KEY_LABEL: &[u8] = b"lynxgate/secret-encryption/v1";
const NONCE_KEY_LABEL: &[u8] = b"lynxgate/secret-nonce/v1";

/// Process-wide cipher built once from the configured key material
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
    nonce_key: [u8; 32],
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher")
            .field("algorithm", &"AES-256-GCM")
            .finish_non_exhaustive()
    }
}

impl SecretCipher {
    /// Derive the encryption and nonce subkeys from the configured key
    pub fn new(config: &EncryptionConfig) -> Result<Self, DomainError> {
        if config.key.trim().is_empty() {
            return Err(DomainError::configuration("encryption key is not set"));
        }

        let material = config.key.as_bytes();
        let encryption_key = derive_subkey(material, ENCRYPTION_KEY_LABEL)?;
        let nonce_key = derive_subkey(material, NONCE_KEY_LABEL)?;

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&encryption_key));

        Ok(Self { cipher, nonce_key })
    }

    /// Encrypt a secret. Output layout: nonce || ciphertext || tag.
    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, DomainError> {
        let nonce = self.synthetic_nonce(plaintext.as_bytes())?;

        let ciphertext = self
            .cipher
            .encrypt(GenericArray::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| DomainError::encryption(format!("AES-256-GCM encryption failed: {e}")))?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Decrypt bytes produced by [`SecretCipher::encrypt`] under the same key
    pub fn decrypt(&self, data: &[u8]) -> Result<String, DomainError> {
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(DomainError::encryption("ciphertext too short"));
        }

        let (nonce, ciphertext) = data.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(GenericArray::from_slice(nonce), ciphertext)
            .map_err(|e| DomainError::encryption(format!("AES-256-GCM decryption failed: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|_| DomainError::encryption("decrypted secret is not valid UTF-8"))
    }

    fn synthetic_nonce(&self, plaintext: &[u8]) -> Result<[u8; NONCE_LEN], DomainError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.nonce_key)
            .map_err(|e| DomainError::encryption(format!("invalid nonce key: {e}")))?;
        mac.update(plaintext);
        let digest = mac.finalize().into_bytes();

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&digest[..NONCE_LEN]);
        Ok(nonce)
    }
}

fn derive_subkey(material: &[u8], label: &[u8]) -> Result<[u8; 32], DomainError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(material)
        .map_err(|e| DomainError::configuration(format!("invalid encryption key: {e}")))?;
    mac.update(label);
    let digest = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher(key: &str) -> SecretCipher {
        SecretCipher::new(&EncryptionConfig::new(key)).unwrap()
    }

    #[test]
    fn test_rejects_empty_key() {
        let err = SecretCipher::new(&EncryptionConfig::new("")).unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));

        assert!(SecretCipher::new(&EncryptionConfig::new("   ")).is_err());
    }

    #[test]
    fn test_encryption_is_deterministic() {
        let cipher = cipher("process-key");

        let first = cipher.encrypt("0123456789abcdef0123456789abcdef").unwrap();
        let second = cipher.encrypt("0123456789abcdef0123456789abcdef").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_secrets_have_distinct_ciphertexts() {
        let cipher = cipher("process-key");

        let a = cipher.encrypt("secret-a").unwrap();
        let b = cipher.encrypt("secret-b").unwrap();

        assert_ne!(a, b);
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
    }

    #[test]
    fn test_distinct_keys_have_distinct_ciphertexts() {
        let a = cipher("key-one").encrypt("same-secret").unwrap();
        let b = cipher("key-two").encrypt("same-secret").unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_ciphertext_does_not_contain_plaintext() {
        let cipher = cipher("process-key");
        let plaintext = "0123456789abcdef0123456789abcdef";

        let encrypted = cipher.encrypt(plaintext).unwrap();

        assert_eq!(encrypted.len(), NONCE_LEN + plaintext.len() + TAG_LEN);
        assert!(
            !encrypted
                .windows(plaintext.len())
                .any(|w| w == plaintext.as_bytes())
        );
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), plaintext);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let encrypted = cipher("key-one").encrypt("secret").unwrap();

        let err = cipher("key-two").decrypt(&encrypted).unwrap_err();
        assert!(matches!(err, DomainError::Encryption { .. }));
    }

    #[test]
    fn test_decrypt_tampered_fails() {
        let cipher = cipher("process-key");
        let mut encrypted = cipher.encrypt("secret").unwrap();
        let last = encrypted.len() - 1;
        encrypted[last] ^= 0x01;

        assert!(cipher.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_decrypt_short_input_fails() {
        let cipher = cipher("process-key");
        assert!(cipher.decrypt(&[0u8; 8]).is_err());
    }

    #[test]
    fn test_debug_does_not_leak_keys() {
        let debug = format!("{:?}", cipher("process-key"));
        assert!(!debug.contains("process-key"));
        assert!(debug.contains("SecretCipher"));
    }
}
