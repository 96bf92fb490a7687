use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose, Engine as _};

use crate::error::{AppError, AppResult};

const NONCE_LEN: usize = 12;

/// AES-256-GCM cipher for credential secrets at rest.
///
/// Stored form is base64(nonce || ciphertext). The key is loaded once at
/// startup and handed to whoever needs it; nothing reads it from the
/// environment after that.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    /// Build a cipher from a base64-encoded 32-byte key
    pub fn from_base64_key(key_b64: &str) -> AppResult<Self> {
        let key_bytes = general_purpose::STANDARD
            .decode(key_b64.trim())
            .map_err(|e| AppError::Encryption(format!("Failed to decode key: {}", e)))?;

        Self::from_key_bytes(&key_bytes)
    }

    pub fn from_key_bytes(key_bytes: &[u8]) -> AppResult<Self> {
        if key_bytes.len() != 32 {
            return Err(AppError::Encryption(format!(
                "Key must be 32 bytes (256 bits), got {} bytes",
                key_bytes.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(key_bytes)
            .map_err(|e| AppError::Encryption(format!("Failed to create cipher: {}", e)))?;

        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| AppError::Encryption(format!("Encryption failed: {}", e)))?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(sealed))
    }

    pub fn decrypt(&self, encrypted_b64: &str) -> AppResult<String> {
        let sealed = general_purpose::STANDARD
            .decode(encrypted_b64)
            .map_err(|e| AppError::Encryption(format!("Failed to decode secret: {}", e)))?;

        if sealed.len() < NONCE_LEN {
            return Err(AppError::Encryption("Ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| AppError::Encryption(format!("Decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::Encryption(format!("Secret is not valid UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> SecretCipher {
        SecretCipher::from_key_bytes(&[7u8; 32]).unwrap()
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let cipher = test_cipher();
        let sealed = cipher.encrypt("rnd_abc123").unwrap();

        assert_ne!(sealed, "rnd_abc123");
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "rnd_abc123");
    }

    #[test]
    fn test_same_plaintext_gets_distinct_nonces() {
        let cipher = test_cipher();
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_wrong_key_length() {
        let short = general_purpose::STANDARD.encode([1u8; 16]);
        assert!(matches!(
            SecretCipher::from_base64_key(&short),
            Err(AppError::Encryption(_))
        ));
    }

    #[test]
    fn test_decrypt_with_other_key_fails() {
        let sealed = test_cipher().encrypt("secret").unwrap();
        let other = SecretCipher::from_key_bytes(&[9u8; 32]).unwrap();
        assert!(other.decrypt(&sealed).is_err());
    }

    #[test]
    fn test_decrypt_rejects_truncated_input() {
        let truncated = general_purpose::STANDARD.encode([0u8; 4]);
        assert!(test_cipher().decrypt(&truncated).is_err());
    }
}
