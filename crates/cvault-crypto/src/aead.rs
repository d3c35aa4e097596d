//! AES-256-GCM authenticated encryption
//!
//! The nonce is always generated here from the OS CSPRNG; callers cannot
//! supply one, so a (key, nonce) pair is never reused.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

use cvault_core::{VaultError, VaultResult};

use crate::keys::SymmetricKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// Output of [`encrypt`]: the nonce and `ciphertext || tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> VaultResult<Sealed> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| VaultError::malformed("plaintext too large for AES-GCM"))?;

    Ok(Sealed { nonce, ciphertext })
}

/// Decrypt `ciphertext` (with its trailing 16-byte tag) under `key`.
///
/// Returns `AuthenticationFailed` when the tag does not verify; no plaintext
/// is released in that case.
pub fn decrypt(nonce: &[u8], ciphertext: &[u8], key: &SymmetricKey) -> VaultResult<Vec<u8>> {
    if nonce.len() != NONCE_SIZE {
        return Err(VaultError::malformed(format!(
            "nonce must be {NONCE_SIZE} bytes, got {}",
            nonce.len()
        )));
    }
    if ciphertext.len() < TAG_SIZE {
        return Err(VaultError::malformed(format!(
            "ciphertext too short: {} bytes (minimum {TAG_SIZE})",
            ciphertext.len()
        )));
    }

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| VaultError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_key;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = generate_key();
        let plaintext = b"hello, encrypted world!";

        let sealed = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&sealed.nonce, &sealed.ciphertext, &key).unwrap();

        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let key = generate_key();

        let sealed = encrypt(b"", &key).unwrap();
        assert_eq!(sealed.ciphertext.len(), TAG_SIZE);

        let decrypted = decrypt(&sealed.nonce, &sealed.ciphertext, &key).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_ciphertext_size() {
        let key = generate_key();
        let sealed = encrypt(&[0u8; 1000], &key).unwrap();

        // plaintext (1000) + tag (16)
        assert_eq!(sealed.ciphertext.len(), 1000 + TAG_SIZE);
    }

    #[test]
    fn test_nonces_are_fresh() {
        let key = generate_key();
        let a = encrypt(b"same", &key).unwrap();
        let b = encrypt(b"same", &key).unwrap();

        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let sealed = encrypt(b"secret data", &generate_key()).unwrap();
        let result = decrypt(&sealed.nonce, &sealed.ciphertext, &generate_key());

        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }

    #[test]
    fn test_tampered_ciphertext() {
        let key = generate_key();
        let mut sealed = encrypt(b"secret data", &key).unwrap();
        sealed.ciphertext[0] ^= 0xFF;

        let result = decrypt(&sealed.nonce, &sealed.ciphertext, &key);
        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }

    #[test]
    fn test_tampered_nonce() {
        let key = generate_key();
        let mut sealed = encrypt(b"secret data", &key).unwrap();
        sealed.nonce[3] ^= 0x01;

        let result = decrypt(&sealed.nonce, &sealed.ciphertext, &key);
        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }

    #[test]
    fn test_short_inputs_are_malformed() {
        let key = generate_key();

        let result = decrypt(&[0u8; 8], &[0u8; 32], &key);
        assert!(matches!(result, Err(VaultError::MalformedInput(_))));

        let result = decrypt(&[0u8; NONCE_SIZE], &[0u8; TAG_SIZE - 1], &key);
        assert!(matches!(result, Err(VaultError::MalformedInput(_))));
    }
}
