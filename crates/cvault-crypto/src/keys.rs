//! Key provider: random key generation and base64 import/export

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use cvault_core::{VaultError, VaultResult};

use crate::KEY_SIZE;

/// Where a key came from. Only random keys created as extractable may be
/// exported; derived keys exist for a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    Random { extractable: bool },
    Derived,
}

/// A 256-bit AES key. Zeroized on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
    origin: KeyOrigin,
}

impl SymmetricKey {
    pub(crate) fn random(bytes: [u8; KEY_SIZE], extractable: bool) -> Self {
        Self {
            bytes,
            origin: KeyOrigin::Random { extractable },
        }
    }

    pub(crate) fn derived(bytes: [u8; KEY_SIZE]) -> Self {
        Self {
            bytes,
            origin: KeyOrigin::Derived,
        }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    pub fn origin(&self) -> KeyOrigin {
        self.origin
    }

    pub fn is_extractable(&self) -> bool {
        matches!(self.origin, KeyOrigin::Random { extractable: true })
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .field("origin", &self.origin)
            .finish()
    }
}

/// Generate a random, exportable 256-bit key.
pub fn generate_key() -> SymmetricKey {
    generate_key_with(true)
}

/// Generate a random 256-bit key, choosing whether it may later be exported.
pub fn generate_key_with(extractable: bool) -> SymmetricKey {
    let mut bytes = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut bytes);
    let key = SymmetricKey::random(bytes, extractable);
    bytes.zeroize();
    key
}

/// Export the raw key bytes as standard base64.
pub fn export_key(key: &SymmetricKey) -> VaultResult<String> {
    if !key.is_extractable() {
        return Err(VaultError::KeyNotExtractable);
    }
    Ok(STANDARD.encode(key.as_bytes()))
}

/// Import a key previously produced by [`export_key`].
///
/// Leading and trailing whitespace is ignored so pasted keys with a
/// trailing newline still import.
pub fn import_key(text: &str) -> VaultResult<SymmetricKey> {
    let raw = Zeroizing::new(
        STANDARD
            .decode(text.trim())
            .map_err(|e| VaultError::InvalidKeyFormat(format!("base64 decode: {e}")))?,
    );

    if raw.len() != KEY_SIZE {
        return Err(VaultError::InvalidKeyFormat(format!(
            "expected {KEY_SIZE} bytes, got {}",
            raw.len()
        )));
    }

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&raw);
    let key = SymmetricKey::random(bytes, true);
    bytes.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let k1 = generate_key();
        let k2 = generate_key();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
        assert_eq!(k1.origin(), KeyOrigin::Random { extractable: true });
    }

    #[test]
    fn test_export_import_roundtrip() {
        let key = generate_key();
        let text = export_key(&key).unwrap();
        let imported = import_key(&text).unwrap();

        assert_eq!(key.as_bytes(), imported.as_bytes());
        assert!(imported.is_extractable());
    }

    #[test]
    fn test_export_text_length() {
        let text = export_key(&generate_key()).unwrap();
        // 32 bytes -> 44 base64 chars with padding
        assert_eq!(text.len(), 44);
    }

    #[test]
    fn test_import_tolerates_trailing_newline() {
        let key = generate_key();
        let text = format!("{}\n", export_key(&key).unwrap());
        let imported = import_key(&text).unwrap();
        assert_eq!(key.as_bytes(), imported.as_bytes());
    }

    #[test]
    fn test_export_non_extractable_fails() {
        let key = generate_key_with(false);
        assert!(matches!(
            export_key(&key),
            Err(VaultError::KeyNotExtractable)
        ));
    }

    #[test]
    fn test_export_derived_fails() {
        let key = SymmetricKey::derived([7u8; KEY_SIZE]);
        assert!(matches!(
            export_key(&key),
            Err(VaultError::KeyNotExtractable)
        ));
    }

    #[test]
    fn test_import_wrong_length() {
        let short = STANDARD.encode([1u8; 16]);
        assert!(matches!(
            import_key(&short),
            Err(VaultError::InvalidKeyFormat(_))
        ));

        let long = STANDARD.encode([1u8; 33]);
        assert!(matches!(
            import_key(&long),
            Err(VaultError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn test_import_not_base64() {
        assert!(matches!(
            import_key("not base64 at all!"),
            Err(VaultError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn test_debug_redacts_bytes() {
        let key = SymmetricKey::random([0xAB; KEY_SIZE], true);
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("171"));
    }
}
