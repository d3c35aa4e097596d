//! Key derivation: Argon2id password + salt → symmetric key

use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use cvault_core::{VaultError, VaultResult};

use crate::keys::SymmetricKey;
use crate::{KEY_SIZE, SALT_SIZE};

/// Argon2id parameters.
///
/// Blobs do not record the parameters they were sealed with, so decryption
/// must use the same value. Production code uses [`KdfParams::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 1,
        }
    }
}

/// A key derived from a password, together with the salt that produced it.
#[derive(Debug)]
pub struct DerivedKey {
    pub key: SymmetricKey,
    pub salt: [u8; SALT_SIZE],
}

/// Derive a 256-bit key from `password` using Argon2id.
///
/// When `salt` is `None` a fresh random salt is generated; the salt is
/// returned so it can be stored in front of the ciphertext.
pub fn derive_key(
    password: &SecretString,
    salt: Option<&[u8; SALT_SIZE]>,
    params: &KdfParams,
) -> VaultResult<DerivedKey> {
    let salt = match salt {
        Some(s) => *s,
        None => {
            let mut s = [0u8; SALT_SIZE];
            OsRng.fill_bytes(&mut s);
            s
        }
    };

    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| VaultError::DerivationFailed(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    tracing::trace!(
        mem_cost_kib = params.mem_cost_kib,
        time_cost = params.time_cost,
        "deriving key"
    );

    let mut bytes = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password.expose_secret().as_bytes(), &salt, &mut bytes)
        .map_err(|e| VaultError::DerivationFailed(format!("Argon2id: {e}")))?;

    let key = SymmetricKey::derived(bytes);
    bytes.zeroize();

    Ok(DerivedKey { key, salt })
}
