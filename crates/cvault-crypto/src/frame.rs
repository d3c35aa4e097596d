//! Blob framing: `[salt?][nonce][ciphertext + tag]`, binary and base64
//!
//! Key-based blobs carry no salt. Password-based blobs start with the 16-byte
//! Argon2id salt so the key can be re-derived from the password alone.
//! Lengths are validated before any key derivation runs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::SecretString;
use zeroize::Zeroize;

use cvault_core::{VaultError, VaultResult};

use crate::aead;
use crate::kdf::{derive_key, KdfParams};
use crate::keys::SymmetricKey;
use crate::{NONCE_SIZE, SALT_SIZE, TAG_SIZE};

/// Smallest valid key-based blob: nonce + empty ciphertext + tag.
pub const MIN_BLOB_LEN: usize = NONCE_SIZE + TAG_SIZE;

/// Smallest valid salted blob.
pub const MIN_SALTED_BLOB_LEN: usize = SALT_SIZE + MIN_BLOB_LEN;

/// Encrypt `plaintext` under `key`.
///
/// Returns `[12-byte nonce][ciphertext][16-byte tag]`.
pub fn seal(plaintext: &[u8], key: &SymmetricKey) -> VaultResult<Vec<u8>> {
    let sealed = aead::encrypt(plaintext, key)?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + sealed.ciphertext.len());
    blob.extend_from_slice(&sealed.nonce);
    blob.extend_from_slice(&sealed.ciphertext);
    Ok(blob)
}

/// Decrypt a blob produced by [`seal`].
pub fn open(blob: &[u8], key: &SymmetricKey) -> VaultResult<Vec<u8>> {
    if blob.len() < MIN_BLOB_LEN {
        return Err(VaultError::malformed(format!(
            "blob too short: {} bytes (minimum {MIN_BLOB_LEN})",
            blob.len()
        )));
    }
    let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
    aead::decrypt(nonce, ciphertext, key)
}

/// Encrypt under `key` and prefix the result with `salt`.
fn seal_salted(
    plaintext: &[u8],
    key: &SymmetricKey,
    salt: &[u8; SALT_SIZE],
) -> VaultResult<Vec<u8>> {
    let body = seal(plaintext, key)?;

    let mut blob = Vec::with_capacity(SALT_SIZE + body.len());
    blob.extend_from_slice(salt);
    blob.extend_from_slice(&body);
    Ok(blob)
}

/// Split a salted blob into its salt and the `[nonce][ciphertext]` remainder.
fn split_salt(blob: &[u8]) -> VaultResult<([u8; SALT_SIZE], &[u8])> {
    if blob.len() < MIN_SALTED_BLOB_LEN {
        return Err(VaultError::malformed(format!(
            "salted blob too short: {} bytes (minimum {MIN_SALTED_BLOB_LEN})",
            blob.len()
        )));
    }
    let (salt_bytes, body) = blob.split_at(SALT_SIZE);
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(salt_bytes);
    Ok((salt, body))
}

/// Encrypt with a key derived from `password` and a fresh salt.
///
/// Returns `[16-byte salt][12-byte nonce][ciphertext][16-byte tag]`.
pub fn seal_with_password(
    plaintext: &[u8],
    password: &SecretString,
    params: &KdfParams,
) -> VaultResult<Vec<u8>> {
    let derived = derive_key(password, None, params)?;
    seal_salted(plaintext, &derived.key, &derived.salt)
}

/// Decrypt a blob produced by [`seal_with_password`].
pub fn open_with_password(
    blob: &[u8],
    password: &SecretString,
    params: &KdfParams,
) -> VaultResult<Vec<u8>> {
    let (salt, body) = split_salt(blob)?;
    let derived = derive_key(password, Some(&salt), params)?;
    open(body, &derived.key)
}

/// Encrypt a text message under `key`; returns base64 of `[nonce][ct]`.
pub fn pack_message(plaintext: &str, key: &SymmetricKey) -> VaultResult<String> {
    Ok(encode_b64(&seal(plaintext.as_bytes(), key)?))
}

/// Reverse of [`pack_message`].
pub fn unpack_message(text: &str, key: &SymmetricKey) -> VaultResult<String> {
    let blob = decode_b64(text)?;
    into_utf8(open(&blob, key)?)
}

/// Like [`pack_message`] but with a caller-chosen salt stored in front.
///
/// The salt is carried, not used: `key` is applied as-is.
pub fn pack_message_salted(
    plaintext: &str,
    key: &SymmetricKey,
    salt: &[u8; SALT_SIZE],
) -> VaultResult<String> {
    Ok(encode_b64(&seal_salted(plaintext.as_bytes(), key, salt)?))
}

/// Reverse of [`pack_message_salted`]; the salt is skipped.
pub fn unpack_message_salted(text: &str, key: &SymmetricKey) -> VaultResult<String> {
    let blob = decode_b64(text)?;
    let (_salt, body) = split_salt(&blob)?;
    into_utf8(open(body, key)?)
}

/// Encrypt a text message under `password`; returns base64 of `[salt][nonce][ct]`.
pub fn pack_message_with_password(
    plaintext: &str,
    password: &SecretString,
    params: &KdfParams,
) -> VaultResult<String> {
    Ok(encode_b64(&seal_with_password(
        plaintext.as_bytes(),
        password,
        params,
    )?))
}

/// Reverse of [`pack_message_with_password`].
pub fn unpack_message_with_password(
    text: &str,
    password: &SecretString,
    params: &KdfParams,
) -> VaultResult<String> {
    let blob = decode_b64(text)?;
    into_utf8(open_with_password(&blob, password, params)?)
}

pub(crate) fn encode_b64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub(crate) fn decode_b64(text: &str) -> VaultResult<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| VaultError::malformed(format!("base64 decode: {e}")))
}

/// Convert decrypted bytes to a `String`, wiping them if they are not UTF-8.
pub(crate) fn into_utf8(plaintext: Vec<u8>) -> VaultResult<String> {
    String::from_utf8(plaintext).map_err(|e| {
        let mut bytes = e.into_bytes();
        bytes.zeroize();
        VaultError::malformed("decrypted message is not UTF-8")
    })
}
