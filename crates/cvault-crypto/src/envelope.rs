//! File envelope: filename + contents in one plaintext
//!
//! ```text
//! [4 bytes: filename length, u32 LE][filename UTF-8][file bytes]
//! ```
//!
//! The envelope is sealed whole, so the filename is as confidential as the
//! contents and is restored on decryption.

use secrecy::SecretString;
use zeroize::Zeroizing;

use cvault_core::{VaultError, VaultResult};

use crate::frame::{open, open_with_password, seal, seal_with_password};
use crate::kdf::KdfParams;
use crate::keys::SymmetricKey;

const LEN_PREFIX: usize = 4;

/// A decrypted file: the name it was encrypted under and its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl FilePayload {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Build the envelope plaintext for `filename` and `data`.
pub fn wrap(filename: &str, data: &[u8]) -> VaultResult<Vec<u8>> {
    let name = filename.as_bytes();
    let name_len = u32::try_from(name.len())
        .map_err(|_| VaultError::malformed("filename longer than 4 GiB"))?;

    let mut buf = Vec::with_capacity(LEN_PREFIX + name.len() + data.len());
    buf.extend_from_slice(&name_len.to_le_bytes());
    buf.extend_from_slice(name);
    buf.extend_from_slice(data);
    Ok(buf)
}

/// Split an envelope plaintext back into filename and contents.
pub fn unwrap(buf: &[u8]) -> VaultResult<FilePayload> {
    if buf.len() < LEN_PREFIX {
        return Err(VaultError::malformed(format!(
            "file envelope too short: {} bytes",
            buf.len()
        )));
    }

    let (prefix, rest) = buf.split_at(LEN_PREFIX);
    let mut len_bytes = [0u8; LEN_PREFIX];
    len_bytes.copy_from_slice(prefix);
    let name_len = u32::from_le_bytes(len_bytes) as usize;

    if name_len > rest.len() {
        return Err(VaultError::malformed(format!(
            "filename length {name_len} exceeds remaining {} bytes",
            rest.len()
        )));
    }

    let (name, data) = rest.split_at(name_len);
    let filename = std::str::from_utf8(name)
        .map_err(|_| VaultError::malformed("filename is not UTF-8"))?
        .to_string();

    Ok(FilePayload {
        filename,
        data: data.to_vec(),
    })
}

/// Encrypt a file under `key`: envelope, then `[nonce][ct]`.
pub fn encrypt_file(filename: &str, data: &[u8], key: &SymmetricKey) -> VaultResult<Vec<u8>> {
    let plaintext = Zeroizing::new(wrap(filename, data)?);
    seal(&plaintext, key)
}

pub fn decrypt_file(blob: &[u8], key: &SymmetricKey) -> VaultResult<FilePayload> {
    let plaintext = Zeroizing::new(open(blob, key)?);
    unwrap(&plaintext)
}

/// Encrypt a file under `password`: envelope, then `[salt][nonce][ct]`.
pub fn encrypt_file_with_password(
    filename: &str,
    data: &[u8],
    password: &SecretString,
    params: &KdfParams,
) -> VaultResult<Vec<u8>> {
    let plaintext = Zeroizing::new(wrap(filename, data)?);
    seal_with_password(&plaintext, password, params)
}

pub fn decrypt_file_with_password(
    blob: &[u8],
    password: &SecretString,
    params: &KdfParams,
) -> VaultResult<FilePayload> {
    let plaintext = Zeroizing::new(open_with_password(blob, password, params)?);
    unwrap(&plaintext)
}
