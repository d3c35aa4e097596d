//! Deniable dual-slot containers
//!
//! Container format (binary):
//! ```text
//! [1 byte: marker][4 bytes: real_len, u32 LE][4 bytes: decoy_len, u32 LE]
//! [real_len bytes: real slot][decoy_len bytes: decoy slot]
//! ```
//!
//! Each slot is a password-based blob (`[salt][nonce][ct]`); file containers
//! seal a file envelope in each slot. Message containers (marker 0xDE) travel
//! as base64, file containers (marker 0xDF) as raw bytes.
//!
//! Opening tries the real slot, then the decoy slot, with the one password.
//! Any failure, whatever its cause, surfaces as `IncorrectPassword`.
//! Both attempts always run so the work done does not depend on which slot
//! (if any) matches.

use secrecy::{ExposeSecret, SecretString};

use cvault_core::{VaultError, VaultResult};

use crate::envelope::{self, FilePayload};
use crate::frame::{
    decode_b64, encode_b64, into_utf8, open_with_password, seal_with_password,
};
use crate::kdf::KdfParams;

/// Marker byte of a message container.
pub const MESSAGE_MARKER: u8 = 0xDE;

/// Marker byte of a file container.
pub const FILE_MARKER: u8 = 0xDF;

/// marker + two u32 slot lengths
pub const HEADER_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Message,
    File,
}

impl ContainerKind {
    pub fn marker(self) -> u8 {
        match self {
            Self::Message => MESSAGE_MARKER,
            Self::File => FILE_MARKER,
        }
    }

    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            MESSAGE_MARKER => Some(Self::Message),
            FILE_MARKER => Some(Self::File),
            _ => None,
        }
    }
}

/// Result of opening a container.
///
/// `is_decoy` is bookkeeping for the legitimate holder of the passwords. It
/// must never be displayed to, logged for, or otherwise observable by anyone
/// who compelled the password: doing so would reveal that a real slot exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened<T> {
    pub data: T,
    pub is_decoy: bool,
}

/// Build a message container; returns base64.
pub fn create_message_container(
    real: &str,
    decoy: &str,
    real_password: &SecretString,
    decoy_password: &SecretString,
    params: &KdfParams,
) -> VaultResult<String> {
    ensure_distinct(real_password, decoy_password)?;

    let real_blob = seal_with_password(real.as_bytes(), real_password, params)?;
    let decoy_blob = seal_with_password(decoy.as_bytes(), decoy_password, params)?;

    let container = assemble(ContainerKind::Message, &real_blob, &decoy_blob)?;
    Ok(encode_b64(&container))
}

/// Open a base64 message container with `password`.
pub fn open_message_container(
    text: &str,
    password: &SecretString,
    params: &KdfParams,
) -> VaultResult<Opened<String>> {
    let container = decode_b64(text).map_err(|_| VaultError::InvalidContainerFormat)?;
    let (real, decoy) = split_slots(ContainerKind::Message, &container)?;

    open_slots(real, decoy, |slot| {
        into_utf8(open_with_password(slot, password, params)?)
    })
}

/// Build a file container; returns raw bytes.
pub fn create_file_container(
    real: &FilePayload,
    decoy: &FilePayload,
    real_password: &SecretString,
    decoy_password: &SecretString,
    params: &KdfParams,
) -> VaultResult<Vec<u8>> {
    ensure_distinct(real_password, decoy_password)?;

    let real_blob = envelope::encrypt_file_with_password(
        &real.filename,
        &real.data,
        real_password,
        params,
    )?;
    let decoy_blob = envelope::encrypt_file_with_password(
        &decoy.filename,
        &decoy.data,
        decoy_password,
        params,
    )?;

    assemble(ContainerKind::File, &real_blob, &decoy_blob)
}

/// Open a raw file container with `password`.
pub fn open_file_container(
    container: &[u8],
    password: &SecretString,
    params: &KdfParams,
) -> VaultResult<Opened<FilePayload>> {
    let (real, decoy) = split_slots(ContainerKind::File, container)?;

    open_slots(real, decoy, |slot| {
        envelope::decrypt_file_with_password(slot, password, params)
    })
}

fn ensure_distinct(real: &SecretString, decoy: &SecretString) -> VaultResult<()> {
    if real.expose_secret() == decoy.expose_secret() {
        return Err(VaultError::InvalidContainerArguments(
            "real and decoy passwords must differ".into(),
        ));
    }
    Ok(())
}

fn assemble(kind: ContainerKind, real: &[u8], decoy: &[u8]) -> VaultResult<Vec<u8>> {
    let slot_len = |slot: &[u8]| {
        u32::try_from(slot.len()).map_err(|_| {
            VaultError::InvalidContainerArguments("payload too large for a container slot".into())
        })
    };
    let real_len = slot_len(real)?;
    let decoy_len = slot_len(decoy)?;

    let mut container = Vec::with_capacity(HEADER_SIZE + real.len() + decoy.len());
    container.push(kind.marker());
    container.extend_from_slice(&real_len.to_le_bytes());
    container.extend_from_slice(&decoy_len.to_le_bytes());
    container.extend_from_slice(real);
    container.extend_from_slice(decoy);

    tracing::debug!(kind = ?kind, bytes = container.len(), "assembled deniable container");
    Ok(container)
}

/// Validate the header and return the (real, decoy) slot bytes.
fn split_slots(kind: ContainerKind, container: &[u8]) -> VaultResult<(&[u8], &[u8])> {
    if container.len() < HEADER_SIZE || container[0] != kind.marker() {
        return Err(VaultError::InvalidContainerFormat);
    }

    let read_len = |at: usize| {
        let mut b = [0u8; 4];
        b.copy_from_slice(&container[at..at + 4]);
        u32::from_le_bytes(b) as u64
    };
    let real_len = read_len(1);
    let decoy_len = read_len(5);

    if HEADER_SIZE as u64 + real_len + decoy_len != container.len() as u64 {
        return Err(VaultError::InvalidContainerFormat);
    }

    let (real, decoy) = container[HEADER_SIZE..].split_at(real_len as usize);
    Ok((real, decoy))
}

/// Two-attempt pipeline: real slot, then decoy slot, else `IncorrectPassword`.
///
/// The attempt errors are dropped without inspection so nothing about them
/// (cause, slot) reaches the caller.
fn open_slots<T>(
    real: &[u8],
    decoy: &[u8],
    attempt: impl Fn(&[u8]) -> VaultResult<T>,
) -> VaultResult<Opened<T>> {
    let real_attempt = attempt(real);
    let decoy_attempt = attempt(decoy);

    match (real_attempt, decoy_attempt) {
        (Ok(data), _) => Ok(Opened {
            data,
            is_decoy: false,
        }),
        (Err(_), Ok(data)) => Ok(Opened {
            data,
            is_decoy: true,
        }),
        (Err(_), Err(_)) => Err(VaultError::IncorrectPassword),
    }
}

/// Identify the container kind from its marker without opening it.
///
/// Only meaningful on raw bytes; a base64 message container must be decoded
/// first.
pub fn detect_kind(container: &[u8]) -> Option<ContainerKind> {
    container.first().copied().and_then(ContainerKind::from_marker)
}
