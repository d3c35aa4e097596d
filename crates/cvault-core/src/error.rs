use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

/// Every failure the engine can report.
///
/// Messages are user-facing: they never carry key material, plaintext, or
/// (for `IncorrectPassword`) any hint about which container slot was tried.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Imported key text was not base64 or did not decode to 32 bytes.
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Export requested for a derived key or one created as non-extractable.
    #[error("key is not extractable")]
    KeyNotExtractable,

    #[error("key derivation failed: {0}")]
    DerivationFailed(String),

    /// Tag verification failed: wrong key/password or tampered data.
    #[error("decryption failed: wrong key or corrupted data")]
    AuthenticationFailed,

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid container format")]
    InvalidContainerFormat,

    #[error("invalid container arguments: {0}")]
    InvalidContainerArguments(String),

    /// The single outcome of a failed deniable-container open.
    #[error("incorrect password")]
    IncorrectPassword,

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput(reason.into())
    }
}
