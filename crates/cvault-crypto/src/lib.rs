//! cvault-crypto: the cryptovault container engine
//!
//! Architecture: AES-256-GCM with random 96-bit nonces, Argon2id for passwords
//!
//! Blob layouts:
//! ```text
//! key-based       [12 nonce][ciphertext][16 tag]
//! password-based  [16 salt][12 nonce][ciphertext][16 tag]
//! file plaintext  [4 name_len LE][name UTF-8][file bytes]   (then sealed as above)
//! deniable        [1 marker][4 real_len LE][4 decoy_len LE][real blob][decoy blob]
//!                 marker: 0xDE message (base64 transport), 0xDF file (raw)
//! ```
//!
//! Every operation is stateless: salts and nonces come from the OS CSPRNG on
//! each call and derived keys are never cached.

pub mod aead;
pub mod deniable;
pub mod envelope;
pub mod frame;
pub mod kdf;
pub mod keys;
pub mod strength;

pub use aead::{decrypt, encrypt, Sealed};
pub use deniable::{
    create_file_container, create_message_container, open_file_container,
    open_message_container, detect_kind, ContainerKind, Opened,
};
pub use envelope::{
    decrypt_file, decrypt_file_with_password, encrypt_file, encrypt_file_with_password,
    FilePayload,
};
pub use frame::{
    open, open_with_password, pack_message, pack_message_salted, pack_message_with_password,
    seal, seal_with_password, unpack_message, unpack_message_salted,
    unpack_message_with_password,
};
pub use kdf::{derive_key, DerivedKey, KdfParams};
pub use keys::{export_key, generate_key, generate_key_with, import_key, KeyOrigin, SymmetricKey};
pub use strength::{analyze_strength, strength_score, PasswordStrength};

pub use cvault_core::{VaultError, VaultResult};

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of an Argon2id salt (128-bit)
pub const SALT_SIZE: usize = 16;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
