//! Symmetric block cipher engine.
//!
//! Two ciphers (RC5 with 64-bit words and Twofish), seven modes of operation,
//! four padding schemes and a Diffie-Hellman exchange that yields 32 bytes of
//! key material for an [`EncryptionContext`].
//!
//! ```
//! use crypto::{Algorithm, EncryptionContext, Mode, Padding};
//!
//! let ctx = EncryptionContext::new(
//!     b"thisis16bytekey!",
//!     Algorithm::Twofish,
//!     Mode::Cbc,
//!     Padding::Pkcs7,
//!     b"12345678abcdefgh",
//! ).unwrap();
//!
//! let ciphertext = ctx.encrypt(b"HELLO").unwrap();
//! assert_eq!(ciphertext.len(), 16);
//! assert_eq!(ctx.decrypt(&ciphertext).unwrap(), b"HELLO");
//! ```
//!
//! None of this is authenticated encryption, and nothing here runs in
//! constant time.

mod constants;
mod utils;
pub mod error;
pub mod rc5;
pub mod twofish;
pub mod padding;
pub mod modes;
pub mod context;
pub mod dh;

pub use constants::{BLOCK_SIZE128, RANDOM_DELTA};
pub use context::{Algorithm, CipherConfig, EncryptionContext};
pub use error::{CipherError, ErrorKind, Result};
pub use modes::Mode;
pub use padding::Padding;

/// Single-block transform.
pub trait CipherBlock {
    fn encrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<()>;
    fn decrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<()>;
    fn get_block_size(&self) -> usize;
}

/// Key expansion owned by a cipher instance.
pub trait KeySchedule {
    /// Replaces the key and recomputes the round-key schedule.
    fn set_key(&mut self, key: &[u8]) -> Result<()>;

    /// The current schedule as opaque little-endian chunks, one per round key.
    fn round_keys(&self) -> Vec<Vec<u8>>;
}

/// A keyed cipher an [`EncryptionContext`] can own.
pub trait BlockCipher: CipherBlock + KeySchedule + Send {}

impl<T: CipherBlock + KeySchedule + Send> BlockCipher for T {}

/// Whole-message encryption with padding and chaining applied.
pub trait CipherProcessor: Send + Sync {
    fn encrypt_blocks(&self, src: &[u8]) -> Result<Vec<u8>>;
    fn decrypt_blocks(&self, src: &[u8]) -> Result<Vec<u8>>;
}
