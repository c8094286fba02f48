//! Error types for the block cipher engine.
//!
//! Every failure is returned as a `CipherError`; nothing inside the crate
//! retries. `kind()` groups the variants into the four categories callers
//! usually branch on. Messages never carry key material.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CipherError>;

/// Broad category of a [`CipherError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad key, IV, identifier or parameter supplied by the caller.
    Configuration,
    /// Input bytes that cannot be processed as given.
    Data,
    /// The secure random source failed.
    RandomSource,
    /// A cipher primitive was driven with a block or word it does not support.
    CryptoPrimitive,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid key length {actual}, expected {expected}")]
    InvalidKeyLength {
        expected: &'static str,
        actual: usize,
    },

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("unknown mode: {0}")]
    UnknownMode(String),

    #[error("unknown padding: {0}")]
    UnknownPadding(String),

    #[error("IV must be {expected} bytes, got {actual}")]
    InvalidIVLength { expected: usize, actual: usize },

    #[error("prime bit length {0} is out of the supported range")]
    InvalidPrimeBits(usize),

    #[error("modulus must be greater than one")]
    InvalidModulus,

    #[error("input length {actual} is not a multiple of the block size {block_size}")]
    InvalidInputLength { block_size: usize, actual: usize },

    #[error("input is empty")]
    EmptyInput,

    #[error("invalid padding size")]
    InvalidPaddingSize,

    #[error("invalid {0} padding")]
    InvalidPadding(&'static str),

    #[error("secure random source failed: {0}")]
    RandomSource(String),

    #[error("plaintext block must be {expected} bytes, got {actual}")]
    InvalidPlaintextLength { expected: usize, actual: usize },

    #[error("ciphertext block must be {expected} bytes, got {actual}")]
    InvalidCiphertextLength { expected: usize, actual: usize },

    #[error("unsupported word size: {0} bits")]
    UnsupportedWordSize(u32),
}

impl CipherError {
    pub fn random_source(reason: impl ToString) -> Self {
        Self::RandomSource(reason.to_string())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidKeyLength { .. }
            | Self::UnknownAlgorithm(_)
            | Self::UnknownMode(_)
            | Self::UnknownPadding(_)
            | Self::InvalidIVLength { .. }
            | Self::InvalidPrimeBits(_)
            | Self::InvalidModulus => ErrorKind::Configuration,

            Self::InvalidInputLength { .. }
            | Self::EmptyInput
            | Self::InvalidPaddingSize
            | Self::InvalidPadding(_) => ErrorKind::Data,

            Self::RandomSource(_) => ErrorKind::RandomSource,

            Self::InvalidPlaintextLength { .. }
            | Self::InvalidCiphertextLength { .. }
            | Self::UnsupportedWordSize(_) => ErrorKind::CryptoPrimitive,
        }
    }

    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration)
    }

    #[must_use]
    pub const fn is_data_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Data)
    }
}
