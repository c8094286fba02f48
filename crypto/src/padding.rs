use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;

use super::{CipherError, Result};

/// Padding scheme applied before encryption and stripped after decryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Padding {
    /// Zero bytes up to a full block. Plaintext ending in zero bytes loses them on removal.
    Zeros,
    Pkcs7,
    AnsiX923,
    /// Random filler followed by the length byte. The filler is never checked.
    Iso10126,
}

impl Padding {
    pub const ALL: [Padding; 4] = [Padding::Zeros, Padding::Pkcs7, Padding::AnsiX923, Padding::Iso10126];

    pub fn as_str(&self) -> &'static str {
        match self {
            Padding::Zeros => "Zeros",
            Padding::Pkcs7 => "PKCS7",
            Padding::AnsiX923 => "ANSIX923",
            Padding::Iso10126 => "ISO10126",
        }
    }

    /// Extends `input` to a multiple of `block_size`. A block-aligned input
    /// always gains one full block of padding.
    ///
    /// # Panics
    /// When `block_size` is zero.
    pub fn apply(&self, input: &[u8], block_size: usize) -> Result<Vec<u8>> {
        assert!(block_size > 0, "block size must be greater than zero");

        let padding_size = block_size - input.len() % block_size;
        let mut padded = Vec::with_capacity(input.len() + padding_size);
        padded.extend_from_slice(input);

        match self {
            Padding::Zeros => {
                padded.resize(input.len() + padding_size, 0);
            }
            Padding::Pkcs7 => {
                padded.resize(input.len() + padding_size, padding_size as u8);
            }
            Padding::AnsiX923 => {
                padded.resize(input.len() + padding_size - 1, 0);
                padded.push(padding_size as u8);
            }
            Padding::Iso10126 => {
                let mut filler = vec![0u8; padding_size - 1];
                OsRng.try_fill_bytes(&mut filler).map_err(CipherError::random_source)?;

                padded.extend_from_slice(&filler);
                padded.push(padding_size as u8);
            }
        }

        Ok(padded)
    }

    /// Strips padding added by [`apply`](Self::apply).
    pub fn remove(&self, input: &[u8]) -> Result<Vec<u8>> {
        if let Padding::Zeros = self {
            let end = input.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
            return Ok(input[..end].to_vec());
        }

        let padding_size = *input.last().ok_or(CipherError::EmptyInput)? as usize;
        if padding_size == 0 || padding_size > input.len() {
            return Err(CipherError::InvalidPaddingSize);
        }

        let end = input.len() - padding_size;
        if let Padding::AnsiX923 = self {
            if input[end..input.len() - 1].iter().any(|&b| b != 0) {
                return Err(CipherError::InvalidPadding("ANSI X.923"));
            }
        }

        Ok(input[..end].to_vec())
    }
}

impl fmt::Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Padding {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Padding> {
        Padding::ALL.into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CipherError::UnknownPadding(s.to_string()))
    }
}
