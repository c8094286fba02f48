use std::fmt;
use std::str::FromStr;

use parking_lot::Mutex;
use tracing::debug;

use super::constants::BLOCK_SIZE128;
use super::modes::Mode;
use super::padding::Padding;
use super::rc5::Rc5;
use super::twofish::Twofish;
use super::{BlockCipher, CipherError, CipherProcessor, Result};

/// Block cipher selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// RC5 with 64-bit words.
    Rc5,
    Twofish,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Rc5, Algorithm::Twofish];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Rc5 => "rc5",
            Algorithm::Twofish => "twofish",
        }
    }

    /// Block and IV length in bytes.
    pub fn block_size(&self) -> usize {
        match self {
            Algorithm::Rc5 | Algorithm::Twofish => BLOCK_SIZE128,
        }
    }

    /// Builds a cipher keyed with `key`.
    pub fn new_cipher(&self, key: &[u8]) -> Result<Box<dyn BlockCipher>> {
        let cipher: Box<dyn BlockCipher> = match self {
            Algorithm::Rc5 => Box::new(Rc5::new(key)?),
            Algorithm::Twofish => Box::new(Twofish::new(key)?),
        };

        Ok(cipher)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Algorithm> {
        Algorithm::ALL.into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CipherError::UnknownAlgorithm(s.to_string()))
    }
}

/// Cipher, mode and padding selection for a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherConfig {
    pub algorithm: Algorithm,
    pub mode: Mode,
    pub padding: Padding,
}

impl CipherConfig {
    pub fn new(algorithm: Algorithm, mode: Mode, padding: Padding) -> CipherConfig {
        CipherConfig { algorithm, mode, padding }
    }

    /// Parses the three case-sensitive identifiers, e.g. `("twofish", "CBC", "PKCS7")`.
    pub fn parse(algorithm: &str, mode: &str, padding: &str) -> Result<CipherConfig> {
        Ok(CipherConfig {
            algorithm: algorithm.parse()?,
            mode: mode.parse()?,
            padding: padding.parse()?,
        })
    }

    pub fn build(&self, key: &[u8], iv: &[u8]) -> Result<EncryptionContext> {
        EncryptionContext::new(key, self.algorithm, self.mode, self.padding, iv)
    }
}

impl fmt::Display for CipherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.algorithm, self.mode, self.padding)
    }
}

struct State {
    key: Vec<u8>,
    config: CipherConfig,
    iv: Vec<u8>,
    cipher: Box<dyn BlockCipher>,
}

/// One encryption session: a keyed cipher, a mode, a padding scheme and an IV.
///
/// All calls take the context lock, so a context shared between threads
/// processes one message at a time. Use one context per thread for parallel
/// throughput.
pub struct EncryptionContext {
    inner: Mutex<State>,
}

impl EncryptionContext {
    pub fn new(key: &[u8], algorithm: Algorithm, mode: Mode, padding: Padding, iv: &[u8]) -> Result<EncryptionContext> {
        let cipher = algorithm.new_cipher(key)?;

        let block_size = cipher.get_block_size();
        if iv.len() != block_size {
            return Err(CipherError::InvalidIVLength { expected: block_size, actual: iv.len() });
        }

        debug!(%algorithm, %mode, %padding, "encryption context created");

        Ok(EncryptionContext {
            inner: Mutex::new(State {
                key: key.to_vec(),
                config: CipherConfig { algorithm, mode, padding },
                iv: iv.to_vec(),
                cipher,
            }),
        })
    }

    pub fn from_config(config: &CipherConfig, key: &[u8], iv: &[u8]) -> Result<EncryptionContext> {
        config.build(key, iv)
    }

    /// Re-keys the cipher. On error the previous key stays in effect.
    pub fn set_key(&self, key: &[u8]) -> Result<()> {
        let mut state = self.inner.lock();

        state.cipher.set_key(key)?;
        state.key = key.to_vec();

        debug!(algorithm = %state.config.algorithm, "context re-keyed");

        Ok(())
    }

    /// Pads `plaintext` and runs the mode's chaining algorithm over it.
    /// The output is always a whole number of blocks.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let state = self.inner.lock();
        let block_size = state.cipher.get_block_size();

        let padded = state.config.padding.apply(plaintext, block_size)?;
        let ciphertext = state.config.mode.encrypt_blocks(&*state.cipher, &state.iv, &padded)?;

        debug!(
            mode = %state.config.mode,
            padding = %state.config.padding,
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            "encrypt"
        );

        Ok(ciphertext)
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let state = self.inner.lock();

        let padded = state.config.mode.decrypt_blocks(&*state.cipher, &state.iv, ciphertext)?;
        let plaintext = state.config.padding.remove(&padded)?;

        debug!(
            mode = %state.config.mode,
            padding = %state.config.padding,
            ciphertext_len = ciphertext.len(),
            plaintext_len = plaintext.len(),
            "decrypt"
        );

        Ok(plaintext)
    }

    pub fn config(&self) -> CipherConfig {
        self.inner.lock().config
    }

    pub fn algorithm(&self) -> Algorithm {
        self.inner.lock().config.algorithm
    }

    pub fn mode(&self) -> Mode {
        self.inner.lock().config.mode
    }

    pub fn padding(&self) -> Padding {
        self.inner.lock().config.padding
    }

    pub fn block_size(&self) -> usize {
        self.inner.lock().cipher.get_block_size()
    }

    pub fn iv(&self) -> Vec<u8> {
        self.inner.lock().iv.clone()
    }

    pub fn key_len(&self) -> usize {
        self.inner.lock().key.len()
    }

    /// Opaque copy of the current round-key schedule.
    pub fn round_keys(&self) -> Vec<Vec<u8>> {
        self.inner.lock().cipher.round_keys()
    }
}

impl CipherProcessor for EncryptionContext {
    fn encrypt_blocks(&self, src: &[u8]) -> Result<Vec<u8>> {
        self.encrypt(src)
    }

    fn decrypt_blocks(&self, src: &[u8]) -> Result<Vec<u8>> {
        self.decrypt(src)
    }
}

impl fmt::Debug for EncryptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("EncryptionContext")
            .field("config", &state.config)
            .field("key_len", &state.key.len())
            .finish_non_exhaustive()
    }
}
