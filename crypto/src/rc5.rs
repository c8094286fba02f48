use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use super::constants::*;
use super::utils::{load_word, store_word};
use super::{CipherBlock, CipherError, KeySchedule, Result};

/// RC5 with 16 rounds. Words are 64 bits unless built with
/// [`Rc5::with_word_size`]; a block is two words.
#[derive(Debug, Clone)]
pub struct Rc5 {
    word_bits: u32,
    s: [u64; RC5_ROUND_KEYS_COUNT],
}

impl Rc5 {
    /// RC5 with 64-bit words and a 16 byte block. The key must be at least 8 bytes.
    pub fn new(key: &[u8]) -> Result<Rc5> {
        Rc5::with_word_size(RC5_DEFAULT_WORD_BITS, key)
    }

    /// RC5 with 16, 32 or 64 bit words. The key must hold at least one word.
    pub fn with_word_size(word_bits: u32, key: &[u8]) -> Result<Rc5> {
        if !matches!(word_bits, 16 | 32 | 64) {
            return Err(CipherError::UnsupportedWordSize(word_bits));
        }

        let mut c = Rc5 {
            word_bits,
            s: [0; RC5_ROUND_KEYS_COUNT],
        };
        c.set_key(key)?;

        Ok(c)
    }

    pub fn word_bits(&self) -> u32 {
        self.word_bits
    }

    fn word_bytes(&self) -> usize {
        (self.word_bits / 8) as usize
    }

    fn mask(&self) -> u64 {
        if self.word_bits == 64 {
            u64::MAX
        } else {
            (1u64 << self.word_bits) - 1
        }
    }

    fn magic(&self) -> (u64, u64) {
        match self.word_bits {
            16 => (P16, Q16),
            32 => (P32, Q32),
            _ => (P64, Q64),
        }
    }

    fn add(&self, x: u64, y: u64) -> u64 {
        x.wrapping_add(y) & self.mask()
    }

    fn sub(&self, x: u64, y: u64) -> u64 {
        x.wrapping_sub(y) & self.mask()
    }

    fn rotl(&self, x: u64, y: u64) -> u64 {
        let w = self.word_bits as u64;
        let s = y % w;
        if s == 0 {
            return x & self.mask();
        }
        ((x << s) | (x >> (w - s))) & self.mask()
    }

    fn rotr(&self, x: u64, y: u64) -> u64 {
        let w = self.word_bits as u64;
        let s = y % w;
        if s == 0 {
            return x & self.mask();
        }
        ((x >> s) | (x << (w - s))) & self.mask()
    }

    fn expand_key(&self, key: &[u8]) -> [u64; RC5_ROUND_KEYS_COUNT] {
        let (pw, qw) = self.magic();
        let u = self.word_bytes();
        let w = self.word_bits as u64;

        // Key bytes packed little-endian into words
        let c = (key.len() + u - 1) / u;
        let mut l = vec![0u64; c];
        for i in (0..key.len()).rev() {
            l[i / u] = (l[i / u] << 8) + key[i] as u64;
        }

        let mut s = [0u64; RC5_ROUND_KEYS_COUNT];
        s[0] = pw;
        for i in 1..s.len() {
            s[i] = self.add(s[i - 1], qw);
        }

        let (mut i, mut j) = (0, 0);
        let (mut a, mut b) = (0u64, 0u64);
        for _ in 0..3 * s.len().max(c) {
            a = self.rotl(self.add(self.add(s[i], a), b), 3);
            s[i] = a;

            let sum = self.add(self.add(l[j], a), b);
            b = self.rotl(sum, sum % w);
            l[j] = b;

            i = (i + 1) % s.len();
            j = (j + 1) % c;
        }

        s
    }

    fn load_words(&self, src: &[u8]) -> (u64, u64) {
        let u = self.word_bytes();
        match self.word_bits {
            16 => (LittleEndian::read_u16(&src[..u]) as u64, LittleEndian::read_u16(&src[u..]) as u64),
            32 => (LittleEndian::read_u32(&src[..u]) as u64, LittleEndian::read_u32(&src[u..]) as u64),
            _ => (load_word(&src[..u]), load_word(&src[u..2 * u])),
        }
    }

    fn store_words(&self, a: u64, b: u64, dst: &mut [u8]) {
        let u = self.word_bytes();
        match self.word_bits {
            16 => {
                LittleEndian::write_u16(&mut dst[..u], a as u16);
                LittleEndian::write_u16(&mut dst[u..2 * u], b as u16);
            }
            32 => {
                LittleEndian::write_u32(&mut dst[..u], a as u32);
                LittleEndian::write_u32(&mut dst[u..2 * u], b as u32);
            }
            _ => {
                store_word(a, &mut dst[..u]);
                store_word(b, &mut dst[u..2 * u]);
            }
        }
    }
}

impl KeySchedule for Rc5 {
    fn set_key(&mut self, key: &[u8]) -> Result<()> {
        if key.len() < self.word_bytes() {
            return Err(CipherError::InvalidKeyLength {
                expected: match self.word_bits {
                    16 => "at least 2 bytes",
                    32 => "at least 4 bytes",
                    _ => "at least 8 bytes",
                },
                actual: key.len(),
            });
        }

        self.s = self.expand_key(key);
        trace!(word_bits = self.word_bits, round_keys = self.s.len(), "rc5 key schedule computed");

        Ok(())
    }

    fn round_keys(&self) -> Vec<Vec<u8>> {
        let u = self.word_bytes();
        self.s.iter()
            .map(|k| k.to_le_bytes()[..u].to_vec())
            .collect()
    }
}

impl CipherBlock for Rc5 {
    fn encrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<()> {
        let block_size = self.get_block_size();
        if src.len() != block_size {
            return Err(CipherError::InvalidPlaintextLength { expected: block_size, actual: src.len() });
        }

        if dst.len() < block_size {
            return Err(CipherError::InvalidCiphertextLength { expected: block_size, actual: dst.len() });
        }

        let w = self.word_bits as u64;
        let (mut a, mut b) = self.load_words(src);

        a = self.add(a, self.s[0]);
        b = self.add(b, self.s[1]);
        for i in 1..=RC5_ROUNDS {
            a = self.add(self.rotl(a ^ b, b % w), self.s[2 * i]);
            b = self.add(self.rotl(b ^ a, a % w), self.s[2 * i + 1]);
        }

        self.store_words(a, b, dst);

        Ok(())
    }

    fn decrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<()> {
        let block_size = self.get_block_size();
        if src.len() != block_size {
            return Err(CipherError::InvalidCiphertextLength { expected: block_size, actual: src.len() });
        }

        if dst.len() < block_size {
            return Err(CipherError::InvalidPlaintextLength { expected: block_size, actual: dst.len() });
        }

        let w = self.word_bits as u64;
        let (mut a, mut b) = self.load_words(src);

        for i in (1..=RC5_ROUNDS).rev() {
            b = self.rotr(self.sub(b, self.s[2 * i + 1]), a % w) ^ a;
            a = self.rotr(self.sub(a, self.s[2 * i]), b % w) ^ b;
        }
        b = self.sub(b, self.s[1]);
        a = self.sub(a, self.s[0]);

        self.store_words(a, b, dst);

        Ok(())
    }

    fn get_block_size(&self) -> usize {
        2 * self.word_bytes()
    }
}
