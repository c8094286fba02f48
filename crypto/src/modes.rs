use std::fmt;
use std::str::FromStr;

use super::constants::*;
use super::utils::{increment_counter, xor_in_place};
use super::{CipherBlock, CipherError, Result};

/// Mode of operation. ECB and RandomDelta map equal blocks to equal
/// ciphertext blocks; only the other five hide repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Ecb,
    Cbc,
    Pcbc,
    Cfb,
    Ofb,
    Ctr,
    /// Each block is XORed with [`RANDOM_DELTA`] before encryption. The delta
    /// is a fixed constant, not per-session randomness.
    RandomDelta,
}

impl Mode {
    pub const ALL: [Mode; 7] = [Mode::Ecb, Mode::Cbc, Mode::Pcbc, Mode::Cfb, Mode::Ofb, Mode::Ctr, Mode::RandomDelta];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Ecb => "ECB",
            Mode::Cbc => "CBC",
            Mode::Pcbc => "PCBC",
            Mode::Cfb => "CFB",
            Mode::Ofb => "OFB",
            Mode::Ctr => "CTR",
            Mode::RandomDelta => "RandomDelta",
        }
    }

    /// Runs the chaining algorithm over block-aligned `src`. The IV is only read.
    pub fn encrypt_blocks<C: CipherBlock + ?Sized>(&self, block: &C, iv: &[u8], src: &[u8]) -> Result<Vec<u8>> {
        let chain = Chain::new(block, iv, src)?;

        match self {
            Mode::Ecb => chain.ecb_encrypt(src),
            Mode::Cbc => chain.cbc_encrypt(src),
            Mode::Pcbc => chain.pcbc_encrypt(src),
            Mode::Cfb => chain.cfb_encrypt(src),
            Mode::Ofb => chain.ofb(src),
            Mode::Ctr => chain.ctr(src),
            Mode::RandomDelta => chain.random_delta_encrypt(src),
        }
    }

    pub fn decrypt_blocks<C: CipherBlock + ?Sized>(&self, block: &C, iv: &[u8], src: &[u8]) -> Result<Vec<u8>> {
        let chain = Chain::new(block, iv, src)?;

        match self {
            Mode::Ecb => chain.ecb_decrypt(src),
            Mode::Cbc => chain.cbc_decrypt(src),
            Mode::Pcbc => chain.pcbc_decrypt(src),
            Mode::Cfb => chain.cfb_decrypt(src),
            Mode::Ofb => chain.ofb(src),
            Mode::Ctr => chain.ctr(src),
            Mode::RandomDelta => chain.random_delta_decrypt(src),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Mode> {
        Mode::ALL.into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CipherError::UnknownMode(s.to_string()))
    }
}

struct Chain<'a, C: ?Sized> {
    block: &'a C,
    iv: &'a [u8],
    block_size: usize,
}

impl<'a, C: CipherBlock + ?Sized> Chain<'a, C> {
    fn new(block: &'a C, iv: &'a [u8], src: &[u8]) -> Result<Self> {
        let block_size = block.get_block_size();

        if iv.len() != block_size {
            return Err(CipherError::InvalidIVLength { expected: block_size, actual: iv.len() });
        }

        if src.len() % block_size != 0 {
            return Err(CipherError::InvalidInputLength { block_size, actual: src.len() });
        }

        Ok(Chain { block, iv, block_size })
    }

    fn ecb_encrypt(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; src.len()];

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            self.block.encrypt(src_block, dst_block)?;
        }

        Ok(dst)
    }

    fn ecb_decrypt(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; src.len()];

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            self.block.decrypt(src_block, dst_block)?;
        }

        Ok(dst)
    }

    fn cbc_encrypt(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; src.len()];
        let mut state = self.iv.to_vec();

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            xor_in_place(&mut state, src_block);
            self.block.encrypt(&state, dst_block)?;
            state.copy_from_slice(dst_block);
        }

        Ok(dst)
    }

    fn cbc_decrypt(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; src.len()];
        let mut previous: &[u8] = self.iv;

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            self.block.decrypt(src_block, dst_block)?;
            xor_in_place(dst_block, previous);
            previous = src_block;
        }

        Ok(dst)
    }

    fn pcbc_encrypt(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; src.len()];
        let mut state = self.iv.to_vec();

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            xor_in_place(&mut state, src_block);
            self.block.encrypt(&state, dst_block)?;

            // next state is P_i ^ C_i
            state.copy_from_slice(src_block);
            xor_in_place(&mut state, dst_block);
        }

        Ok(dst)
    }

    fn pcbc_decrypt(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; src.len()];
        let mut state = self.iv.to_vec();

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            self.block.decrypt(src_block, dst_block)?;
            xor_in_place(dst_block, &state);

            state.copy_from_slice(dst_block);
            xor_in_place(&mut state, src_block);
        }

        Ok(dst)
    }

    fn cfb_encrypt(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; src.len()];
        let mut feedback = self.iv.to_vec();
        let mut keystream = vec![0u8; self.block_size];

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            self.block.encrypt(&feedback, &mut keystream)?;
            dst_block.copy_from_slice(src_block);
            xor_in_place(dst_block, &keystream);
            feedback.copy_from_slice(dst_block);
        }

        Ok(dst)
    }

    fn cfb_decrypt(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; src.len()];
        let mut feedback = self.iv.to_vec();
        let mut keystream = vec![0u8; self.block_size];

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            self.block.encrypt(&feedback, &mut keystream)?;
            dst_block.copy_from_slice(src_block);
            xor_in_place(dst_block, &keystream);
            feedback.copy_from_slice(src_block);
        }

        Ok(dst)
    }

    /// Same transform in both directions.
    fn ofb(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; src.len()];
        let mut feedback = self.iv.to_vec();
        let mut keystream = vec![0u8; self.block_size];

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            self.block.encrypt(&feedback, &mut keystream)?;
            dst_block.copy_from_slice(src_block);
            xor_in_place(dst_block, &keystream);
            feedback.copy_from_slice(&keystream);
        }

        Ok(dst)
    }

    /// Same transform in both directions.
    fn ctr(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; src.len()];
        let mut counter = self.iv.to_vec();
        let mut keystream = vec![0u8; self.block_size];

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            self.block.encrypt(&counter, &mut keystream)?;
            dst_block.copy_from_slice(src_block);
            xor_in_place(dst_block, &keystream);
            increment_counter(&mut counter);
        }

        Ok(dst)
    }

    fn check_delta_block(&self) -> Result<()> {
        if self.block_size != RANDOM_DELTA.len() {
            return Err(CipherError::InvalidPlaintextLength { expected: RANDOM_DELTA.len(), actual: self.block_size });
        }
        Ok(())
    }

    fn random_delta_encrypt(&self, src: &[u8]) -> Result<Vec<u8>> {
        self.check_delta_block()?;

        let mut dst = vec![0u8; src.len()];
        let mut state = vec![0u8; self.block_size];

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            state.copy_from_slice(src_block);
            xor_in_place(&mut state, &RANDOM_DELTA);
            self.block.encrypt(&state, dst_block)?;
        }

        Ok(dst)
    }

    fn random_delta_decrypt(&self, src: &[u8]) -> Result<Vec<u8>> {
        self.check_delta_block()?;

        let mut dst = vec![0u8; src.len()];

        for (src_block, dst_block) in src.chunks_exact(self.block_size).zip(dst.chunks_exact_mut(self.block_size)) {
            self.block.decrypt(src_block, dst_block)?;
            xor_in_place(dst_block, &RANDOM_DELTA);
        }

        Ok(dst)
    }
}


#[cfg(test)]
mod modes_test {
    use super::*;
    use crate::rc5::Rc5;
    use crate::twofish::Twofish;

    const KEY: &[u8] = b"thisis16bytekey!";
    const IV: &[u8] = b"12345678abcdefgh";

    // Two identical blocks followed by a third distinct one.
    fn repeated_plaintext() -> Vec<u8> {
        let mut p = b"SIXTEEN BYTES!!!".repeat(2);
        p.extend_from_slice(b"another block...");
        p
    }

    #[test]
    fn parse_identifiers() {
        for m in Mode::ALL {
            assert_eq!(m.as_str().parse::<Mode>().unwrap(), m);
        }

        assert_eq!("RandomDelta".parse::<Mode>().unwrap(), Mode::RandomDelta);
        assert_eq!("cbc".parse::<Mode>().unwrap_err(), CipherError::UnknownMode("cbc".into()));
    }

    #[test]
    fn new_errors() {
        let c = Twofish::new(KEY).unwrap();

        let r = Mode::Cbc.encrypt_blocks(&c, &IV[..8], &[0u8; 16]);
        assert_eq!(r.unwrap_err(), CipherError::InvalidIVLength { expected: 16, actual: 8 });

        let r = Mode::Cbc.decrypt_blocks(&c, IV, &[0u8; 17]);
        assert_eq!(r.unwrap_err(), CipherError::InvalidInputLength { block_size: 16, actual: 17 });
    }

    #[test]
    fn decrypt_restores_each_mode() {
        let c = Rc5::new(KEY).unwrap();
        let plaintext: Vec<u8> = (0..80).collect();

        for m in Mode::ALL {
            let ciphertext = m.encrypt_blocks(&c, IV, &plaintext).unwrap();
            assert_eq!(ciphertext.len(), plaintext.len());
            assert_ne!(ciphertext, plaintext, "{m}");

            let restored = m.decrypt_blocks(&c, IV, &ciphertext).unwrap();
            assert_eq!(restored, plaintext, "{m}");
        }
    }

    #[test]
    fn stateless_modes_repeat_blocks() {
        let c = Twofish::new(KEY).unwrap();
        let p = repeated_plaintext();

        for m in [Mode::Ecb, Mode::RandomDelta] {
            let ct = m.encrypt_blocks(&c, IV, &p).unwrap();
            assert_eq!(ct[..16], ct[16..32], "{m}");
        }
    }

    #[test]
    fn chaining_modes_hide_repeated_blocks() {
        let c = Twofish::new(KEY).unwrap();
        let p = repeated_plaintext();

        for m in [Mode::Cbc, Mode::Pcbc, Mode::Cfb, Mode::Ofb, Mode::Ctr] {
            let ct = m.encrypt_blocks(&c, IV, &p).unwrap();
            assert_ne!(ct[..16], ct[16..32], "{m}");
        }
    }

    #[test]
    fn cbc_first_block_is_ecb_of_xor() {
        let c = Twofish::new(KEY).unwrap();
        let p = repeated_plaintext();

        let mut x = p[..16].to_vec();
        xor_in_place(&mut x, IV);
        let mut expected = [0u8; 16];
        c.encrypt(&x, &mut expected).unwrap();

        let ct = Mode::Cbc.encrypt_blocks(&c, IV, &p).unwrap();
        assert_eq!(ct[..16], expected);
    }

    #[test]
    fn ctr_keystream_uses_incremented_counter() {
        let c = Rc5::new(KEY).unwrap();
        let zeros = [0u8; 32];

        let ct = Mode::Ctr.encrypt_blocks(&c, IV, &zeros).unwrap();

        let mut counter = IV.to_vec();
        let mut ks = [0u8; 16];
        c.encrypt(&counter, &mut ks).unwrap();
        assert_eq!(ct[..16], ks);

        increment_counter(&mut counter);
        c.encrypt(&counter, &mut ks).unwrap();
        assert_eq!(ct[16..], ks);
    }

    #[test]
    fn ofb_and_ctr_are_symmetric() {
        let c = Rc5::new(KEY).unwrap();
        let p: Vec<u8> = (0..48).rev().collect();

        for m in [Mode::Ofb, Mode::Ctr] {
            let once = m.encrypt_blocks(&c, IV, &p).unwrap();
            assert_eq!(m.encrypt_blocks(&c, IV, &once).unwrap(), p);
        }
    }

    #[test]
    fn random_delta_requires_16_byte_blocks() {
        let c = Rc5::with_word_size(32, KEY).unwrap();

        let r = Mode::RandomDelta.encrypt_blocks(&c, &IV[..8], &[0u8; 8]);
        assert_eq!(r.unwrap_err(), CipherError::InvalidPlaintextLength { expected: 16, actual: 8 });

        let ct = Mode::Cbc.encrypt_blocks(&c, &IV[..8], &[0u8; 8]).unwrap();
        assert_eq!(ct.len(), 8);
    }
}
