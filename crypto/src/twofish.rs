use tracing::trace;

use super::constants::*;
use super::utils::{load_word32, store_word32};
use super::{CipherBlock, CipherError, KeySchedule, Result};

/// Twofish with a 128-bit block and 16 rounds. Accepts 16, 24 or 32 byte keys.
#[derive(Debug, Clone)]
pub struct Twofish {
    sub_keys: [u32; TWOFISH_SUBKEYS_COUNT],
    s_boxes: [[u8; 256]; 4],
}

impl Twofish {
    pub fn new(key: &[u8]) -> Result<Twofish> {
        let mut c = Twofish {
            sub_keys: [0; TWOFISH_SUBKEYS_COUNT],
            s_boxes: generate_s_boxes(),
        };
        c.set_key(key)?;

        Ok(c)
    }

    /// S-box lookup of each byte followed by the MDS matrix multiply.
    pub fn h(&self, input: u32) -> u32 {
        let x = input.to_le_bytes();
        let y = [
            self.s_boxes[0][x[0] as usize],
            self.s_boxes[1][x[1] as usize],
            self.s_boxes[2][x[2] as usize],
            self.s_boxes[3][x[3] as usize],
        ];

        let mut m = [0u8; 4];
        for (row, out) in MDS.iter().zip(m.iter_mut()) {
            *out = row.iter()
                .zip(y.iter())
                .fold(0, |acc, (&c, &v)| acc ^ gf_multiply(v, c));
        }

        u32::from_be_bytes(m)
    }

    fn generate_sub_keys(&mut self, key: &[u8]) {
        let rs = rs_encode(key);

        let (mut even, mut odd) = (Vec::new(), Vec::new());
        for (i, chunk) in key.chunks_exact(4).enumerate() {
            let word = load_word32(chunk);
            if i % 2 == 0 {
                even.push(word);
            } else {
                odd.push(word);
            }
        }

        for i in 0..TWOFISH_SUBKEYS_COUNT / 2 {
            let (a, b) = pht(even[i % even.len()], odd[i % odd.len()]);
            let k = i % rs.len();
            self.sub_keys[2 * i] = a.wrapping_add(rs[k]);
            self.sub_keys[2 * i + 1] = b.wrapping_add(rs[(k + 1) % rs.len()]);
        }
    }

    fn load_block(src: &[u8]) -> [u32; 4] {
        let mut p = [0u32; 4];
        for (i, word) in p.iter_mut().enumerate() {
            *word = load_word32(&src[i * 4..(i + 1) * 4]);
        }
        p
    }

    fn store_block(p: &[u32; 4], dst: &mut [u8]) {
        for (i, word) in p.iter().enumerate() {
            store_word32(*word, &mut dst[i * 4..(i + 1) * 4]);
        }
    }

    fn whiten(&self, p: &mut [u32; 4], offset: usize) {
        for (i, word) in p.iter_mut().enumerate() {
            *word ^= self.sub_keys[offset + i];
        }
    }

    fn round(&self, p: &mut [u32; 4], round: usize) {
        let t0 = self.h(p[0]);
        let t1 = self.h(p[1]);
        p[2] ^= t0.wrapping_add(t1).wrapping_add(self.sub_keys[2 * round + 8]);
        p[3] ^= t0.wrapping_add(t1.wrapping_mul(2)).wrapping_add(self.sub_keys[2 * round + 9]);
    }
}

impl KeySchedule for Twofish {
    fn set_key(&mut self, key: &[u8]) -> Result<()> {
        if !TWOFISH_KEY_SIZES.contains(&key.len()) {
            return Err(CipherError::InvalidKeyLength {
                expected: "16, 24 or 32 bytes",
                actual: key.len(),
            });
        }

        self.generate_sub_keys(key);
        trace!(key_bits = key.len() * 8, "twofish key schedule computed");

        Ok(())
    }

    fn round_keys(&self) -> Vec<Vec<u8>> {
        self.sub_keys.iter()
            .map(|k| k.to_le_bytes().to_vec())
            .collect()
    }
}

impl CipherBlock for Twofish {
    fn encrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<()> {
        if src.len() != BLOCK_SIZE128 {
            return Err(CipherError::InvalidPlaintextLength { expected: BLOCK_SIZE128, actual: src.len() });
        }

        if dst.len() < BLOCK_SIZE128 {
            return Err(CipherError::InvalidCiphertextLength { expected: BLOCK_SIZE128, actual: dst.len() });
        }

        let mut p = Twofish::load_block(src);
        self.whiten(&mut p, 0);

        for round in 0..TWOFISH_ROUNDS {
            self.round(&mut p, round);

            if round < TWOFISH_ROUNDS - 1 {
                p = [p[2], p[3], p[0], p[1]];
            }
        }

        self.whiten(&mut p, 4);
        Twofish::store_block(&p, dst);

        Ok(())
    }

    fn decrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<()> {
        if src.len() != BLOCK_SIZE128 {
            return Err(CipherError::InvalidCiphertextLength { expected: BLOCK_SIZE128, actual: src.len() });
        }

        if dst.len() < BLOCK_SIZE128 {
            return Err(CipherError::InvalidPlaintextLength { expected: BLOCK_SIZE128, actual: dst.len() });
        }

        let mut p = Twofish::load_block(src);
        self.whiten(&mut p, 4);

        for round in (0..TWOFISH_ROUNDS).rev() {
            if round < TWOFISH_ROUNDS - 1 {
                p = [p[2], p[3], p[0], p[1]];
            }

            // XOR with the same round function undoes it; p[0], p[1] are untouched by a round
            self.round(&mut p, round);
        }

        self.whiten(&mut p, 0);
        Twofish::store_block(&p, dst);

        Ok(())
    }

    fn get_block_size(&self) -> usize {
        BLOCK_SIZE128
    }
}

/// Multiplication in GF(2^8) modulo x^8 + x^6 + x^5 + x^3 + 1.
pub fn gf_multiply(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;

    for _ in 0..8 {
        if b & 1 != 0 {
            product ^= a;
        }

        let high_bit = a & 0x80;
        a <<= 1;
        if high_bit != 0 {
            a ^= GF_REDUCTION;
        }

        b >>= 1;
    }

    product
}

fn pht(a: u32, b: u32) -> (u32, u32) {
    (a.wrapping_add(b), a.wrapping_add(b.wrapping_mul(2)))
}

/// Reed-Solomon encoding of the key, one word per 8 byte chunk.
fn rs_encode(key: &[u8]) -> Vec<u32> {
    key.chunks_exact(8)
        .map(|chunk| {
            let mut res = [0u8; 4];
            for (row, out) in RS.iter().zip(res.iter_mut()) {
                *out = row.iter()
                    .zip(chunk.iter())
                    .fold(0, |acc, (&m, &k)| acc ^ gf_multiply(k, m));
            }
            u32::from_le_bytes(res)
        })
        .collect()
}

fn ror4(x: u8, n: u8) -> u8 {
    (x >> n) | ((x << (4 - n)) & 0x0F)
}

fn generate_q(t: &[[u8; 16]; 4]) -> [u8; 256] {
    let mut q = [0u8; 256];

    for (x, out) in q.iter_mut().enumerate() {
        let a0 = (x / 16) as u8;
        let b0 = (x % 16) as u8;
        let a1 = a0 ^ b0;
        let b1 = a0 ^ ror4(b0, 1) ^ ((8 * a0) % 16);
        let a2 = t[0][a1 as usize];
        let b2 = t[1][b1 as usize];
        let a3 = a2 ^ b2;
        let b3 = a2 ^ ror4(b2, 1) ^ ((8 * a2) % 16);
        let a4 = t[2][a3 as usize];
        let b4 = t[3][b3 as usize];
        *out = 16 * b4 + a4;
    }

    q
}

fn generate_s_boxes() -> [[u8; 256]; 4] {
    let q0 = generate_q(&Q0_T);
    let q1 = generate_q(&Q1_T);

    let mut s = [[0u8; 256]; 4];
    for i in 0..256 {
        s[0][i] = q0[i];
        s[1][i] = q1[i];
        s[2][i] = q0[q1[i] as usize];
        s[3][i] = q1[q0[i] as usize];
    }

    s
}
