//! Finite-field Diffie-Hellman over primes of up to 2048 bits.
//!
//! The generator is fixed at 2 and is not checked to be a primitive root.
//! [`hash_shared_key`] turns the agreed integer into 32 bytes usable as an
//! [`EncryptionContext`](crate::EncryptionContext) key.

use crypto_bigint::{Integer, NonZero};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::constants::*;
use super::{CipherError, Result};

pub use crypto_bigint::U2048;

/// Random probable prime of exactly `bits` bits, drawn from a small-primes
/// sieve. Sizes below 16 bits or above 2048 bits are rejected with
/// [`CipherError::InvalidPrimeBits`].
pub fn generate_prime(bits: usize) -> Result<U2048> {
    if !(DH_MIN_PRIME_BITS..=DH_MAX_PRIME_BITS).contains(&bits) {
        return Err(CipherError::InvalidPrimeBits(bits));
    }

    let prime: U2048 = crypto_primes::generate_prime_with_rng(&mut OsRng, bits as u32);
    debug!(bits, "prime found");

    Ok(prime)
}

/// Uniform random integer in `[0, prime)`.
pub fn generate_private_key(prime: &U2048) -> Result<U2048> {
    modulus(prime)?;

    let bits = prime.bits() as usize;
    loop {
        let candidate = U2048::from_be_slice(&random_bytes(bits)?);
        if candidate < *prime {
            return Ok(candidate);
        }
    }
}

/// `generator^private mod prime`.
pub fn generate_public_key(generator: &U2048, private_key: &U2048, prime: &U2048) -> Result<U2048> {
    mod_pow(generator, private_key, prime)
}

/// `peer_public^private mod prime`.
pub fn generate_shared_key(private_key: &U2048, peer_public: &U2048, prime: &U2048) -> Result<U2048> {
    mod_pow(peer_public, private_key, prime)
}

/// SHA-256 of the minimal big-endian encoding of `shared`. Zero hashes the empty string.
pub fn hash_shared_key(shared: &U2048) -> [u8; 32] {
    let bytes = shared.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());

    Sha256::digest(&bytes[start..]).into()
}

/// Parameters of one side of a single exchange.
#[derive(Clone)]
pub struct DhParameters {
    pub prime: U2048,
    pub generator: U2048,
    private_key: U2048,
    pub public_key: U2048,
}

impl DhParameters {
    /// Fresh prime of `bits` bits plus a key pair under it.
    pub fn generate(bits: usize) -> Result<DhParameters> {
        let prime = generate_prime(bits)?;
        DhParameters::from_prime(prime)
    }

    /// Key pair under a prime received from the other party.
    pub fn from_prime(prime: U2048) -> Result<DhParameters> {
        let generator = U2048::from_u64(DH_GENERATOR);
        let private_key = generate_private_key(&prime)?;
        let public_key = generate_public_key(&generator, &private_key, &prime)?;

        Ok(DhParameters { prime, generator, private_key, public_key })
    }

    pub fn shared_key(&self, peer_public: &U2048) -> Result<U2048> {
        generate_shared_key(&self.private_key, peer_public, &self.prime)
    }

    /// 32 bytes of key material agreed with the peer.
    pub fn hashed_key(&self, peer_public: &U2048) -> Result<[u8; 32]> {
        Ok(hash_shared_key(&self.shared_key(peer_public)?))
    }
}

impl std::fmt::Debug for DhParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DhParameters")
            .field("prime_bits", &self.prime.bits())
            .field("generator", &DH_GENERATOR)
            .finish_non_exhaustive()
    }
}

// Modular multiplication needs an odd modulus above one.
fn modulus(prime: &U2048) -> Result<NonZero<U2048>> {
    if *prime <= U2048::ONE || !bool::from(prime.is_odd()) {
        return Err(CipherError::InvalidModulus);
    }

    Option::from(NonZero::new(*prime)).ok_or(CipherError::InvalidModulus)
}

// Square-and-multiply, least significant bit first.
fn mod_pow(base: &U2048, exp: &U2048, prime: &U2048) -> Result<U2048> {
    let m = modulus(prime)?;

    let mut result = U2048::ONE;
    let mut base = base.mul_mod(&U2048::ONE, &m);
    let mut exp = *exp;

    while exp > U2048::ZERO {
        if exp.is_odd().into() {
            result = result.mul_mod(&base, &m);
        }

        exp = exp >> 1;
        base = base.mul_mod(&base, &m);
    }

    Ok(result)
}

/// Big-endian random buffer with everything above the low `bits` bits cleared.
fn random_bytes(bits: usize) -> Result<[u8; DH_MAX_PRIME_BYTES]> {
    let mut buf = [0u8; DH_MAX_PRIME_BYTES];
    OsRng.try_fill_bytes(&mut buf).map_err(CipherError::random_source)?;

    let excess = DH_MAX_PRIME_BITS - bits;
    buf[..excess / 8].fill(0);
    if excess % 8 != 0 {
        buf[excess / 8] &= 0xFF >> (excess % 8);
    }

    Ok(buf)
}


#[cfg(test)]
mod dh_test {
    use super::*;

    #[test]
    fn prime_bits_range() {
        assert_eq!(generate_prime(15).unwrap_err(), CipherError::InvalidPrimeBits(15));
        assert_eq!(generate_prime(2049).unwrap_err(), CipherError::InvalidPrimeBits(2049));
        assert!(generate_prime(0).unwrap_err().is_configuration_error());
    }

    #[test]
    fn prime_has_requested_bits() {
        for bits in [16usize, 17, 31, 64, 128] {
            let p = generate_prime(bits).unwrap();

            assert_eq!(p.bits() as usize, bits);
            assert!(bool::from(p.is_odd()));
        }
    }

    #[test]
    fn random_bytes_masks_high_bits() {
        for bits in [16usize, 20, 255, 2048] {
            let buf = random_bytes(bits).unwrap();
            let n = U2048::from_be_slice(&buf);

            assert!(n.bits() as usize <= bits);
        }
    }

    #[test]
    fn mod_pow_check_res() {
        let p = U2048::from_u64(1001);

        assert_eq!(mod_pow(&U2048::from_u64(2), &U2048::from_u64(10), &p).unwrap(), U2048::from_u64(23));
        assert_eq!(mod_pow(&U2048::from_u64(7), &U2048::ZERO, &p).unwrap(), U2048::ONE);
        assert_eq!(mod_pow(&U2048::from_u64(1234), &U2048::ONE, &p).unwrap(), U2048::from_u64(233));

        // 3^(p-1) = 1 mod p for prime p
        let q = U2048::from_u64(65537);
        assert_eq!(mod_pow(&U2048::from_u64(3), &U2048::from_u64(65536), &q).unwrap(), U2048::ONE);
    }

    #[test]
    fn modulus_errors() {
        let g = U2048::from_u64(2);

        assert_eq!(generate_public_key(&g, &g, &U2048::ONE).unwrap_err(), CipherError::InvalidModulus);
        assert_eq!(generate_public_key(&g, &g, &U2048::ZERO).unwrap_err(), CipherError::InvalidModulus);
        assert_eq!(generate_private_key(&U2048::ZERO).unwrap_err(), CipherError::InvalidModulus);
    }

    #[test]
    fn even_modulus_is_rejected() {
        let g = U2048::from_u64(2);
        let even = U2048::from_u64(1000);

        assert_eq!(generate_public_key(&g, &U2048::from_u64(5), &even).unwrap_err(), CipherError::InvalidModulus);
        assert_eq!(generate_shared_key(&U2048::from_u64(5), &g, &even).unwrap_err(), CipherError::InvalidModulus);
        assert_eq!(generate_private_key(&even).unwrap_err(), CipherError::InvalidModulus);
        assert_eq!(DhParameters::from_prime(U2048::from_u64(4096)).unwrap_err(), CipherError::InvalidModulus);
    }

    #[test]
    fn private_key_below_prime() {
        let p = U2048::from_u64(65537);

        for _ in 0..200 {
            assert!(generate_private_key(&p).unwrap() < p);
        }
    }

    #[test]
    fn hash_strips_leading_zeros() {
        assert_eq!(hash_shared_key(&U2048::ZERO), <[u8; 32]>::from(Sha256::digest(b"")));
        assert_eq!(hash_shared_key(&U2048::from_u64(0x0102)), <[u8; 32]>::from(Sha256::digest([1u8, 2])));
    }

    #[test]
    fn parameters_agree() {
        let alice = DhParameters::generate(128).unwrap();
        let bob = DhParameters::from_prime(alice.prime).unwrap();

        assert_eq!(alice.generator, U2048::from_u64(2));
        assert_eq!(alice.shared_key(&bob.public_key).unwrap(), bob.shared_key(&alice.public_key).unwrap());
        assert_eq!(alice.hashed_key(&bob.public_key).unwrap(), bob.hashed_key(&alice.public_key).unwrap());

        let s = format!("{alice:?}");
        assert!(s.contains("prime_bits"));
    }
}
