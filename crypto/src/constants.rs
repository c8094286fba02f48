pub const BLOCK_SIZE128: usize = 16;

// RC5
pub const RC5_ROUNDS: usize = 16;
pub const RC5_ROUND_KEYS_COUNT: usize = 2 * (RC5_ROUNDS + 1);
pub const RC5_DEFAULT_WORD_BITS: u32 = 64;

pub const P16: u64 = 0xb7e1;
pub const Q16: u64 = 0x9e37;
pub const P32: u64 = 0xb7e15163;
pub const Q32: u64 = 0x9e3779b9;
pub const P64: u64 = 0xb7e151628aed2a6b;
pub const Q64: u64 = 0x9e3779b97f4a7c15;

// Twofish
pub const TWOFISH_ROUNDS: usize = 16;
pub const TWOFISH_SUBKEYS_COUNT: usize = 40;
pub const TWOFISH_KEY_SIZES: [usize; 3] = [16, 24, 32];

// x^8 + x^6 + x^5 + x^3 + 1 without the x^8 term
pub const GF_REDUCTION: u8 = 0x69;

pub const Q0_T: [[u8; 16]; 4] = [
    [0x8, 0x1, 0x7, 0xD, 0x6, 0xF, 0x3, 0x2, 0x0, 0xB, 0x5, 0x9, 0xE, 0xC, 0xA, 0x4],
    [0xE, 0xC, 0xB, 0x8, 0x1, 0x2, 0x3, 0x5, 0xF, 0x4, 0xA, 0x6, 0x7, 0x0, 0x9, 0xD],
    [0xB, 0xA, 0x5, 0xE, 0x6, 0xD, 0x9, 0x0, 0xC, 0x8, 0xF, 0x3, 0x2, 0x4, 0x7, 0x1],
    [0xD, 0x7, 0xF, 0x4, 0x1, 0x2, 0x6, 0xE, 0x9, 0xB, 0x3, 0x0, 0x8, 0x5, 0xC, 0xA],
];

pub const Q1_T: [[u8; 16]; 4] = [
    [0x2, 0x8, 0xB, 0xD, 0xF, 0x7, 0x6, 0xE, 0x3, 0x1, 0x9, 0x4, 0x0, 0xA, 0xC, 0x5],
    [0x1, 0xE, 0x2, 0xB, 0x4, 0xC, 0x3, 0x7, 0x6, 0xD, 0xA, 0x5, 0xF, 0x9, 0x0, 0x8],
    [0x4, 0xC, 0x7, 0x5, 0x1, 0x6, 0x9, 0xA, 0x0, 0xE, 0xD, 0x8, 0x2, 0xB, 0x3, 0xF],
    [0xB, 0x9, 0x5, 0x1, 0xC, 0x3, 0xD, 0xE, 0x6, 0x4, 0x7, 0xF, 0x2, 0x0, 0x8, 0xA],
];

pub const MDS: [[u8; 4]; 4] = [
    [0x01, 0xEF, 0x5B, 0x5B],
    [0xEF, 0x01, 0xEF, 0x5B],
    [0x5B, 0xEF, 0x01, 0xEF],
    [0x5B, 0x5B, 0xEF, 0x01],
];

pub const RS: [[u8; 8]; 4] = [
    [0x01, 0xa4, 0x55, 0x87, 0x5a, 0x58, 0xdb, 0x9e],
    [0xa4, 0x56, 0x82, 0xf3, 0x1e, 0xc6, 0x68, 0xe5],
    [0x02, 0xa1, 0xfc, 0xc1, 0x47, 0xae, 0x3d, 0x19],
    [0xa4, 0x55, 0x87, 0x5a, 0x58, 0xdb, 0x9e, 0x03],
];

// RandomDelta mode. Shared by every session: identical blocks encrypt identically.
pub const RANDOM_DELTA: [u8; BLOCK_SIZE128] = [
    0x7e, 0x8f, 0x9d, 0x52, 0xb4, 0x3c, 0x08, 0x18,
    0xd5, 0xe8, 0xa0, 0x9c, 0x72, 0xfb, 0xba, 0xcf,
];

// Diffie-Hellman
pub const DH_GENERATOR: u64 = 2;
pub const DH_MIN_PRIME_BITS: usize = 16;
pub const DH_MAX_PRIME_BITS: usize = 2048;
pub const DH_MAX_PRIME_BYTES: usize = DH_MAX_PRIME_BITS / 8;
