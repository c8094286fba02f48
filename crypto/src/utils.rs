use byteorder::{ByteOrder, LittleEndian};

pub fn load_word(src: &[u8]) -> u64 {
    assert!(src.len() == 8, "Slice length is not 8");

    LittleEndian::read_u64(src)
}

pub fn store_word(src: u64, dst: &mut [u8]) {
    assert!(dst.len() >= 8, "Slice length must be at least 8");

    LittleEndian::write_u64(&mut dst[..8], src);
}

pub fn load_word32(src: &[u8]) -> u32 {
    assert!(src.len() == 4, "Slice length is not 4");

    LittleEndian::read_u32(src)
}

pub fn store_word32(src: u32, dst: &mut [u8]) {
    assert!(dst.len() >= 4, "Slice length must be at least 4");

    LittleEndian::write_u32(&mut dst[..4], src);
}

/// XORs `src` into `dst` byte by byte.
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    dst.iter_mut()
        .zip(src.iter())
        .for_each(|(x1, x2)| *x1 ^= x2);
}

/// Treats the whole block as one big-endian integer and adds one, carrying
/// across bytes and wrapping at the top.
pub fn increment_counter(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}
