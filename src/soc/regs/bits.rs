//! Width-aware bit helpers shared by the register runtime and the field cache.

/// All-ones mask of `width` bits; saturates at 64.
#[inline]
pub fn mask_bits(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Right-aligned value of `width` bits starting at LSB `offset`.
#[inline]
pub fn extract(word: u32, offset: u32, width: u32) -> u32 {
    ((u64::from(word) >> offset) & mask_bits(width)) as u32
}

/// Replaces `width` bits at `offset` in `word`. Callers check that `value`
/// fits; excess bits are masked off here.
#[inline]
pub fn insert(word: u32, offset: u32, width: u32, value: u64) -> u32 {
    let mask = mask_bits(width) << offset;
    let cleared = u64::from(word) & !mask;
    (cleared | ((value << offset) & mask)) as u32
}

#[inline]
pub fn fits(value: u64, width: u32) -> bool {
    value & !mask_bits(width) == 0
}

/// Reinterprets the low `bits` of `value` as two's complement.
pub fn to_signed(value: u64, bits: u32) -> i64 {
    if bits == 0 {
        return 0;
    }
    if bits >= 64 {
        return value as i64;
    }
    let sign = 1u64 << (bits - 1);
    let value = value & mask_bits(bits);
    (value ^ sign) as i64 - sign as i64
}
