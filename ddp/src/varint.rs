//! Unsigned integers on wire are stored big endian in as few bytes as possible. The sign of an integer is never part
//! of its varint, it lives in the type tag of the surrounding record.
//!
//! Length fields are at most seven bytes wide and handled as `u64`. Integer payloads have no width limit and are
//! handled as `BigUint`.

use num_bigint::BigUint;

/// Returns the number of bytes needed to encode this value. Zero still occupies one byte.
#[inline]
pub fn width(value: u64) -> u8 {
    if value < 1 << 8 {
        1
    } else if value < 1 << 16 {
        2
    } else if value < 1 << 24 {
        3
    } else if value < 1 << 32 {
        4
    } else if value < 1 << 40 {
        5
    } else if value < 1 << 48 {
        6
    } else if value < 1 << 56 {
        7
    } else {
        8
    }
}

/// Packs `value` into its minimal big endian representation. Zero packs to a single `0x00`; whether a zero is worth
/// writing at all is up to the caller.
pub fn pack(value: u64) -> Vec<u8> {
    let buf = value.to_be_bytes();
    buf[buf.len() - width(value) as usize..].to_vec()
}

/// Accumulates at most eight big endian bytes. An empty slice yields zero.
pub fn unpack(buf: &[u8]) -> u64 {
    buf.iter().fold(0u64, |acc, b| acc << 8 | *b as u64)
}

/// Like [pack] for magnitudes of any size.
pub fn pack_magnitude(value: &BigUint) -> Vec<u8> {
    value.to_bytes_be()
}

/// Like [unpack] for magnitudes of any size. Leading zero bytes are tolerated.
pub fn unpack_magnitude(buf: &[u8]) -> BigUint {
    BigUint::from_bytes_be(buf)
}

#[cfg(test)]
mod tests {
    use super::{pack, pack_magnitude, unpack, unpack_magnitude, width};
    use num_bigint::BigUint;

    #[test]
    fn minimal() {
        assert_eq!(vec![0x00], pack(0));
        assert_eq!(vec![0x01], pack(1));
        assert_eq!(vec![0xff], pack(255));
        assert_eq!(vec![0x01, 0x00], pack(256));
        assert_eq!(vec![0xff; 8], pack(u64::MAX));
        assert_eq!(7, width((1 << 56) - 1));
        assert_eq!(8, width(1 << 56));
    }

    #[test]
    fn roundtrip() {
        // choose large prime number to make this test terminate in acceptable time
        for i in (0..u64::MAX).step_by(3_203_431_780_337) {
            let packed = pack(i);
            assert_eq!(width(i) as usize, packed.len());
            assert!(packed.len() == 1 || packed[0] != 0);
            assert_eq!(i, unpack(&packed));
            assert_eq!(packed, pack_magnitude(&BigUint::from(i)));
        }
    }

    #[test]
    fn wide_magnitudes() {
        let big = BigUint::from(1u8) << 64;
        assert_eq!(vec![1, 0, 0, 0, 0, 0, 0, 0, 0], pack_magnitude(&big));
        assert_eq!(big, unpack_magnitude(&[1, 0, 0, 0, 0, 0, 0, 0, 0]));
        let huge = (BigUint::from(1u8) << 1000) - 1u8;
        assert_eq!(125, pack_magnitude(&huge).len());
        assert_eq!(huge, unpack_magnitude(&pack_magnitude(&huge)));
    }

    #[test]
    fn lenient_unpack() {
        assert_eq!(0, unpack(&[]));
        assert_eq!(BigUint::from(0u8), unpack_magnitude(&[]));
        assert_eq!(BigUint::from(2u8), unpack_magnitude(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 2]));
    }

}
