//! Framing helpers shared by [`crate::binary_packing`] and [`crate::fastpfor`]:
//! the alignment cookie constant and the pointer-alignment check they both
//! perform at codec entry (§4.1, §9 re-architecting note on implicit
//! alignment).

use crate::error::{CodecError, CodecResult};
use crate::width::Width;

/// The literal alignment padding value, carried over unchanged from the
/// original source so wire bytes match the documented constant.
pub const COOKIE: u32 = 0x0001_E240;

/// Returns an error unless `slice` begins at an address aligned to `W::BITS`
/// bits.
pub fn check_alignment<W: Width>(what: &'static str, slice: &[u32]) -> CodecResult<()> {
    let required_bits = W::BITS;
    let required_bytes = required_bits / 8;
    if (slice.as_ptr() as usize) % required_bytes == 0 {
        Ok(())
    } else {
        Err(CodecError::BadAlignment { what, required_bits })
    }
}

/// Number of `u32` cookie words needed after an `n`-word header so the total
/// (header + cookies) is a whole number of `lanes`-word vectors.
#[inline]
#[must_use]
pub fn cookie_words(lanes: usize, header_words: usize) -> usize {
    (lanes - header_words % lanes) % lanes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_words_fills_to_lane_boundary() {
        assert_eq!(cookie_words(4, 1), 3);
        assert_eq!(cookie_words(8, 1), 7);
        assert_eq!(cookie_words(16, 1), 15);
        assert_eq!(cookie_words(4, 4), 0);
        assert_eq!(cookie_words(4, 0), 0);
    }
}
