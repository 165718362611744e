//! The vectorized bit-packing kernels (§4.1 of the design spec).
//!
//! A mini-block of `Width::LANES * 32` integers is viewed as a 32-row by
//! `LANES`-column matrix, row-major in memory. Packing a mini-block at bit
//! width `b` produces `b` vectors of `LANES` words: each lane runs its own
//! independent shift-accumulator over its column of 32 values, exactly the
//! "bit-contiguous within a column" layout described in the Lemire-Boytsov
//! vectorized bit-packing papers.
//!
//! [`pack_rows`]/[`unpack_rows`] generalize the row count so that
//! [`crate::group_simple`] can reuse the same per-lane accumulator with a
//! variable row count instead of the fixed 32 rows used by
//! [`crate::binary_packing`] and [`crate::fastpfor`].

use crate::error::{CodecError, CodecResult};
use crate::width::Width;

/// Number of rows packed per mini-block by [`crate::binary_packing`] and
/// [`crate::fastpfor`] (`§3`: `LANES * 32` integers per mini-block).
pub const MINI_BLOCK_ROWS: usize = 32;

/// Returns the number of `u32` output words produced by packing `rows` rows
/// of `W::LANES` values at the given bit width.
#[inline]
#[must_use]
pub fn packed_words<W: Width>(rows: usize, bits: u32) -> usize {
    rows * bits as usize / 32 * W::LANES
}

/// Mask that keeps the low `bits` bits of a value (`bits` may be 0..=32).
#[inline]
#[must_use]
fn low_bits_mask(bits: u32) -> u64 {
    if bits >= 32 {
        u32::MAX as u64
    } else {
        (1u64 << bits) - 1
    }
}

/// Packs `rows * W::LANES` integers, read row-major from `input`, into
/// `bits`-wide lanes written to `output`.
///
/// `output` must hold exactly `rows * bits / 32 * W::LANES` words; `input`
/// must hold exactly `rows * W::LANES` words. When `with_mask` is `false`,
/// every input value must already fit in `bits` bits — violating this
/// precondition silently produces incorrect (not panicking) output, matching
/// the original "without mask" kernels.
pub fn pack_rows<W: Width>(
    bits: u32,
    with_mask: bool,
    rows: usize,
    input: &[u32],
    output: &mut [u32],
) {
    debug_assert_eq!(input.len(), rows * W::LANES);
    debug_assert_eq!(output.len(), packed_words::<W>(rows, bits));

    if bits == 0 {
        return;
    }

    let mask = low_bits_mask(bits);
    for lane in 0..W::LANES {
        let mut acc: u64 = 0;
        let mut bits_held: u32 = 0;
        let mut out_idx = 0usize;
        for row in 0..rows {
            let raw = u64::from(input[row * W::LANES + lane]);
            let v = if with_mask { raw & mask } else { raw };
            acc |= v << bits_held;
            bits_held += bits;
            while bits_held >= 32 {
                #[allow(clippy::cast_possible_truncation)]
                let word = (acc & 0xFFFF_FFFF) as u32;
                output[out_idx * W::LANES + lane] = word;
                acc >>= 32;
                bits_held -= 32;
                out_idx += 1;
            }
        }
        debug_assert_eq!(bits_held, 0, "rows * bits must be a multiple of 32");
    }
}

/// Inverse of [`pack_rows`]: reads `b` vectors of `LANES` words from `input`
/// and writes `rows * W::LANES` unpacked integers, each in `[0, 2^bits)`, to
/// `output`.
pub fn unpack_rows<W: Width>(bits: u32, rows: usize, input: &[u32], output: &mut [u32]) {
    debug_assert_eq!(input.len(), packed_words::<W>(rows, bits));
    debug_assert_eq!(output.len(), rows * W::LANES);

    if bits == 0 {
        output.fill(0);
        return;
    }

    let mask = low_bits_mask(bits);
    for lane in 0..W::LANES {
        let mut acc: u64 = 0;
        let mut bits_held: u32 = 0;
        let mut in_idx = 0usize;
        for row in 0..rows {
            while bits_held < bits {
                acc |= u64::from(input[in_idx * W::LANES + lane]) << bits_held;
                bits_held += 32;
                in_idx += 1;
            }
            #[allow(clippy::cast_possible_truncation)]
            let value = (acc & mask) as u32;
            output[row * W::LANES + lane] = value;
            acc >>= bits;
            bits_held -= bits;
        }
    }
}

/// The dispatch shim of §4.5: packs one mini-block ([`MINI_BLOCK_ROWS`] rows)
/// without masking, routing to the per-width kernel at runtime.
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedWidth`] if `bits > 32`.
pub fn pack<W: Width>(bits: u32, input: &[u32], output: &mut [u32]) -> CodecResult<()> {
    if bits > 32 {
        return Err(CodecError::UnsupportedWidth(bits));
    }
    pack_rows::<W>(bits, false, MINI_BLOCK_ROWS, input, output);
    Ok(())
}

/// As [`pack`], but truncates each input value to `bits` bits rather than
/// assuming it already fits (the "with-mask" variant of §4.1).
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedWidth`] if `bits > 32`.
pub fn pack_masked<W: Width>(bits: u32, input: &[u32], output: &mut [u32]) -> CodecResult<()> {
    if bits > 32 {
        return Err(CodecError::UnsupportedWidth(bits));
    }
    pack_rows::<W>(bits, true, MINI_BLOCK_ROWS, input, output);
    Ok(())
}

/// The dispatch shim of §4.5: unpacks one mini-block, routing to the
/// per-width kernel at runtime.
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedWidth`] if `bits > 32`.
pub fn unpack<W: Width>(bits: u32, input: &[u32], output: &mut [u32]) -> CodecResult<()> {
    if bits > 32 {
        return Err(CodecError::UnsupportedWidth(bits));
    }
    unpack_rows::<W>(bits, MINI_BLOCK_ROWS, input, output);
    Ok(())
}

/// The number of significant bits needed to represent `value` (0 for 0).
#[inline]
#[must_use]
pub fn bits_for_value(value: u32) -> u32 {
    32 - value.leading_zeros()
}

/// The maximum `bits_for_value` across a slice, i.e. the minimal bit width
/// that can represent every value without loss.
#[inline]
#[must_use]
pub fn max_bits(values: &[u32]) -> u32 {
    values.iter().copied().map(bits_for_value).max().unwrap_or(0)
}
