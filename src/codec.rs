//! The common interface every codec family in this crate implements (§6).

use crate::error::CodecResult;

/// A reusable integer codec over `u32` slices.
///
/// Implementations never allocate their output buffer: callers own the
/// encoded/decoded storage and pass it in, the same contract the
/// `fastlanes` crate's `BitPacking` trait uses for its `unchecked_pack`
/// family.
pub trait Codec {
    /// A short, stable name identifying this codec and its width, e.g.
    /// `"binarypacking256"`.
    fn name(&self) -> &'static str;

    /// The number of `u32` input values this codec's mini-block (or group)
    /// operates on. `encode`/`decode` require `input.len()` to be a multiple
    /// of this value.
    fn block_size(&self) -> usize;

    /// Encodes `input` into `output`, returning the number of `u32` words of
    /// `output` that were written.
    ///
    /// Takes `&mut self` because `FastPfor256` and `GroupSimple` reuse owned
    /// scratch buffers across calls (§3 Ownership/lifecycle); codec
    /// instances are not thread-safe.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CodecError::InvalidLength`] if
    /// `input.len()` is not a multiple of [`Codec::block_size`], and
    /// [`crate::error::CodecError::NotEnoughStorage`] if `output` is too
    /// small to hold the encoded stream.
    fn encode(&mut self, input: &[u32], output: &mut [u32]) -> CodecResult<usize>;

    /// Decodes `input` (a stream previously produced by [`Codec::encode`])
    /// into `output`, returning `(consumed, produced)`: the number of `u32`
    /// words read from `input` and the number of `u32` values written to
    /// `output`. A caller decoding a concatenation of streams back-to-back
    /// uses `consumed` to find where the next one starts.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CodecError::CorruptStream`] if the stream's
    /// internal structure (cookie, selectors, bit-width bytes) is invalid,
    /// and [`crate::error::CodecError::NotEnoughStorage`] if `output` is too
    /// small to hold the decoded values.
    fn decode(&mut self, input: &[u32], output: &mut [u32]) -> CodecResult<(usize, usize)>;
}
