//! Error taxonomy shared by every codec in this crate.

use std::fmt;

/// The result type returned by fallible operations in this crate.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding a bit-packed stream.
///
/// All variants are fatal to the operation in progress: there is no partial
/// result, and the contents of the caller's output buffer are unspecified
/// after an error is returned.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum CodecError {
    /// The input length was not a multiple of the codec's mini-block size.
    #[error("invalid input length {len}: must be a multiple of {block_size}")]
    InvalidLength {
        /// The length that was provided.
        len: usize,
        /// The mini-block (or group) size the length must divide.
        block_size: usize,
    },
    /// An input or output pointer violated the codec's SIMD alignment
    /// requirement.
    #[error("{what} pointer is not aligned to {required_bits} bits")]
    BadAlignment {
        /// Which buffer violated alignment (`"input"` or `"output"`).
        what: &'static str,
        /// The required alignment, in bits.
        required_bits: usize,
    },
    /// The encoded stream is internally inconsistent: a cookie word did not
    /// match the expected magic value, a selector referenced an undefined
    /// mode, or a bit-width byte exceeded 32.
    #[error("corrupt stream: {0}")]
    CorruptStream(CorruptReason),
    /// The caller-provided output buffer is smaller than the declared
    /// decoded length.
    #[error("output buffer has room for {available} values but {needed} are required")]
    NotEnoughStorage {
        /// The number of `u32` slots the caller provided.
        available: usize,
        /// The number of `u32` slots actually needed.
        needed: usize,
    },
    /// The dispatch shim was asked to pack or unpack at a bit width the
    /// kernels do not support.
    #[error("unsupported bit width {0} (must be <= 32)")]
    UnsupportedWidth(u32),
}

/// The specific reason a stream was rejected as corrupt.
///
/// Kept as a sub-enum (rather than folding the message into
/// [`CodecError::CorruptStream`] directly) so callers can match on the
/// precise cause without parsing the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CorruptReason {
    /// An alignment cookie word did not equal `0x0001_E240`.
    BadCookie {
        /// The word actually read from the stream.
        found: u32,
    },
    /// A `GroupSimple` selector nibble referenced a mode outside `[0, 9]`.
    BadSelector {
        /// The out-of-range selector value.
        selector: u8,
    },
    /// A `BinaryPacking`/`FastPFor` bit-width byte was greater than 32.
    BadBitWidth {
        /// The out-of-range width byte.
        width: u8,
    },
}

impl fmt::Display for CorruptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadCookie { found } => {
                write!(f, "alignment cookie was 0x{found:08x}, expected 0x0001e240")
            }
            Self::BadSelector { selector } => {
                write!(f, "selector {selector} does not name one of the 10 modes")
            }
            Self::BadBitWidth { width } => write!(f, "bit width byte {width} exceeds 32"),
        }
    }
}
