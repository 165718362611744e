//! Marker types selecting a SIMD register width for the bit-packing kernels.
//!
//! The kernels never reach for a hardware intrinsic: a "vector" here is a
//! plain `[u32]` slice of [`Width::LANES`] words, and auto-vectorization is
//! left to the compiler, the same posture the `fastlanes` crate's portable
//! kernels take. `Width` exists purely to carry the lane count through the
//! type system so that `BinaryPacking<W128>` and `BinaryPacking<W256>` are
//! distinct, non-interchangeable codecs.

use std::fmt::Debug;

/// A compile-time SIMD register width, expressed as its lane count.
pub trait Width: Copy + Debug + Default + Send + Sync + 'static {
    /// Number of 32-bit lanes in one vector of this width (`bits / 32`).
    const LANES: usize;
    /// The register bit-width this instantiation represents, for naming.
    const BITS: usize;
}

/// A 128-bit vector: 4 lanes.
#[derive(Copy, Clone, Debug, Default)]
pub struct W128;

/// A 256-bit vector: 8 lanes.
#[derive(Copy, Clone, Debug, Default)]
pub struct W256;

/// A 512-bit vector: 16 lanes.
#[derive(Copy, Clone, Debug, Default)]
pub struct W512;

impl Width for W128 {
    const LANES: usize = 4;
    const BITS: usize = 128;
}

impl Width for W256 {
    const LANES: usize = 8;
    const BITS: usize = 256;
}

impl Width for W512 {
    const LANES: usize = 16;
    const BITS: usize = 512;
}

/// Marks the widths [`crate::group_simple`] is defined at (`W ∈ {256, 512}`);
/// unlike `BinaryPacking`, `GroupSimple` has no 128-bit instantiation.
pub trait GroupSimpleWidth: Width {}

impl GroupSimpleWidth for W256 {}
impl GroupSimpleWidth for W512 {}
