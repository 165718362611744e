//! GroupSimple(W): variable-width group packing over a 10-entry selector
//! table (§4.4). Defined only for `W ∈ {256, 512}` (`W::GroupSimpleWidth`);
//! `BinaryPacking`'s 128-bit instantiation has no counterpart here.

use std::collections::VecDeque;
use std::marker::PhantomData;

use arrayref::array_ref;
use log::trace;

use crate::codec::Codec;
use crate::error::{CodecError, CodecResult, CorruptReason};
use crate::kernel;
use crate::width::{GroupSimpleWidth, Width};

/// The 10 fixed `(n_i, b_i)` modes selectors `0..=9` name: `n_i` groups of
/// `W::LANES` values, each `b_i` bits wide. `n_i * b_i` is 32 for 7 of the 10
/// modes and 30 for the remaining three (`(10,3)`, `(6,5)`, `(3,10)`), which
/// leave the top two bits of every lane's word unused; this mirrors the
/// original fixed table rather than a uniformly dense one.
const MODES: [(u32, u32); 10] = [
    (32, 1),
    (16, 2),
    (10, 3),
    (8, 4),
    (6, 5),
    (5, 6),
    (4, 8),
    (3, 10),
    (2, 16),
    (1, 32),
];

/// Which of the two equivalent selector-planning algorithms a codec instance
/// runs. Both produce byte-identical selector sequences; they differ only in
/// how the pseudo-max lookahead is staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSimpleStrategy {
    /// Computes the full pseudo-max array up front, then plans selectors,
    /// then packs: three separate passes over the data.
    WoRingBuf,
    /// Plans selectors from a sliding window of at most 32 pseudo-maxes,
    /// refilling it as groups are consumed.
    WRingBuf,
}

/// Variable-width group packing at SIMD width `W`.
///
/// Holds no scratch state across calls; `pessimistic_gap` and `strategy` are
/// fixed at construction.
#[derive(Debug)]
pub struct GroupSimple<W: GroupSimpleWidth> {
    strategy: GroupSimpleStrategy,
    pessimistic_gap: bool,
    _width: PhantomData<W>,
}

impl<W: GroupSimpleWidth> GroupSimple<W> {
    /// Creates a codec using the batch (`woRingBuf`) planning strategy with
    /// the selector area always compacted to its exact size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategy: GroupSimpleStrategy::WoRingBuf,
            pessimistic_gap: false,
            _width: PhantomData,
        }
    }

    /// Creates a codec with an explicit strategy and gap-reservation policy.
    ///
    /// `pessimistic_gap` only affects [`GroupSimpleStrategy::WRingBuf`]: when
    /// `true`, the selector area is reserved at its worst-case size (one
    /// selector per group) instead of compacted, matching the "gap
    /// preserved" behavior described for the ring-buffer strategy. With
    /// `pessimistic_gap = false`, both strategies produce byte-identical
    /// streams.
    #[must_use]
    pub fn with_strategy(strategy: GroupSimpleStrategy, pessimistic_gap: bool) -> Self {
        Self {
            strategy,
            pessimistic_gap,
            _width: PhantomData,
        }
    }
}

impl<W: GroupSimpleWidth> Default for GroupSimple<W> {
    fn default() -> Self {
        Self::new()
    }
}

/// Packs `n` groups (`n * W::LANES` values) of `b` bits each into exactly one
/// `W::LANES`-word output vector. Valid only for `(n, b)` pairs from
/// [`MODES`], where `n * b <= 32` always holds, so every lane's accumulator
/// fits in a single `u32` with no flush/carry logic.
fn pack_mode<W: Width>(n: usize, b: u32, input: &[u32], output: &mut [u32]) {
    debug_assert_eq!(input.len(), n * W::LANES);
    debug_assert_eq!(output.len(), W::LANES);
    for lane in 0..W::LANES {
        let mut word = 0u32;
        for row in 0..n {
            #[allow(clippy::cast_possible_truncation)]
            let shift = (row as u32) * b;
            word |= input[row * W::LANES + lane] << shift;
        }
        output[lane] = word;
    }
}

/// Inverse of [`pack_mode`].
fn unpack_mode<W: Width>(n: usize, b: u32, input: &[u32], output: &mut [u32]) {
    debug_assert_eq!(input.len(), W::LANES);
    debug_assert_eq!(output.len(), n * W::LANES);
    let mask = if b >= 32 { u32::MAX } else { (1u32 << b) - 1 };
    for lane in 0..W::LANES {
        let word = input[lane];
        for row in 0..n {
            #[allow(clippy::cast_possible_truncation)]
            let shift = (row as u32) * b;
            output[row * W::LANES + lane] = (word >> shift) & mask;
        }
    }
}

/// Picks, for the `remaining` groups starting here, the first mode (largest
/// `n_i` first) whose `n_i` fits in `remaining` and whose `b_i` covers the
/// true bit-width of those `n_i` group-maxes. Mode 9 (`n=1, b=32`) always
/// qualifies once `remaining >= 1`, so this never fails to choose.
fn choose_mode(pseudo_max: &[u32], remaining: usize) -> usize {
    let mut chosen = MODES.len() - 1;
    for (i, &(n, b)) in MODES.iter().enumerate() {
        let n = n as usize;
        if n <= remaining {
            let max_bits = pseudo_max[..n].iter().copied().map(kernel::bits_for_value).max().unwrap_or(0);
            if max_bits <= b {
                chosen = i;
                break;
            }
        }
    }
    chosen
}

/// Batch (`woRingBuf`) selector planning: the whole pseudo-max array is
/// already materialized, so each step just slices into it.
fn plan_selectors_batch(pseudo_max: &[u32]) -> Vec<u8> {
    let mut selectors = Vec::new();
    let mut g = 0usize;
    let total = pseudo_max.len();
    while g < total {
        let chosen = choose_mode(&pseudo_max[g..], total - g);
        trace!("groupsimple: group {g} selects mode {chosen} {:?}", MODES[chosen]);
        #[allow(clippy::cast_possible_truncation)]
        selectors.push(chosen as u8);
        g += MODES[chosen].0 as usize;
    }
    selectors
}

/// Ring-buffer (`wRingBuf`) selector planning: the same greedy decision, fed
/// from a sliding window of at most 32 lookahead values instead of the full
/// array. Produces byte-identical selectors to [`plan_selectors_batch`],
/// since `choose_mode` never looks past `min(32, remaining)` entries anyway
/// (no mode has `n_i > 32`).
fn plan_selectors_ring(pseudo_max: &[u32]) -> Vec<u8> {
    let mut selectors = Vec::new();
    let mut ring: VecDeque<u32> = VecDeque::with_capacity(32);
    let mut next = 0usize;
    let total = pseudo_max.len();
    loop {
        while ring.len() < 32 && next < total {
            ring.push_back(pseudo_max[next]);
            next += 1;
        }
        if ring.is_empty() {
            break;
        }
        let window: Vec<u32> = ring.iter().copied().collect();
        let chosen = choose_mode(&window, ring.len());
        let n = MODES[chosen].0 as usize;
        #[allow(clippy::cast_possible_truncation)]
        selectors.push(chosen as u8);
        for _ in 0..n {
            ring.pop_front();
        }
    }
    selectors
}

impl<W: GroupSimpleWidth> Codec for GroupSimple<W> {
    fn name(&self) -> &'static str {
        match W::BITS {
            256 => "groupsimple256",
            512 => "groupsimple512",
            _ => unreachable!("GroupSimpleWidth is sealed to 256/512"),
        }
    }

    fn block_size(&self) -> usize {
        W::LANES
    }

    fn encode(&mut self, input: &[u32], output: &mut [u32]) -> CodecResult<usize> {
        let lanes = W::LANES;
        if input.len() % lanes != 0 {
            return Err(CodecError::InvalidLength { len: input.len(), block_size: lanes });
        }
        crate::framing::check_alignment::<W>("input", input)?;
        crate::framing::check_alignment::<W>("output", output)?;

        let total_groups = input.len() / lanes;
        let pseudo_max: Vec<u32> = (0..total_groups)
            .map(|g| input[g * lanes..(g + 1) * lanes].iter().fold(0u32, |acc, &v| acc | v))
            .collect();

        let selectors = match self.strategy {
            GroupSimpleStrategy::WoRingBuf => plan_selectors_batch(&pseudo_max),
            GroupSimpleStrategy::WRingBuf => plan_selectors_ring(&pseudo_max),
        };

        #[allow(clippy::cast_possible_truncation)]
        let tail_count: u8 = selectors.last().map_or(0, |&s| MODES[s as usize].0 as u8);

        let mut data = Vec::with_capacity(selectors.len() * lanes);
        let mut g = 0usize;
        for &s in &selectors {
            let (n, b) = MODES[s as usize];
            let n = n as usize;
            let mut word = vec![0u32; lanes];
            pack_mode::<W>(n, b, &input[g * lanes..(g + n) * lanes], &mut word);
            data.extend_from_slice(&word);
            g += n;
        }
        debug_assert_eq!(g, total_groups);

        let mut sel_bytes = Vec::with_capacity(selectors.len().div_ceil(2));
        for pair in selectors.chunks(2) {
            let lo = pair[0];
            let hi = pair.get(1).copied().unwrap_or(0);
            sel_bytes.push(lo | (hi << 4));
        }
        let compact_area = sel_bytes.len();
        let count_sel_area8 =
            if self.strategy == GroupSimpleStrategy::WRingBuf && self.pessimistic_gap {
                total_groups.div_ceil(2)
            } else {
                compact_area
            };
        sel_bytes.resize(count_sel_area8, 0);

        let mut region = sel_bytes;
        region.push(tail_count);

        let header_bytes = 12;
        let align_bytes = lanes * 4;
        let total_before_pad = header_bytes + region.len();
        let padded_total = total_before_pad.div_ceil(align_bytes) * align_bytes;
        region.resize(region.len() + (padded_total - total_before_pad), 0);

        let region_words: Vec<u32> = region
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes(*array_ref![c, 0, 4]))
            .collect();

        let total_words = 3 + region_words.len() + data.len();
        if output.len() < total_words {
            return Err(CodecError::NotEnoughStorage { available: output.len(), needed: total_words });
        }

        let mut pos = 0usize;
        #[allow(clippy::cast_possible_truncation)]
        {
            output[pos] = input.len() as u32;
        }
        pos += 1;
        #[allow(clippy::cast_possible_truncation)]
        {
            output[pos] = selectors.len() as u32;
        }
        pos += 1;
        #[allow(clippy::cast_possible_truncation)]
        {
            output[pos] = count_sel_area8 as u32;
        }
        pos += 1;
        output[pos..pos + region_words.len()].copy_from_slice(&region_words);
        pos += region_words.len();
        output[pos..pos + data.len()].copy_from_slice(&data);
        pos += data.len();

        Ok(pos)
    }

    fn decode(&mut self, input: &[u32], output: &mut [u32]) -> CodecResult<(usize, usize)> {
        crate::framing::check_alignment::<W>("input", input)?;
        crate::framing::check_alignment::<W>("output", output)?;

        let lanes = W::LANES;
        let len = *input.first().ok_or(CodecError::InvalidLength { len: 0, block_size: 3 })? as usize;
        if output.len() < len {
            return Err(CodecError::NotEnoughStorage { available: output.len(), needed: len });
        }
        let count_sels = *input.get(1).ok_or(CodecError::InvalidLength { len: input.len(), block_size: 3 })? as usize;
        let count_sel_area8 =
            *input.get(2).ok_or(CodecError::InvalidLength { len: input.len(), block_size: 3 })? as usize;

        let header_bytes = 12;
        let align_bytes = lanes * 4;
        let region_bytes_len = count_sel_area8 + 1;
        let padded_total = (header_bytes + region_bytes_len).div_ceil(align_bytes) * align_bytes;
        let region_word_count = (padded_total - header_bytes) / 4;

        let mut pos = 3usize;
        let region_words = input
            .get(pos..pos + region_word_count)
            .ok_or(CodecError::InvalidLength { len: input.len(), block_size: pos + region_word_count })?;
        pos += region_word_count;

        let mut region_bytes = Vec::with_capacity(region_word_count * 4);
        for &w in region_words {
            region_bytes.extend_from_slice(&w.to_ne_bytes());
        }

        let sel_bytes = region_bytes
            .get(..count_sel_area8)
            .ok_or(CodecError::InvalidLength { len: input.len(), block_size: count_sel_area8 })?;
        let tail_count = u32::from(
            *region_bytes
                .get(count_sel_area8)
                .ok_or(CodecError::InvalidLength { len: input.len(), block_size: count_sel_area8 + 1 })?,
        );

        let mut selectors = Vec::with_capacity(count_sels);
        for i in 0..count_sels {
            let byte = sel_bytes[i / 2];
            let nib = if i % 2 == 0 { byte & 0xF } else { (byte >> 4) & 0xF };
            if usize::from(nib) >= MODES.len() {
                return Err(CodecError::CorruptStream(CorruptReason::BadSelector { selector: nib }));
            }
            selectors.push(nib);
        }

        let mut out_pos = 0usize;
        for (idx, &s) in selectors.iter().enumerate() {
            let (n, b) = MODES[s as usize];
            let n = n as usize;
            let word = input
                .get(pos..pos + lanes)
                .ok_or(CodecError::InvalidLength { len: input.len(), block_size: pos + lanes })?;
            pos += lanes;

            let mut tmp = vec![0u32; n * lanes];
            unpack_mode::<W>(n, b, word, &mut tmp);

            let real_n = if idx + 1 == selectors.len() { (tail_count as usize).min(n) } else { n };
            let real_len = real_n * lanes;
            let dst = output
                .get_mut(out_pos..out_pos + real_len)
                .ok_or(CodecError::NotEnoughStorage { available: output.len(), needed: out_pos + real_len })?;
            dst.copy_from_slice(&tmp[..real_len]);
            out_pos += real_len;
        }

        Ok((pos, out_pos))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::cast_possible_truncation)]

    use rstest::rstest;

    use super::*;
    use crate::aligned::AlignedVec;
    use crate::width::{W256, W512};

    fn roundtrip<W: GroupSimpleWidth>(input: &[u32], strategy: GroupSimpleStrategy, pessimistic_gap: bool) {
        let mut codec = GroupSimple::<W>::with_strategy(strategy, pessimistic_gap);
        let input_buf = AlignedVec::<W>::from_slice(input);

        let cap = input.len() * 2 + 256;
        let mut encoded = AlignedVec::<W>::zeroed(cap);
        let used = codec.encode(&input_buf, &mut encoded).expect("encode");

        let mut decoded = AlignedVec::<W>::zeroed(input.len());
        let (consumed, produced) = codec.decode(&encoded[..used], &mut decoded).expect("decode");

        assert_eq!(consumed, used);
        assert_eq!(produced, input.len());
        assert_eq!(&*decoded, input);
    }

    #[rstest]
    #[case::wo_ring_buf(GroupSimpleStrategy::WoRingBuf, false)]
    #[case::w_ring_buf(GroupSimpleStrategy::WRingBuf, false)]
    #[case::w_ring_buf_pessimistic(GroupSimpleStrategy::WRingBuf, true)]
    fn empty_input_roundtrips(#[case] strategy: GroupSimpleStrategy, #[case] pessimistic_gap: bool) {
        roundtrip::<W256>(&[], strategy, pessimistic_gap);
    }

    #[test]
    fn single_group_of_ones_uses_mode_zero() {
        let lanes = W256::LANES;
        let input = vec![1u32; lanes * 40];
        roundtrip::<W256>(&input, GroupSimpleStrategy::WoRingBuf, false);
    }

    #[test]
    fn mixed_bit_widths_roundtrip() {
        let lanes = W256::LANES;
        let mut input = Vec::new();
        for g in 0..50 {
            let bits = (g % 17) as u32;
            let v = if bits == 0 { 0 } else { 1u32 << (bits - 1) };
            input.extend(std::iter::repeat(v).take(lanes));
        }
        roundtrip::<W256>(&input, GroupSimpleStrategy::WoRingBuf, false);
    }

    #[test]
    fn w512_roundtrips() {
        let lanes = W512::LANES;
        let input: Vec<u32> = (0..lanes * 70).map(|i| (i % 31) as u32).collect();
        roundtrip::<W512>(&input, GroupSimpleStrategy::WoRingBuf, false);
    }

    #[rstest]
    #[case::small_tail(3)]
    #[case::large_tail(31)]
    fn incomplete_tail_roundtrips(#[case] extra_groups: usize) {
        let lanes = W256::LANES;
        let input: Vec<u32> = (0..lanes * (64 + extra_groups)).map(|i| (i % 5) as u32).collect();
        roundtrip::<W256>(&input, GroupSimpleStrategy::WoRingBuf, false);
    }

    #[test]
    fn both_strategies_agree_when_not_pessimistic() {
        let lanes = W256::LANES;
        let input: Vec<u32> = (0..lanes * 53).map(|i| (i % 200) as u32).collect();

        let mut batch = GroupSimple::<W256>::with_strategy(GroupSimpleStrategy::WoRingBuf, false);
        let mut ring = GroupSimple::<W256>::with_strategy(GroupSimpleStrategy::WRingBuf, false);
        let input_buf = AlignedVec::<W256>::from_slice(&input);

        let mut encoded_batch = AlignedVec::<W256>::zeroed(input.len() * 2 + 256);
        let used_batch = batch.encode(&input_buf, &mut encoded_batch).expect("encode batch");

        let mut encoded_ring = AlignedVec::<W256>::zeroed(input.len() * 2 + 256);
        let used_ring = ring.encode(&input_buf, &mut encoded_ring).expect("encode ring");

        assert_eq!(used_batch, used_ring);
        assert_eq!(&encoded_batch[..used_batch], &encoded_ring[..used_ring]);
    }

    #[test]
    fn pessimistic_gap_reserves_worst_case_selector_area() {
        let lanes = W256::LANES;
        let input = vec![1u32; lanes * 40];
        let mut codec = GroupSimple::<W256>::with_strategy(GroupSimpleStrategy::WRingBuf, true);
        let input_buf = AlignedVec::<W256>::from_slice(&input);
        let mut encoded = AlignedVec::<W256>::zeroed(input.len() * 2 + 256);
        let used = codec.encode(&input_buf, &mut encoded).expect("encode");

        let count_sel_area8 = encoded[2] as usize;
        assert_eq!(count_sel_area8, 40usize.div_ceil(2));

        let mut decoded = AlignedVec::<W256>::zeroed(input.len());
        let (consumed, produced) = codec.decode(&encoded[..used], &mut decoded).expect("decode");
        assert_eq!(consumed, used);
        assert_eq!(produced, input.len());
        assert_eq!(&*decoded, input.as_slice());
    }

    #[test]
    fn bad_selector_nibble_is_rejected() {
        let lanes = W256::LANES;
        let input = vec![1u32; lanes * 4];
        let mut codec = GroupSimple::<W256>::new();
        let input_buf = AlignedVec::<W256>::from_slice(&input);
        let mut encoded = AlignedVec::<W256>::zeroed(input.len() * 2 + 256);
        let used = codec.encode(&input_buf, &mut encoded).expect("encode");

        encoded[3] = 0xFF;

        let mut decoded = AlignedVec::<W256>::zeroed(input.len());
        let err = codec.decode(&encoded[..used], &mut decoded).unwrap_err();
        assert!(matches!(
            err,
            CodecError::CorruptStream(CorruptReason::BadSelector { .. })
        ));
    }

    #[test]
    fn misaligned_length_is_rejected() {
        let mut codec = GroupSimple::<W256>::new();
        let input = [0u32; 3];
        let mut output = [0u32; 32];
        assert!(matches!(
            codec.encode(&input, &mut output),
            Err(CodecError::InvalidLength { .. })
        ));
    }

    #[test]
    fn undersized_output_is_rejected() {
        let lanes = W256::LANES;
        let input = AlignedVec::<W256>::from_slice(&vec![u32::MAX; lanes * 32]);
        let mut codec = GroupSimple::<W256>::new();
        let mut tiny = AlignedVec::<W256>::zeroed(2);
        assert!(matches!(
            codec.encode(&input, &mut tiny),
            Err(CodecError::NotEnoughStorage { .. })
        ));
    }
}
