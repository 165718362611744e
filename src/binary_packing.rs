//! BinaryPacking(W): fixed-width mini-block packing (§4.2).

use std::marker::PhantomData;

use itertools::Itertools;
use log::trace;

use crate::codec::Codec;
use crate::error::{CodecError, CodecResult, CorruptReason};
use crate::framing::{check_alignment, cookie_words, COOKIE};
use crate::kernel::{self, MINI_BLOCK_ROWS};
use crate::width::Width;

/// Fixed-width packing over mini-blocks of `W::LANES * 32` integers, grouped
/// into blocks of `W::LANES * 4` mini-blocks (`HowManyMiniBlocks` in the
/// original naming, equal to `sizeof(vector_type)` in bytes).
#[derive(Debug, Default)]
pub struct BinaryPacking<W: Width> {
    _width: PhantomData<W>,
}

impl<W: Width> BinaryPacking<W> {
    /// Creates a new codec instance. `BinaryPacking` holds no scratch state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of integers in one mini-block.
    #[must_use]
    pub fn mini_block_size() -> usize {
        MINI_BLOCK_ROWS * W::LANES
    }

    /// Number of mini-blocks per block (`HowManyMiniBlocks`, i.e.
    /// `sizeof(vector_type)` in the original: 32 bytes for a 256-bit vector).
    #[must_use]
    pub fn how_many_mini_blocks() -> usize {
        W::LANES * 4
    }

    fn codec_name() -> &'static str {
        match W::BITS {
            128 => "binarypacking128",
            256 => "binarypacking256",
            512 => "binarypacking512",
            _ => unreachable!("Width is sealed to 128/256/512"),
        }
    }
}

impl<W: Width> Codec for BinaryPacking<W> {
    fn name(&self) -> &'static str {
        Self::codec_name()
    }

    fn block_size(&self) -> usize {
        Self::mini_block_size()
    }

    fn encode(&mut self, input: &[u32], output: &mut [u32]) -> CodecResult<usize> {
        let mb_size = Self::mini_block_size();
        if input.len() % mb_size != 0 {
            return Err(CodecError::InvalidLength {
                len: input.len(),
                block_size: mb_size,
            });
        }
        check_alignment::<W>("input", input)?;
        check_alignment::<W>("output", output)?;

        let lanes = W::LANES;
        let hmb = Self::how_many_mini_blocks();
        let header_words_per_block = hmb / 4;
        let num_mini_blocks = input.len() / mb_size;

        let widths: Vec<u32> = (0..num_mini_blocks)
            .map(|i| {
                let b = kernel::max_bits(&input[i * mb_size..(i + 1) * mb_size]);
                trace!("{}: mini-block {i} width={b}", Self::codec_name());
                b
            })
            .collect();

        let cookies = cookie_words(lanes, 1);
        let mut needed = 1 + cookies;
        let mut mb_idx = 0;
        while mb_idx < num_mini_blocks {
            let take = hmb.min(num_mini_blocks - mb_idx);
            needed += header_words_per_block;
            needed += widths[mb_idx..mb_idx + take]
                .iter()
                .map(|&b| b as usize * lanes)
                .sum::<usize>();
            mb_idx += take;
        }

        if output.len() < needed {
            return Err(CodecError::NotEnoughStorage {
                available: output.len(),
                needed,
            });
        }

        let mut pos = 0;
        #[allow(clippy::cast_possible_truncation)]
        let len_word = input.len() as u32;
        output[pos] = len_word;
        pos += 1;
        for _ in 0..cookies {
            output[pos] = COOKIE;
            pos += 1;
        }

        let mut mb_idx = 0;
        while mb_idx < num_mini_blocks {
            let take = hmb.min(num_mini_blocks - mb_idx);

            let block_width_chunks = widths[mb_idx..mb_idx + take]
                .iter()
                .copied()
                .chain(std::iter::repeat(0u32))
                .take(header_words_per_block * 4)
                .chunks(4);
            for chunk in &block_width_chunks {
                let mut word = 0u32;
                for (j, w) in chunk.enumerate() {
                    word |= w << (8 * (3 - j));
                }
                output[pos] = word;
                pos += 1;
            }

            for k in 0..take {
                let b = widths[mb_idx + k];
                let src = &input[(mb_idx + k) * mb_size..(mb_idx + k + 1) * mb_size];
                let n = b as usize * lanes;
                kernel::pack_masked::<W>(b, src, &mut output[pos..pos + n])?;
                pos += n;
            }

            mb_idx += take;
        }

        Ok(pos)
    }

    fn decode(&mut self, input: &[u32], output: &mut [u32]) -> CodecResult<(usize, usize)> {
        check_alignment::<W>("input", input)?;
        check_alignment::<W>("output", output)?;

        let lanes = W::LANES;
        let cookies = cookie_words(lanes, 1);
        if input.len() < 1 + cookies {
            return Err(CodecError::InvalidLength {
                len: input.len(),
                block_size: 1 + cookies,
            });
        }

        let decoded_len = input[0] as usize;
        if output.len() < decoded_len {
            return Err(CodecError::NotEnoughStorage {
                available: output.len(),
                needed: decoded_len,
            });
        }

        let mut pos = 1;
        for _ in 0..cookies {
            if input[pos] != COOKIE {
                return Err(CodecError::CorruptStream(CorruptReason::BadCookie {
                    found: input[pos],
                }));
            }
            pos += 1;
        }

        let mb_size = Self::mini_block_size();
        let hmb = Self::how_many_mini_blocks();
        let header_words_per_block = hmb / 4;
        let num_mini_blocks = decoded_len / mb_size;

        let mut mb_idx = 0;
        let mut out_pos = 0;
        while mb_idx < num_mini_blocks {
            let take = hmb.min(num_mini_blocks - mb_idx);
            let mut widths = vec![0u32; take];

            for h in 0..header_words_per_block {
                let word = input.get(pos).copied().ok_or(CodecError::InvalidLength {
                    len: input.len(),
                    block_size: pos + 1,
                })?;
                pos += 1;
                for j in 0..4usize {
                    let slot = h * 4 + j;
                    if slot < take {
                        let w = (word >> (8 * (3 - j))) & 0xFF;
                        if w > 32 {
                            #[allow(clippy::cast_possible_truncation)]
                            let width = w as u8;
                            return Err(CodecError::CorruptStream(CorruptReason::BadBitWidth {
                                width,
                            }));
                        }
                        widths[slot] = w;
                    }
                }
            }

            for k in 0..take {
                let b = widths[k];
                let n = b as usize * lanes;
                let chunk = input.get(pos..pos + n).ok_or(CodecError::InvalidLength {
                    len: input.len(),
                    block_size: pos + n,
                })?;
                kernel::unpack::<W>(b, chunk, &mut output[out_pos..out_pos + mb_size])?;
                pos += n;
                out_pos += mb_size;
            }

            mb_idx += take;
        }

        Ok((pos, out_pos))
    }
}
