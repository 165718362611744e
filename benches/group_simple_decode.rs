use divan::Bencher;
use rand::SeedableRng;
use rand::prelude::StdRng;
use rand::Rng;
use vpack::{AlignedVec, Codec, GroupSimple, GroupSimpleStrategy, W256};

fn main() {
    divan::main();
}

const GROUP_COUNTS: &[usize] = &[64, 1024, 8192];

fn random_input(group_count: usize, max_bits: u32) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(0);
    let lanes = 8;
    let max = if max_bits >= 32 { u32::MAX } else { (1u32 << max_bits) - 1 };
    (0..lanes * group_count).map(|_| rng.random_range(0..=max)).collect()
}

#[divan::bench(args = GROUP_COUNTS)]
fn decode_wo_ring_buf(bencher: Bencher, group_count: usize) {
    let input = random_input(group_count, 5);
    let input_buf = AlignedVec::<W256>::from_slice(&input);
    let mut codec = GroupSimple::<W256>::with_strategy(GroupSimpleStrategy::WoRingBuf, false);
    let mut encoded = AlignedVec::<W256>::zeroed(input.len() * 2 + 4096);
    let used = codec.encode(&input_buf, &mut encoded).expect("encode");

    bencher
        .with_inputs(|| AlignedVec::<W256>::zeroed(input.len()))
        .bench_values(|mut decoded| {
            codec
                .decode(&encoded[..used], &mut decoded)
                .expect("decode")
        });
}

#[divan::bench(args = GROUP_COUNTS)]
fn decode_w_ring_buf(bencher: Bencher, group_count: usize) {
    let input = random_input(group_count, 5);
    let input_buf = AlignedVec::<W256>::from_slice(&input);
    let mut codec = GroupSimple::<W256>::with_strategy(GroupSimpleStrategy::WRingBuf, false);
    let mut encoded = AlignedVec::<W256>::zeroed(input.len() * 2 + 4096);
    let used = codec.encode(&input_buf, &mut encoded).expect("encode");

    bencher
        .with_inputs(|| AlignedVec::<W256>::zeroed(input.len()))
        .bench_values(|mut decoded| {
            codec
                .decode(&encoded[..used], &mut decoded)
                .expect("decode")
        });
}
