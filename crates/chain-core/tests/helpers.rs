#![allow(dead_code)]

use std::sync::Arc;

use chain_core::{Chain, ManualClock};
use rand::{distributions::Alphanumeric, rngs::StdRng, Rng};

pub const START_SECS: u64 = 1_600_000_000;

pub fn manual_chain() -> (Arc<ManualClock>, Chain<Arc<ManualClock>>) {
    let clock = Arc::new(ManualClock::new(START_SECS));
    let chain = Chain::with_clock(Arc::clone(&clock));
    (clock, chain)
}

pub fn random_payload(rng: &mut StdRng) -> String {
    let len = rng.gen_range(1..48);
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Chain with `extra` blocks after genesis, one second apart.
pub fn build_chain(rng: &mut StdRng, extra: usize) -> Chain<Arc<ManualClock>> {
    let (clock, mut chain) = manual_chain();
    for _ in 0..extra {
        clock.advance(1);
        chain
            .create_block(random_payload(rng))
            .expect("create_block on own tail");
    }
    chain
}

/// Replace one character of `s` with a different alphanumeric character.
pub fn flip_one_char(rng: &mut StdRng, s: &str) -> String {
    let mut chars: Vec<char> = s.chars().collect();
    let pos = rng.gen_range(0..chars.len());
    let replacement = if chars[pos] == 'a' { 'b' } else { 'a' };
    chars[pos] = replacement;
    chars.into_iter().collect()
}
