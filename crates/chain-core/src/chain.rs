use crate::clock::{Clock, SystemClock};
use crate::constants::{
    GENESIS_HASH, GENESIS_INDEX, GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP,
};
use crate::{Block, ChainError, Result};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// The fixed first block. Its hash is a seed value and does not match
/// `compute_hash` over its fields.
pub fn genesis_block() -> Block {
    Block::from_parts(
        GENESIS_INDEX,
        GENESIS_HASH,
        GENESIS_PREVIOUS_HASH,
        GENESIS_PAYLOAD,
        GENESIS_TIMESTAMP,
    )
}

/// Check `candidate` as the successor of `previous`. Stops at the first
/// failing stage: structure, index, previous hash, then stored hash.
pub fn validate(candidate: &Block, previous: &Block) -> Result<()> {
    if !candidate.validate_structure() {
        return Err(ChainError::StructuralMismatch {
            reason: format!("block {} is malformed", candidate.index()),
        });
    }

    let expected_index = previous.index().checked_add(1);
    if expected_index != Some(candidate.index()) {
        return Err(ChainError::LinkageMismatch {
            field: "index",
            expected: expected_index.map_or_else(|| "none".to_string(), |i| i.to_string()),
            found: candidate.index().to_string(),
        });
    }

    if previous.hash() != candidate.previous_hash() {
        return Err(ChainError::LinkageMismatch {
            field: "previous_hash",
            expected: previous.hash().to_string(),
            found: candidate.previous_hash().to_string(),
        });
    }

    let recomputed = candidate.recompute_hash();
    if recomputed != candidate.hash() {
        return Err(ChainError::HashMismatch {
            expected: recomputed,
            found: candidate.hash().to_string(),
        });
    }

    Ok(())
}

pub fn is_valid(candidate: &Block, previous: &Block) -> bool {
    validate(candidate, previous).is_ok()
}

/// Check a whole block sequence: genesis first, then every adjacent pair.
pub fn verify_blocks(blocks: &[Block]) -> Result<()> {
    let first = blocks.first().ok_or(ChainError::EmptyChain)?;
    if *first != genesis_block() {
        return Err(ChainError::GenesisMismatch);
    }
    for pair in blocks.windows(2) {
        validate(&pair[1], &pair[0])?;
    }
    Ok(())
}

/// In-memory, append-only chain seeded with the genesis block.
#[derive(Debug)]
pub struct Chain<C: Clock = SystemClock> {
    blocks: Vec<Block>,
    clock: C,
}

impl Chain<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self> {
        Self::from_blocks_with_clock(blocks, SystemClock)
    }
}

impl Default for Chain<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Chain<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            blocks: vec![genesis_block()],
            clock,
        }
    }

    /// Rebuild a chain from an exported block list. The first block must be
    /// the genesis seed; every later block goes through `append`.
    pub fn from_blocks_with_clock(blocks: Vec<Block>, clock: C) -> Result<Self> {
        let mut iter = blocks.into_iter();
        match iter.next() {
            Some(first) if first == genesis_block() => {}
            Some(_) => return Err(ChainError::GenesisMismatch),
            None => return Err(ChainError::EmptyChain),
        }
        let mut chain = Self::with_clock(clock);
        for block in iter {
            chain.append(block)?;
        }
        info!(len = chain.len(), "chain imported");
        Ok(chain)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn latest(&self) -> Result<&Block> {
        self.blocks.last().ok_or(ChainError::EmptyChain)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Mint the successor of the current tail and append it.
    pub fn create_block(&mut self, payload: impl Into<String>) -> Result<Block> {
        let previous = self.latest()?;
        let index = previous
            .index()
            .checked_add(1)
            .ok_or_else(|| ChainError::LinkageMismatch {
                field: "index",
                expected: "none".to_string(),
                found: format!("{}+1", previous.index()),
            })?;
        let timestamp = self.clock.now_secs();
        let candidate = Block::seal(index, previous.hash(), timestamp, payload);
        self.append(candidate).cloned()
    }

    /// Validate `candidate` against the tail and push it. On rejection the
    /// chain is left untouched.
    pub fn append(&mut self, candidate: Block) -> Result<&Block> {
        let previous = self.latest()?;
        if let Err(err) = validate(&candidate, previous) {
            warn!(index = candidate.index(), %err, "rejected candidate block");
            return Err(err);
        }
        debug!(
            index = candidate.index(),
            hash = candidate.hash(),
            "appended block"
        );
        self.blocks.push(candidate);
        self.latest()
    }

    /// Append a block given as untyped JSON.
    pub fn append_value(&mut self, value: &Value) -> Result<&Block> {
        let candidate = Block::from_value(value)?;
        self.append(candidate)
    }

    pub fn verify(&self) -> Result<()> {
        verify_blocks(&self.blocks)
    }
}

impl<'a, C: Clock> IntoIterator for &'a Chain<C> {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Handle for appending from several threads. Every call holds the lock for
/// the whole read-tail, validate, push sequence.
pub struct SharedChain<C: Clock = SystemClock> {
    inner: Arc<Mutex<Chain<C>>>,
}

impl<C: Clock> Clone for SharedChain<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock> From<Chain<C>> for SharedChain<C> {
    fn from(chain: Chain<C>) -> Self {
        Self::new(chain)
    }
}

impl<C: Clock> SharedChain<C> {
    pub fn new(chain: Chain<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(chain)),
        }
    }

    // A panic while locked cannot leave a partial append behind.
    fn lock(&self) -> MutexGuard<'_, Chain<C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_block(&self, payload: impl Into<String>) -> Result<Block> {
        self.lock().create_block(payload)
    }

    pub fn append(&self, candidate: Block) -> Result<Block> {
        self.lock().append(candidate).cloned()
    }

    pub fn latest(&self) -> Result<Block> {
        self.lock().latest().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Block> {
        self.lock().blocks().to_vec()
    }

    pub fn verify(&self) -> Result<()> {
        self.lock().verify()
    }
}
