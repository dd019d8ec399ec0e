//! Proof-of-work sealing
//!
//! A [`Sealer`] takes an unsealed block and searches for a nonce whose digest
//! carries the difficulty prefix. The search works on a block it owns; the
//! chain only sees the result once sealing has succeeded.

use crate::blockchain::{Block, Difficulty};
use crate::error::ChainError;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How many attempts the sequential search makes between limit checks.
const CHECK_INTERVAL: u64 = 4096;

pub const DEFAULT_BATCH_SIZE: u64 = 10_000;

pub trait Sealer: Send + Sync + fmt::Debug {
    /// Search for a nonce above `block.nonce` whose digest meets `difficulty`.
    fn seal(&self, block: Block, difficulty: Difficulty) -> Result<Block, ChainError>;
}

/// Shared flag used to stop a running nonce search from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Optional bounds on a nonce search.
#[derive(Debug, Clone, Default)]
pub struct SealLimits {
    pub cancel: Option<CancelToken>,
    pub timeout: Option<Duration>,
}

impl SealLimits {
    fn exceeded(&self, started: Instant) -> bool {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return true;
        }
        self.timeout.is_some_and(|timeout| started.elapsed() >= timeout)
    }
}

fn finish(mut block: Block, nonce: u64, digest: String, started: Instant, attempts: u64) -> Block {
    block.nonce = nonce;
    block.digest = digest;
    block.seal_duration = started.elapsed();
    debug!(
        "Block #{} sealed with nonce {} after {} attempts ({:.3}s)",
        block.index,
        nonce,
        attempts,
        block.seal_duration.as_secs_f64()
    );
    block
}

fn abort(index: u64, attempts: u64) -> ChainError {
    warn!("Sealing of block #{} stopped after {} attempts", index, attempts);
    ChainError::SealAborted { index, attempts }
}

/// Single-threaded search, trying nonces in increasing order.
#[derive(Debug, Clone, Default)]
pub struct SequentialSealer {
    limits: SealLimits,
}

impl SequentialSealer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.limits.cancel = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.limits.timeout = Some(timeout);
        self
    }
}

impl Sealer for SequentialSealer {
    fn seal(&self, block: Block, difficulty: Difficulty) -> Result<Block, ChainError> {
        let started = Instant::now();
        let hasher = block.hasher();
        let mut nonce = block.nonce;
        let mut attempts: u64 = 0;

        loop {
            nonce = nonce.wrapping_add(1);
            attempts += 1;
            let digest = hasher.digest_with_nonce(nonce);
            if difficulty.is_met_by(&digest) {
                return Ok(finish(block, nonce, digest, started, attempts));
            }
            if attempts % CHECK_INTERVAL == 0 && self.limits.exceeded(started) {
                return Err(abort(block.index, attempts));
            }
        }
    }
}

/// Multi-threaded search on a dedicated rayon pool.
///
/// The nonce space above the starting nonce is walked in rounds of
/// `threads * batch_size` nonces; each round is split across the pool and the
/// first hit found by any worker wins. The winning nonce is valid but not
/// necessarily the smallest one.
#[derive(Debug, Clone)]
pub struct ParallelSealer {
    pool: Arc<ThreadPool>,
    batch_size: u64,
    limits: SealLimits,
}

impl ParallelSealer {
    pub fn new(threads: usize) -> Result<Self, ChainError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("linkchain-sealer-{}", i))
            .build()
            .map_err(|e| ChainError::ThreadPool(e.to_string()))?;
        Ok(Self {
            pool: Arc::new(pool),
            batch_size: DEFAULT_BATCH_SIZE,
            limits: SealLimits::default(),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.limits.cancel = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.limits.timeout = Some(timeout);
        self
    }
}

impl Sealer for ParallelSealer {
    fn seal(&self, block: Block, difficulty: Difficulty) -> Result<Block, ChainError> {
        let started = Instant::now();
        let hasher = block.hasher();
        let round = self.batch_size.saturating_mul(self.threads() as u64);
        let mut start = block.nonce.saturating_add(1);
        let mut attempts: u64 = 0;

        loop {
            let end = start.saturating_add(round);
            let found = self.pool.install(|| {
                (start..end).into_par_iter().find_map_any(|nonce| {
                    let digest = hasher.digest_with_nonce(nonce);
                    difficulty.is_met_by(&digest).then_some((nonce, digest))
                })
            });
            attempts += end - start;

            if let Some((nonce, digest)) = found {
                return Ok(finish(block, nonce, digest, started, attempts));
            }
            if self.limits.exceeded(started) || end == u64::MAX {
                return Err(abort(block.index, attempts));
            }
            start = end;
        }
    }
}
