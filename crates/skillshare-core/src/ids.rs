//! Id generation for plans and their subtrees.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::error::{Error, Result};

/// Source of identifiers for newly created or cloned nodes.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> Uuid;
}

/// Random v4 UUIDs. The production generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic ids `start, start + 1, ...` encoded as UUIDs.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIds {
    fn new_id(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::Relaxed)))
    }
}

/// Draws ids from a generator, skipping any id that is reserved or was
/// already handed out.
pub struct FreshIds<'a> {
    generator: &'a dyn IdGenerator,
    taken: HashSet<Uuid>,
}

impl<'a> FreshIds<'a> {
    /// Upper bound on consecutive rejected ids before giving up.
    pub const MAX_ATTEMPTS: usize = 64;

    pub fn new(generator: &'a dyn IdGenerator) -> Self {
        Self::reserving(generator, [])
    }

    /// Never hand out any id in `reserved`.
    pub fn reserving(generator: &'a dyn IdGenerator, reserved: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            generator,
            taken: reserved.into_iter().collect(),
        }
    }

    pub fn next_id(&mut self) -> Result<Uuid> {
        for _ in 0..Self::MAX_ATTEMPTS {
            let id = self.generator.new_id();
            if self.taken.insert(id) {
                return Ok(id);
            }
        }
        Err(Error::IdExhausted(Self::MAX_ATTEMPTS))
    }
}
