//! Diagnostic element type for construct/destroy ledger checks.
//!
//! The sort's correctness hinges on every buffer slot being initialized
//! exactly once and destroyed exactly once. Reading a moved-from slot
//! cannot be observed from safe code (that memory is gone), so the sound
//! way to audit the ledger is a census: [`Tracked`] bumps a global counter
//! on every construction and clone and decrements it on drop. A leak leaves
//! the census high, a double drop drives it negative. Tests snapshot
//! [`live`] around a sort and compare.
//!
//! The census is process-global; tests that use it serialize themselves.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicIsize, Ordering};

static LIVE: AtomicIsize = AtomicIsize::new(0);

/// Number of [`Tracked`] instances currently alive.
pub fn live() -> isize {
    LIVE.load(Ordering::SeqCst)
}

/// A heap-owning, non-`Copy` element that participates in the live census.
///
/// The boxed payload means every instance owns an allocation, so the
/// allocator itself provides a second audit: a bitwise relocation must
/// carry the box across without cloning it, and a balanced census implies
/// the allocation count is balanced too.
#[derive(Debug)]
pub struct Tracked {
    value: Box<u64>,
}

impl Tracked {
    pub fn new(value: u64) -> Self {
        LIVE.fetch_add(1, Ordering::SeqCst);
        Self {
            value: Box::new(value),
        }
    }

    pub fn value(&self) -> u64 {
        *self.value
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Tracked::new(*self.value)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        LIVE.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Tracked {}

impl PartialOrd for Tracked {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tracked {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.value.cmp(&other.value)
    }
}
