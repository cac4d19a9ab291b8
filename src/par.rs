//! Fork-join scheduling primitives, backed by rayon's work-stealing pool.
//!
//! The sort never spawns threads of its own and never blocks: control only
//! yields at the join barriers these two functions provide. Writes made by
//! tasks before a barrier are visible to every task after it, which is the
//! only ordering the sorting phases rely on.

/// Run two closures, potentially in parallel, and return both results.
///
/// Barrier semantics: returns only once both closures have finished, even if
/// one of them panics (the panic is then propagated).
#[inline]
pub fn fork2<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    rayon::join(a, b)
}

/// Invoke `body(i)` for every `i` in `lo..hi`, in no particular order, with
/// at least `grain` consecutive indices handled by each task.
///
/// Implemented by recursive range halving over [`fork2`], so the depth is
/// logarithmic and the work granularity hint bounds scheduling overhead.
pub fn parallel_for<F>(lo: usize, hi: usize, grain: usize, body: F)
where
    F: Fn(usize) + Sync,
{
    if lo < hi {
        parallel_for_rec(lo, hi, grain.max(1), &body);
    }
}

fn parallel_for_rec<F>(lo: usize, hi: usize, grain: usize, body: &F)
where
    F: Fn(usize) + Sync,
{
    if hi - lo <= grain {
        for i in lo..hi {
            body(i);
        }
    } else {
        let mid = lo + (hi - lo) / 2;
        fork2(
            || parallel_for_rec(lo, mid, grain, body),
            || parallel_for_rec(mid, hi, grain, body),
        );
    }
}
