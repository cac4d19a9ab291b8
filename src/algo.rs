//! The parallel sample-sort drivers and public entry points.
//!
//! Both variants share one skeleton: derive the block/bucket geometry from
//! `n`, extract sorted pivots, sort every block and merge it against the
//! pivots to get a per-block bucket census, transpose the blocks into
//! buckets, and finish each bucket with a sequential sort. They differ in
//! how values travel. [`sort`] and [`sort_by`] clone out of the input into
//! fresh storage and can be stable; [`sort_inplace`] and
//! [`sort_inplace_by`] never copy an element: samples are swapped to the
//! front of the input, pivots are references into that sorted prefix, and
//! everything else moves by destructive relocation through one scratch
//! buffer.
//!
//! The geometry targets roughly `sqrt(n)` blocks and buckets, which is what
//! makes the algorithm cache-oblivious: each block sort touches about
//! `sqrt(n)` elements at a time and the transpose recursion adapts to any
//! two-level memory hierarchy without tuning.

use std::borrow::Borrow;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::assign::{Relocate, UninitCopy};
use crate::mem::{self, relocate_slice, SendPtr, UninitVec};
use crate::seq::{quicksort, seq_sort_inplace, seq_sort_to};
use crate::transpose::transpose_buckets;
use crate::util::{hash64, Count};

/// Inputs shorter than this skip the sampling machinery and go straight to
/// the sequential base sort.
pub const SEQ_SORT_THRESHOLD: usize = 16384;

/// The copying variant draws this many sample candidates per pivot.
const OVER_SAMPLE: usize = 8;

struct Params {
    num_blocks: usize,
    block_size: usize,
    num_buckets: usize,
}

// Larger quotients mean more comparisons per element but less transpose
// overhead; big elements shift the balance toward fewer comparisons.
fn derive_params<T>(n: usize) -> Params {
    let (bucket_quotient, block_quotient) = if size_of::<T>() > 8 { (3, 3) } else { (4, 4) };
    let sqrt = n.isqrt();
    let num_blocks = (sqrt / block_quotient + 1).next_power_of_two();
    let block_size = (n - 1) / num_blocks + 1;
    let num_buckets = sqrt / bucket_quotient + 1;
    Params {
        num_blocks,
        block_size,
        num_buckets,
    }
}

/// Count how many elements of the sorted `block` fall into each bucket
/// delimited by the sorted `pivots`, writing one count per bucket into
/// `counts` (length `pivots.len() + 1`).
///
/// Bucket `j` spans `[pivots[j-1], pivots[j])` and the tail past the last
/// pivot lands in the final bucket. When two adjacent pivots compare equal
/// the walk pins every element equal to them into the bucket right after
/// the first of the pair, so further equal pivots delimit empty buckets.
/// The copying driver relies on that to skip sorting constant-valued
/// buckets.
fn bucket_counts<T, P, C, F>(block: &[T], pivots: &[P], counts: &mut [C], less: &F)
where
    P: Borrow<T>,
    C: Count,
    F: Fn(&T, &T) -> bool,
{
    debug_assert_eq!(counts.len(), pivots.len() + 1);
    debug_assert!(!pivots.is_empty());
    for c in counts.iter_mut() {
        *c = C::ZERO;
    }
    if block.is_empty() {
        return;
    }

    let n = block.len();
    let mut ia = 0;
    let mut ib = 0;
    let mut ic = 0;
    loop {
        while less(&block[ia], pivots[ib].borrow()) {
            counts[ic].inc();
            ia += 1;
            if ia == n {
                return;
            }
        }
        ib += 1;
        ic += 1;
        if ib == pivots.len() {
            break;
        }
        if !less(pivots[ib - 1].borrow(), pivots[ib].borrow()) {
            while !less(pivots[ib].borrow(), &block[ia]) {
                counts[ic].inc();
                ia += 1;
                if ia == n {
                    return;
                }
            }
            ib += 1;
            ic += 1;
            if ib == pivots.len() {
                break;
            }
        }
    }
    counts[ic] = C::from_usize(n - ia);
}

/// Copying driver: sorts `input` into the uninitialized `out`.
fn copying_sample_sort<T, C, F>(input: &[T], out: &mut [MaybeUninit<T>], less: &F, stable: bool)
where
    T: Clone + Send + Sync,
    C: Count,
    F: Fn(&T, &T) -> bool + Sync,
{
    let n = input.len();
    debug_assert_eq!(out.len(), n);

    if n < SEQ_SORT_THRESHOLD {
        // SAFETY: `out` is uninitialized with room for `n`; the copy tag
        // only reads through the source pointer.
        unsafe {
            seq_sort_to::<T, UninitCopy, F>(
                input.as_ptr().cast_mut(),
                out.as_mut_ptr().cast::<T>(),
                n,
                less,
                stable,
            );
        }
        return;
    }

    let Params {
        num_blocks,
        block_size,
        num_buckets,
    } = derive_params::<T>(n);
    let m = num_blocks * num_buckets;

    // Oversampled pivots: clone hash-indexed draws, sort them, keep every
    // eighth. The sample set dies here; only the pivots survive until the
    // per-bucket finish.
    let mut sample: Vec<T> = (0..num_buckets * OVER_SAMPLE)
        .map(|i| input[(hash64(i as u64) as usize) % n].clone())
        .collect();
    quicksort(&mut sample, less);
    let pivots: Vec<T> = (0..num_buckets - 1)
        .map(|i| sample[OVER_SAMPLE * i].clone())
        .collect();
    drop(sample);

    let mut scratch = UninitVec::<T>::new(n);
    let mut counts: Vec<C> = vec![C::ZERO; m + 1];

    // Sort each block into scratch and census it against the pivots. The
    // zipped chunks line every block up with its scratch block and count
    // row, so tasks share nothing. A comparator panic here leaks clones
    // sitting in scratch; the input is untouched either way.
    input
        .par_chunks(block_size)
        .zip(scratch.as_mut_slice().par_chunks_mut(block_size))
        .zip(counts[..m].par_chunks_mut(num_buckets))
        .for_each(|((src, dst), row)| {
            // SAFETY: src and dst are same-length disjoint chunks; dst is
            // uninitialized until the copy tag fills it.
            unsafe {
                seq_sort_to::<T, UninitCopy, F>(
                    src.as_ptr().cast_mut(),
                    dst.as_mut_ptr().cast::<T>(),
                    src.len(),
                    less,
                    stable,
                );
                bucket_counts(mem::assume_init_ref(dst), &pivots, row, less);
            }
        });

    let bucket_offsets = transpose_buckets(
        scratch.as_mut_slice(),
        out,
        &mut counts,
        n,
        block_size,
        num_blocks,
        num_buckets,
    );

    // SAFETY: the transpose initialized every output slot.
    let out = unsafe { mem::assume_init_mut(out) };

    // Finish each bucket sequentially. A bucket pinched between two equal
    // pivots is constant-valued and keeps its (stable) transpose order, so
    // it need not be sorted at all.
    let mut buckets: Vec<(usize, &mut [T])> = Vec::with_capacity(num_buckets);
    let mut rest = out;
    for j in 0..num_buckets {
        let (bucket, tail) = rest.split_at_mut(bucket_offsets[j + 1] - bucket_offsets[j]);
        buckets.push((j, bucket));
        rest = tail;
    }
    buckets.into_par_iter().for_each(|(j, bucket)| {
        if j == 0 || j == num_buckets - 1 || less(&pivots[j - 1], &pivots[j]) {
            seq_sort_inplace(bucket, less, stable);
        }
    });
}

/// Moves flagged blocks back from scratch to the input if a comparator
/// panic unwinds out of the counting phase, so the caller's slice ends as a
/// fully-initialized permutation of its original contents. Defused once the
/// transpose has returned every value to the input.
struct RestoreGuard<'a, T> {
    data: SendPtr<T>,
    scratch: SendPtr<T>,
    block_size: usize,
    n: usize,
    relocated: &'a [AtomicBool],
    armed: bool,
}

impl<T> RestoreGuard<'_, T> {
    fn defuse(mut self) {
        self.armed = false;
    }
}

impl<T> Drop for RestoreGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for (b, flag) in self.relocated.iter().enumerate() {
            if flag.load(Ordering::Acquire) {
                let start = b * self.block_size;
                let len = self.block_size.min(self.n - start);
                // SAFETY: a raised flag means this block's values live
                // fully initialized in scratch (relocation is panic-free
                // and the block sorts keep their range initialized through
                // comparator calls) while the matching input range is
                // uninitialized. All slice borrows are dead by the time an
                // unwind reaches this guard.
                unsafe {
                    ptr::copy_nonoverlapping(
                        self.scratch.get().add(start),
                        self.data.get().add(start),
                        len,
                    );
                }
            }
        }
    }
}

/// In-place driver: no element is ever copied, only swapped or relocated.
fn inplace_sample_sort<T, C, F>(data: &mut [T], less: &F)
where
    T: Send + Sync,
    C: Count,
    F: Fn(&T, &T) -> bool + Sync,
{
    let n = data.len();
    if n < SEQ_SORT_THRESHOLD {
        seq_sort_inplace(data, less, false);
        return;
    }

    let Params {
        num_blocks,
        block_size,
        num_buckets,
    } = derive_params::<T>(n);
    let m = num_blocks * num_buckets;

    // The sample is exactly one block: once sorted, the prefix doubles as
    // block 0, so it is never sorted twice and never moves while the other
    // blocks count against the pivots inside it.
    let sample_size = block_size;
    debug_assert!(sample_size >= num_buckets - 1);
    let stride = sample_size / (num_buckets - 1);

    let data_ptr = SendPtr(data.as_mut_ptr());

    // Prefix of a Fisher-Yates shuffle: swaps samples to the front, no
    // copies made.
    for i in 0..sample_size {
        let j = i + (hash64(i as u64) as usize) % (n - i);
        data.swap(i, j);
    }

    let (sample, rest) = data.split_at_mut(sample_size);
    quicksort(sample, less);
    let pivots: Vec<&T> = (0..num_buckets - 1).map(|i| &sample[stride * i]).collect();

    let mut scratch = UninitVec::<T>::new(n);
    let scratch_ptr = SendPtr(scratch.as_mut_slice().as_mut_ptr().cast::<T>());
    let relocated: Vec<AtomicBool> = (0..num_blocks).map(|_| AtomicBool::new(false)).collect();
    let guard = RestoreGuard {
        data: data_ptr,
        scratch: scratch_ptr,
        block_size,
        n,
        relocated: &relocated,
        armed: true,
    };

    let mut counts: Vec<C> = vec![C::ZERO; m + 1];
    let (scratch_head, scratch_rest) = scratch.as_mut_slice().split_at_mut(sample_size);
    let (counts_head, counts_rest) = counts[..m].split_at_mut(num_buckets);

    // Relocate-sort every block past the prefix into scratch and census it.
    // Each task raises its flag before its (panic-free) bulk relocation so
    // the guard knows where the block's values live; the join barriers make
    // all flag and data writes visible before the guard can possibly run.
    rest.par_chunks_mut(block_size)
        .zip(scratch_rest.par_chunks_mut(block_size))
        .zip(counts_rest.par_chunks_mut(num_buckets))
        .enumerate()
        .for_each(|(b, ((src, dst), row))| {
            relocated[b + 1].store(true, Ordering::Release);
            // SAFETY: src and dst are same-length disjoint chunks; the
            // relocate tag drains src and leaves dst sorted.
            unsafe {
                seq_sort_to::<T, Relocate, F>(
                    src.as_mut_ptr(),
                    dst.as_mut_ptr().cast::<T>(),
                    src.len(),
                    less,
                    false,
                );
                bucket_counts(mem::assume_init_ref(dst), &pivots, row, less);
            }
        });

    // The prefix is block 0 and already sorted: census it while the pivots
    // inside it are still alive, then relocate it over like the rest.
    bucket_counts(sample, &pivots, counts_head, less);
    drop(pivots);
    relocated[0].store(true, Ordering::Release);
    // SAFETY: the pivot borrows just ended, the prefix is initialized, and
    // its scratch image is not; the relocation hands the ledger for these
    // slots to the transpose below.
    relocate_slice(scratch_head, unsafe { mem::as_uninit_mut(sample) });

    // Every value now lives in scratch; the transpose moves all of them
    // back, bucket-grouped, without ever calling the comparator.
    let bucket_offsets = transpose_buckets(
        scratch.as_mut_slice(),
        // SAFETY: all of `data` was relocated out above.
        unsafe { mem::as_uninit_mut(data) },
        &mut counts,
        n,
        block_size,
        num_blocks,
        num_buckets,
    );
    guard.defuse();

    // Finish each bucket. The pivots were merged back in with everything
    // else, so unlike the copying variant there is no constant-bucket skip.
    let mut buckets: Vec<&mut [T]> = Vec::with_capacity(num_buckets);
    let mut rest = &mut data[..];
    for j in 0..num_buckets {
        let (bucket, tail) = rest.split_at_mut(bucket_offsets[j + 1] - bucket_offsets[j]);
        buckets.push(bucket);
        rest = tail;
    }
    buckets
        .into_par_iter()
        .for_each(|bucket| seq_sort_inplace(bucket, less, false));
}

/// Sort a slice into a new vector using the comparator `less`; the input is
/// left unchanged. With `stable` set, elements comparing equal keep their
/// input order, at the cost of routing every base sort through the stable
/// engine.
///
/// # Examples
///
/// ```
/// let data = vec![5, 2, 5, 1, 3];
/// let sorted = samplesort::sort_by(&data, |a, b| a < b, true);
///
/// assert_eq!(sorted, vec![1, 2, 3, 5, 5]);
/// assert_eq!(data, vec![5, 2, 5, 1, 3]);
/// ```
pub fn sort_by<T, F>(input: &[T], less: F, stable: bool) -> Vec<T>
where
    T: Clone + Send + Sync,
    F: Fn(&T, &T) -> bool + Sync,
{
    if size_of::<T>() == 0 {
        return input.to_vec();
    }
    let n = input.len();
    let mut out = UninitVec::<T>::new(n);
    if n < u32::MAX as usize {
        copying_sample_sort::<T, u32, F>(input, out.as_mut_slice(), &less, stable);
    } else {
        copying_sample_sort::<T, u64, F>(input, out.as_mut_slice(), &less, stable);
    }
    // SAFETY: the driver initialized every output slot.
    unsafe { out.into_init() }
}

/// Sort a slice of ordered elements into a new vector. Not stable; use
/// [`sort_by`] with `stable = true` when equal elements must keep their
/// input order.
///
/// # Examples
///
/// ```
/// let sorted = samplesort::sort(&["banana", "apple", "cherry"]);
/// assert_eq!(sorted, vec!["apple", "banana", "cherry"]);
/// ```
pub fn sort<T: Ord + Clone + Send + Sync>(input: &[T]) -> Vec<T> {
    sort_by(input, T::lt, false)
}

/// Sort a mutable slice in place using the comparator `less`. Makes no
/// copies of any element; beyond the relocation scratch buffer only
/// `O(sqrt n)` transient bookkeeping is allocated. Not stable.
///
/// If `less` panics the slice is left as some permutation of its original
/// contents; nothing is lost and nothing is dropped twice.
///
/// # Examples
///
/// ```
/// let mut data = vec![3, 1, 4, 1, 5, 9, 2, 6];
/// samplesort::sort_inplace_by(&mut data, |a, b| a < b);
/// assert_eq!(data, vec![1, 1, 2, 3, 4, 5, 6, 9]);
/// ```
pub fn sort_inplace_by<T, F>(data: &mut [T], less: F)
where
    T: Send + Sync,
    F: Fn(&T, &T) -> bool + Sync,
{
    if size_of::<T>() == 0 {
        return;
    }
    if data.len() < u32::MAX as usize {
        inplace_sample_sort::<T, u32, F>(data, &less);
    } else {
        inplace_sample_sort::<T, u64, F>(data, &less);
    }
}

/// Sort a mutable slice of ordered elements in place. Not stable.
///
/// # Examples
///
/// ```
/// let mut data = vec![3, 1, 4, 1, 5];
/// samplesort::sort_inplace(&mut data);
/// assert_eq!(data, vec![1, 1, 3, 4, 5]);
/// ```
pub fn sort_inplace<T: Ord + Send + Sync>(data: &mut [T]) {
    sort_inplace_by(data, T::lt)
}
