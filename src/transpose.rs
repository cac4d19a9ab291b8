//! Blocked transpose: relocate data laid out as blocks-of-buckets into
//! buckets-of-blocks.
//!
//! After the counting phase, scratch holds `num_blocks` sorted blocks, each
//! partitioned into `num_buckets` sub-runs of uneven length, described by a
//! row-major `num_blocks x num_buckets` count matrix. The transpose moves
//! every sub-run to the destination region of its bucket, writing the runs
//! of each bucket in block order so the rearrangement preserves whatever
//! order the blocks were produced in.
//!
//! Two strategies, picked by problem shape: a flat parallel loop over blocks
//! for modest sizes, and a cache-oblivious recursive divide over the
//! `num_blocks x num_buckets` grid when both dimensions are large, so the
//! count matrix and both data buffers are walked with bounded cache
//! footprint no matter the cache hierarchy.

use std::mem::MaybeUninit;
use std::ptr;

use crate::mem::SendPtr;
use crate::par::{fork2, parallel_for};
use crate::util::{scan_inplace, Count};

// Leaf sizes for the recursive divides; the data-moving leaf is coarser
// because each grid cell relocates a whole sub-run.
const TRANSPOSE_GRAIN: usize = 500;
const BLOCK_TRANSPOSE_GRAIN: usize = TRANSPOSE_GRAIN * 16;

/// Cache-oblivious transpose of the count matrix: `dst[j][i] = src[i][j]`
/// with `src` in block-major order (`rows x cols`) and `dst` bucket-major.
struct MatrixTranspose<C> {
    src: SendPtr<C>,
    dst: SendPtr<C>,
    rows: usize,
    cols: usize,
}

impl<C: Count> MatrixTranspose<C> {
    fn run(&self) {
        self.split(0, self.rows, 0, self.cols);
    }

    fn split(&self, r_start: usize, r_count: usize, c_start: usize, c_count: usize) {
        if r_count * c_count < TRANSPOSE_GRAIN {
            for i in r_start..r_start + r_count {
                for j in c_start..c_start + c_count {
                    // SAFETY: (i, j) is inside the grid and every cell is
                    // written by exactly one leaf.
                    unsafe {
                        *self.dst.get().add(j * self.rows + i) =
                            *self.src.get().add(i * self.cols + j);
                    }
                }
            }
        } else if c_count > r_count {
            let half = c_count / 2;
            fork2(
                || self.split(r_start, r_count, c_start, half),
                || self.split(r_start, r_count, c_start + half, c_count - half),
            );
        } else {
            let half = r_count / 2;
            fork2(
                || self.split(r_start, half, c_start, c_count),
                || self.split(r_start + half, r_count - half, c_start, c_count),
            );
        }
    }
}

/// Cache-oblivious relocation of the sub-runs themselves. `src_offsets` is
/// the row-major scanned count matrix (global source offset of each run,
/// with a sentinel `n` at the end); `dst_offsets` is the bucket-major
/// scanned transpose (global destination offset of each run).
struct BlockTranspose<T, C> {
    from: SendPtr<T>,
    to: SendPtr<T>,
    src_offsets: SendPtr<C>,
    dst_offsets: SendPtr<C>,
    rows: usize,
    cols: usize,
}

impl<T: Send, C: Count> BlockTranspose<T, C> {
    fn run(&self) {
        self.split(0, self.rows, 0, self.cols);
    }

    fn split(&self, r_start: usize, r_count: usize, c_start: usize, c_count: usize) {
        if r_count * c_count < BLOCK_TRANSPOSE_GRAIN {
            parallel_for(r_start, r_start + r_count, 1, |i| {
                for j in c_start..c_start + c_count {
                    // SAFETY: runs of distinct (block, bucket) cells occupy
                    // disjoint source and destination ranges, so concurrent
                    // leaves never overlap.
                    unsafe {
                        let cell = self.src_offsets.get().add(i * self.cols + j);
                        let sa = (*cell).as_usize();
                        let len = (*cell.add(1)).as_usize() - sa;
                        let sb = (*self.dst_offsets.get().add(j * self.rows + i)).as_usize();
                        ptr::copy_nonoverlapping(self.from.get().add(sa), self.to.get().add(sb), len);
                    }
                }
            });
        } else if c_count > r_count {
            let half = c_count / 2;
            fork2(
                || self.split(r_start, r_count, c_start, half),
                || self.split(r_start, r_count, c_start + half, c_count - half),
            );
        } else {
            let half = r_count / 2;
            fork2(
                || self.split(r_start, half, c_start, c_count),
                || self.split(r_start + half, r_count - half, c_start, c_count),
            );
        }
    }
}

/// Relocate every value in `from` (block-major, runs described by `counts`)
/// into `to` grouped by bucket, and return the bucket offsets, padded with
/// `n` at the end.
///
/// `counts` must hold `num_blocks * num_buckets` entries plus one sentinel
/// slot; the matrix is consumed (the cache-oblivious path scans it in
/// place). On return every `from` slot is uninitialized and every `to` slot
/// is initialized.
pub fn transpose_buckets<T: Send, C: Count>(
    from: &mut [MaybeUninit<T>],
    to: &mut [MaybeUninit<T>],
    counts: &mut [C],
    n: usize,
    block_size: usize,
    num_blocks: usize,
    num_buckets: usize,
) -> Vec<usize> {
    let m = num_blocks * num_buckets;
    debug_assert_eq!(counts.len(), m + 1);
    debug_assert!(num_blocks.is_power_of_two());

    let from = SendPtr(from.as_mut_ptr().cast::<T>());
    let to = SendPtr(to.as_mut_ptr().cast::<T>());

    let dest_offsets = if n < (1 << 22) || num_buckets <= 512 || num_blocks <= 512 {
        // Flat version: gather the counts in bucket-major order, scan, and
        // let each block walk its own runs.
        let block_bits = num_blocks.trailing_zeros() as usize;
        let block_mask = num_blocks - 1;
        let mut dest_offsets: Vec<C> = (0..m)
            .map(|i| counts[(i >> block_bits) + num_buckets * (i & block_mask)])
            .collect();
        let total = scan_inplace(&mut dest_offsets);
        debug_assert_eq!(total, n);

        let counts = &counts[..];
        let dest = &dest_offsets[..];
        parallel_for(0, num_blocks, 1, |b| {
            let mut src = b * block_size;
            for j in 0..num_buckets {
                let dst = dest[b + num_blocks * j].as_usize();
                let len = counts[b * num_buckets + j].as_usize();
                // SAFETY: each (block, bucket) run owns disjoint source and
                // destination ranges; offsets come from the scans above.
                unsafe { ptr::copy_nonoverlapping(from.get().add(src), to.get().add(dst), len) };
                src += len;
            }
        });
        dest_offsets
    } else {
        // Cache-oblivious version: transpose the count matrix, scan both
        // orientations to get source and destination offsets, then divide
        // over the grid.
        let mut dest_offsets: Vec<C> = vec![C::ZERO; m];
        MatrixTranspose {
            src: SendPtr(counts.as_mut_ptr()),
            dst: SendPtr(dest_offsets.as_mut_ptr()),
            rows: num_blocks,
            cols: num_buckets,
        }
        .run();

        let total_dst = scan_inplace(&mut dest_offsets);
        let total_src = scan_inplace(&mut counts[..m]);
        debug_assert_eq!(total_dst, n);
        debug_assert_eq!(total_src, n);
        counts[m] = C::from_usize(n);

        BlockTranspose {
            from,
            to,
            src_offsets: SendPtr(counts.as_mut_ptr()),
            dst_offsets: SendPtr(dest_offsets.as_mut_ptr()),
            rows: num_blocks,
            cols: num_buckets,
        }
        .run();
        dest_offsets
    };

    let mut bucket_offsets = Vec::with_capacity(num_buckets + 1);
    for j in 0..num_buckets {
        bucket_offsets.push(dest_offsets[j * num_blocks].as_usize());
    }
    bucket_offsets.push(n);
    bucket_offsets
}
