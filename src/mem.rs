//! Uninitialized storage and destructive relocation.
//!
//! Every buffer slot the sort touches is in exactly one of two states:
//! *initialized* (holds a value that will be dropped exactly once) or
//! *uninitialized* (contents indeterminate, never read). The algorithms in
//! this crate drive that ledger by hand; the types here only make the two
//! states representable without paying for default construction.
//!
//! Relocation is the bitwise flavor of a move: after `relocate(dst, src)`
//! the destination owns the value and the source slot is uninitialized. In
//! Rust every move is already a bitwise copy whose source must not be
//! dropped again, so relocation is a plain `copy_nonoverlapping` for all
//! types, `Drop` impls included; there is no slower constructor-based path
//! to fall back to.

use std::mem::{ManuallyDrop, MaybeUninit};
use std::ptr;
use std::slice;

use rayon::prelude::*;

/// Byte budget per relocation task. Large enough to amortize scheduling,
/// small enough that the copies overlap across workers.
const RELOCATE_CHUNK_BYTES: usize = 8 * 1024;

/// An owning buffer of `n` slots that starts life uninitialized.
///
/// Dropping an `UninitVec` frees the allocation and nothing else: no element
/// destructor runs. Whoever initializes a slot is responsible for relocating
/// the value out again (or for converting the whole buffer with
/// [`into_init`](UninitVec::into_init) once every slot is initialized).
pub struct UninitVec<T> {
    data: Vec<MaybeUninit<T>>,
}

impl<T> UninitVec<T> {
    pub fn new(n: usize) -> Self {
        let mut data = Vec::with_capacity(n);
        // SAFETY: `MaybeUninit<T>` is valid in any byte state, so the
        // reserved capacity can be exposed as length without writes.
        unsafe { data.set_len(n) };
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_mut_slice(&mut self) -> &mut [MaybeUninit<T>] {
        &mut self.data
    }

    /// Convert into an ordinary `Vec<T>`.
    ///
    /// # Safety
    ///
    /// Every slot must be initialized.
    pub unsafe fn into_init(self) -> Vec<T> {
        let mut data = ManuallyDrop::new(self.data);
        // SAFETY: same allocation, same length/capacity; `MaybeUninit<T>`
        // has the layout of `T` and the caller vouches for initialization.
        unsafe { Vec::from_raw_parts(data.as_mut_ptr().cast::<T>(), data.len(), data.capacity()) }
    }
}

/// Destructively move one value from `src` to `dst`.
///
/// # Safety
///
/// `src` must be initialized and `dst` uninitialized (and distinct from
/// `src`). Afterwards the states are swapped: `dst` owns the value and `src`
/// must be treated as uninitialized; in particular it must not be dropped.
#[inline(always)]
pub unsafe fn relocate<T>(dst: *mut T, src: *const T) {
    unsafe { ptr::copy_nonoverlapping(src, dst, 1) }
}

/// Destructively move `src` into `dst`, slot for slot, in parallel.
///
/// Both slices are spelled `MaybeUninit` because the two sides trade states:
/// on entry every `src` slot is initialized and every `dst` slot is not, on
/// return it is the other way around. The copy runs in chunks of roughly
/// [`RELOCATE_CHUNK_BYTES`] so large arrays spread across the pool.
pub fn relocate_slice<T: Send>(dst: &mut [MaybeUninit<T>], src: &mut [MaybeUninit<T>]) {
    assert_eq!(dst.len(), src.len());
    let chunk = (RELOCATE_CHUNK_BYTES / size_of::<T>().max(1)).max(1);
    if src.len() <= chunk {
        // SAFETY: equal lengths checked above; the borrows guarantee the
        // regions are disjoint.
        unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst.as_mut_ptr(), src.len()) };
    } else {
        dst.par_chunks_mut(chunk)
            .zip(src.par_chunks_mut(chunk))
            .for_each(|(d, s)| {
                // SAFETY: zipped chunks have equal lengths and are disjoint.
                unsafe { ptr::copy_nonoverlapping(s.as_ptr(), d.as_mut_ptr(), s.len()) };
            });
    }
}

/// View an initialized slice as relocation source material.
///
/// # Safety
///
/// The caller takes over the initialization ledger for `s`: any slot a
/// callee relocates out of must not be read or dropped through the original
/// `&mut [T]` until it has been re-initialized.
#[inline]
pub(crate) unsafe fn as_uninit_mut<T>(s: &mut [T]) -> &mut [MaybeUninit<T>] {
    unsafe { slice::from_raw_parts_mut(s.as_mut_ptr().cast::<MaybeUninit<T>>(), s.len()) }
}

/// # Safety
///
/// Every slot of `s` must be initialized.
#[inline]
pub(crate) unsafe fn assume_init_ref<T>(s: &[MaybeUninit<T>]) -> &[T] {
    unsafe { slice::from_raw_parts(s.as_ptr().cast::<T>(), s.len()) }
}

/// # Safety
///
/// Every slot of `s` must be initialized.
#[inline]
pub(crate) unsafe fn assume_init_mut<T>(s: &mut [MaybeUninit<T>]) -> &mut [T] {
    unsafe { slice::from_raw_parts_mut(s.as_mut_ptr().cast::<T>(), s.len()) }
}

/// A raw pointer that may cross task boundaries.
///
/// Raw pointers are `!Send`/`!Sync` as a lint, not for soundness; the
/// transpose phases hand disjoint destination ranges to concurrent tasks
/// through one of these. Dereferencing still requires `unsafe`, and every
/// use site documents the disjointness argument.
pub(crate) struct SendPtr<T>(pub *mut T);

// SAFETY: sending the pointer is harmless in itself; all dereferences are
// guarded by the range-disjointness arguments at the use sites.
unsafe impl<T: Send> Send for SendPtr<T> {}
unsafe impl<T: Send> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    // Helper to avoid disjoint captures of the field in closures.
    pub(crate) fn get(self) -> *mut T {
        self.0
    }
}

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}
