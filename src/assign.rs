//! Tag-dispatched assignment between slots of known initialization state.
//!
//! The sorting routines are written once and stay agnostic to whether they
//! are fed by the copying flow (input is preserved, values are cloned into
//! fresh storage) or the in-place flow (values are relocated out of the
//! input). The caller picks the tag matching the initialization states of
//! its two buffers; everything else monomorphizes away.
//!
//! State table (`dst`/`src` before → after):
//!
//! | Tag            | dst before | src before | dst after | src after |
//! |----------------|------------|------------|-----------|-----------|
//! | [`MoveAssign`]  | init       | init       | init      | uninit    |
//! | [`CopyAssign`]  | init       | init       | init      | init      |
//! | [`UninitMove`]  | uninit     | init       | init      | uninit    |
//! | [`UninitCopy`]  | uninit     | init       | init      | init      |
//! | [`Relocate`]    | uninit     | init       | init      | uninit    |
//!
//! `Relocate` is the destructive-move tag. Languages with move constructors
//! distinguish it from `UninitMove` (construct-then-destroy versus a raw
//! byte move); in Rust both are the same bitwise move, and the separate tag
//! survives because range-relocating callers use its bulk form, which moves
//! the whole run in one copy.

use std::ptr;

use crate::mem::relocate;

/// One of the five assignment kinds from the table above.
///
/// # Safety
///
/// Callers of [`assign`](Assign::assign) and
/// [`assign_slice`](Assign::assign_slice) must present slots in the
/// before-states of the chosen tag and honor the after-states: a slot left
/// `uninit` must not be read or dropped until re-initialized.
pub trait Assign<T> {
    /// Transfer one value from `src` to `dst`.
    ///
    /// # Safety
    ///
    /// `dst` and `src` must be valid for writes, distinct, and in the
    /// before-states of this tag.
    unsafe fn assign(dst: *mut T, src: *mut T);

    /// Transfer `n` values between two non-overlapping runs.
    ///
    /// # Safety
    ///
    /// As for [`assign`](Assign::assign), for every slot of both runs.
    unsafe fn assign_slice(dst: *mut T, src: *mut T, n: usize) {
        for i in 0..n {
            unsafe { Self::assign(dst.add(i), src.add(i)) };
        }
    }
}

/// Move `src` into an already-initialized `dst`, dropping `dst`'s old value.
pub struct MoveAssign;

/// Clone `src` into an already-initialized `dst`.
pub struct CopyAssign;

/// Move `src` into an uninitialized `dst`.
pub struct UninitMove;

/// Clone `src` into an uninitialized `dst`.
pub struct UninitCopy;

/// Destructively relocate `src` into an uninitialized `dst`; the bulk form
/// moves whole runs at once.
pub struct Relocate;

impl<T> Assign<T> for MoveAssign {
    unsafe fn assign(dst: *mut T, src: *mut T) {
        unsafe {
            ptr::drop_in_place(dst);
            relocate(dst, src);
        }
    }
}

impl<T: Clone> Assign<T> for CopyAssign {
    unsafe fn assign(dst: *mut T, src: *mut T) {
        unsafe { (*dst).clone_from(&*src) };
    }
}

impl<T> Assign<T> for UninitMove {
    unsafe fn assign(dst: *mut T, src: *mut T) {
        unsafe { relocate(dst, src) };
    }
}

impl<T: Clone> Assign<T> for UninitCopy {
    unsafe fn assign(dst: *mut T, src: *mut T) {
        unsafe { ptr::write(dst, (*src).clone()) };
    }
}

impl<T> Assign<T> for Relocate {
    unsafe fn assign(dst: *mut T, src: *mut T) {
        unsafe { relocate(dst, src) };
    }

    unsafe fn assign_slice(dst: *mut T, src: *mut T, n: usize) {
        unsafe { ptr::copy_nonoverlapping(src, dst, n) };
    }
}
