//! Raw memory transfer over untyped spans.
//!
//! Copies and zero-fills run in two phases: pointer-width words for the
//! aligned prefix, then single bytes for the `len % WORD` tail. Nothing here
//! allocates, and no bounds are checked beyond what the span lengths imply.

#![allow(unsafe_code)]

use std::mem::size_of;
use std::ptr::NonNull;

/// Bytes moved per step of the word phase.
pub const WORD: usize = size_of::<usize>();

/// An untyped, contiguous region of memory owned by the caller.
///
/// A span never owns or frees its backing storage; it is only valid while
/// the storage it was built from is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySpan {
    start: NonNull<u8>,
    len: usize,
}

impl MemorySpan {
    /// Build a span from a raw start address and length.
    ///
    /// # Safety
    ///
    /// `start` must be valid for reads (and for writes, if the span is used
    /// as a destination) of `len` bytes for as long as the span is used.
    #[must_use]
    pub unsafe fn from_raw_parts(start: NonNull<u8>, len: usize) -> Self {
        Self { start, len }
    }

    /// Span over a byte slice, for use as a copy source only.
    ///
    /// Writing through the resulting span is undefined behavior.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self {
            start: NonNull::from(bytes).cast(),
            len: bytes.len(),
        }
    }

    /// Span over a mutable byte slice, usable as a destination.
    #[must_use]
    pub fn of_mut(bytes: &mut [u8]) -> Self {
        let len = bytes.len();
        Self {
            start: NonNull::from(bytes).cast(),
            len,
        }
    }

    /// Start address of the span.
    #[must_use]
    pub fn as_ptr(self) -> *mut u8 {
        self.start.as_ptr()
    }

    /// Length of the span in bytes.
    #[must_use]
    pub fn len(self) -> usize {
        self.len
    }

    /// Whether the span covers zero bytes.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Copy `len` bytes from `src` into `dst`.
///
/// # Safety
///
/// Both spans must still be valid, `len` must not exceed either span's
/// length, `dst` must be writable, and the two regions must not overlap.
pub unsafe fn copy_memory(src: MemorySpan, dst: MemorySpan, len: usize) {
    debug_assert!(len <= src.len && len <= dst.len, "copy past span end");
    // SAFETY: forwarded from the caller's contract.
    unsafe { copy_bytes(src.as_ptr(), dst.as_ptr(), len) }
}

/// Zero-fill the first `len` bytes of `dst`.
///
/// # Safety
///
/// `dst` must still be valid and writable, and `len` must not exceed its
/// length.
pub unsafe fn clear_memory(dst: MemorySpan, len: usize) {
    debug_assert!(len <= dst.len, "clear past span end");
    // SAFETY: forwarded from the caller's contract.
    unsafe { clear_bytes(dst.as_ptr(), len) }
}

/// Word-then-byte copy between raw pointers.
///
/// # Safety
///
/// `src` must be readable and `dst` writable for `len` bytes, and the
/// regions must not overlap. Neither pointer needs any alignment.
#[inline]
pub unsafe fn copy_bytes(src: *const u8, dst: *mut u8, len: usize) {
    let aligned_end = len / WORD * WORD;
    let mut i = 0;
    while i < aligned_end {
        // SAFETY: i + WORD <= len, and unaligned access is used.
        unsafe {
            let word = src.add(i).cast::<usize>().read_unaligned();
            dst.add(i).cast::<usize>().write_unaligned(word);
        }
        i += WORD;
    }
    while i < len {
        // SAFETY: i < len.
        unsafe { *dst.add(i) = *src.add(i) };
        i += 1;
    }
}

/// Word-then-byte zero fill of a raw region.
///
/// # Safety
///
/// `dst` must be writable for `len` bytes. No alignment is required.
#[inline]
pub unsafe fn clear_bytes(dst: *mut u8, len: usize) {
    let aligned_end = len / WORD * WORD;
    let mut i = 0;
    while i < aligned_end {
        // SAFETY: i + WORD <= len, and unaligned access is used.
        unsafe { dst.add(i).cast::<usize>().write_unaligned(0) };
        i += WORD;
    }
    while i < len {
        // SAFETY: i < len.
        unsafe { *dst.add(i) = 0 };
        i += 1;
    }
}

/// Copy all of `src` into the front of `dst`.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
pub fn copy_slice(src: &[u8], dst: &mut [u8]) {
    assert!(
        dst.len() >= src.len(),
        "destination of {} bytes cannot hold {} bytes",
        dst.len(),
        src.len()
    );
    // SAFETY: both slices cover at least src.len() bytes, and a shared and
    // a mutable borrow cannot alias.
    unsafe { copy_bytes(src.as_ptr(), dst.as_mut_ptr(), src.len()) }
}

/// Zero every byte of `dst`.
pub fn clear_slice(dst: &mut [u8]) {
    // SAFETY: the slice is writable for its full length.
    unsafe { clear_bytes(dst.as_mut_ptr(), dst.len()) }
}

/// Copy plain-data values through the raw byte path.
///
/// `T: Copy` rules out owned references in the payload, so a bitwise copy
/// is a complete copy.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
pub fn copy_values<T: Copy>(src: &[T], dst: &mut [T]) {
    assert!(
        dst.len() >= src.len(),
        "destination of {} values cannot hold {} values",
        dst.len(),
        src.len()
    );
    // SAFETY: dst covers at least size_of_val(src) bytes; borrows cannot alias.
    unsafe {
        copy_bytes(
            src.as_ptr().cast::<u8>(),
            dst.as_mut_ptr().cast::<u8>(),
            std::mem::size_of_val(src),
        );
    }
}
