//! Raw views of dynamically-typed values.
//!
//! A `&dyn Any` is a two-word fat pointer: the data address and the type's
//! vtable. The allocator only ever needs the first word, to find the storage
//! behind a value whose type it already knows. Keep these helpers inside
//! allocator internals; general code should downcast instead.

use std::any::Any;
use std::mem::size_of;

/// A dynamically-typed value: data pointer plus type descriptor.
pub type BoxedValue<'a> = &'a dyn Any;

/// Address of the data behind a boxed value.
///
/// The pointee is neither copied nor interpreted, and the call cannot fail.
/// The address is only meaningful while `value`'s borrow is.
#[inline]
pub fn raw_data_pointer(value: BoxedValue<'_>) -> *const () {
    (value as *const dyn Any).cast::<()>()
}

/// Pass a value through an optimization barrier.
///
/// The result is the same reference, with the same type, as the input. The
/// barrier only stops the optimizer from reasoning about where the value
/// flows; it never extends the referent's lifetime.
#[inline(never)]
pub fn prevent_escape<T: ?Sized>(value: &T) -> &T {
    std::hint::black_box(value)
}

/// Scalar pointee types the allocator copies without layout walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// `isize`, the platform word-sized integer.
    Int,
    /// `i32`
    I32,
    /// `u32`
    U32,
    /// `i64`
    I64,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `String` (header only, not the heap bytes).
    Str,
}

impl ScalarKind {
    /// Classify the pointee of a boxed value.
    pub fn of(value: BoxedValue<'_>) -> Option<Self> {
        let kind = if value.is::<bool>() {
            Self::Bool
        } else if value.is::<isize>() {
            Self::Int
        } else if value.is::<i32>() {
            Self::I32
        } else if value.is::<u32>() {
            Self::U32
        } else if value.is::<i64>() {
            Self::I64
        } else if value.is::<u64>() {
            Self::U64
        } else if value.is::<f32>() {
            Self::F32
        } else if value.is::<f64>() {
            Self::F64
        } else if value.is::<String>() {
            Self::Str
        } else {
            return None;
        };
        Some(kind)
    }

    /// Size in bytes of a value of this kind.
    pub const fn size(self) -> usize {
        match self {
            Self::Bool => size_of::<bool>(),
            Self::Int => size_of::<isize>(),
            Self::I32 => size_of::<i32>(),
            Self::U32 => size_of::<u32>(),
            Self::I64 => size_of::<i64>(),
            Self::U64 => size_of::<u64>(),
            Self::F32 => size_of::<f32>(),
            Self::F64 => size_of::<f64>(),
            Self::Str => size_of::<String>(),
        }
    }
}

/// Raw parts of a slice or string: where the elements live and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceHeader {
    /// Address of the first element.
    pub data: *const (),
    /// Number of elements (bytes, for strings).
    pub len: usize,
}

/// Header of a slice.
pub fn slice_header<T>(slice: &[T]) -> SliceHeader {
    SliceHeader {
        data: slice.as_ptr().cast(),
        len: slice.len(),
    }
}

/// Header of a string slice.
pub fn str_header(s: &str) -> SliceHeader {
    SliceHeader {
        data: s.as_ptr().cast(),
        len: s.len(),
    }
}
