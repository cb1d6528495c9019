// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shallow change detection for provided values.
//!
//! A provider asks [`ChangeDetection::may_have_changed`] whether a newly
//! assigned value could differ from the previous one. The answer decides
//! whether subscribers are notified, so it must never report "unchanged" for
//! a value that did change. Reporting "changed" for an equal value only costs
//! an extra notification.
//!
//! The policy depends on how the type behaves:
//!
//! - **Immutable / primitive values** (`bool`, numbers, `char`, strings)
//!   compare by structural equality.
//! - **Containers** (`Option`, tuples, arrays, slices, `Vec`, `Box`, `Cow`)
//!   compare element by element, each element with its own policy. A
//!   `Vec<Rc<T>>` is unchanged only if every element is the same allocation.
//! - **Shared references** (`Rc<T>`, `Arc<T>`) compare by identity. Two
//!   distinct allocations with equal contents are "changed". The same
//!   allocation is "unchanged", even if its contents were mutated in place
//!   through interior mutability (`Rc<RefCell<T>>`). Mutating a provided value
//!   in place therefore does not notify subscribers; publish a new allocation
//!   instead.

use alloc::borrow::{Cow, ToOwned};
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

/// Decides whether a newly assigned value may differ from the previous one.
///
/// Implement this for your own value types. Types with value semantics
/// usually forward to `PartialEq`; types with shared, mutable state should
/// compare identity.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use understory_cascade::ChangeDetection;
///
/// assert!(!i32::may_have_changed(&2, &2));
/// assert!(i32::may_have_changed(&1, &2));
///
/// // Reference types compare by identity.
/// let a = Rc::new(2);
/// let b = Rc::new(2);
/// assert!(Rc::may_have_changed(&a, &b));
/// assert!(!Rc::may_have_changed(&a, &a.clone()));
/// ```
pub trait ChangeDetection {
    /// Returns `true` if `next` may differ from `previous`.
    fn may_have_changed(previous: &Self, next: &Self) -> bool;
}

/// Applies [`ChangeDetection`] to an optional previous value.
///
/// A first assignment (no previous value) always counts as a change.
#[must_use]
#[inline]
pub fn may_have_changed<T: ChangeDetection + ?Sized>(previous: Option<&T>, next: &T) -> bool {
    previous.is_none_or(|previous| T::may_have_changed(previous, next))
}

macro_rules! structural {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ChangeDetection for $ty {
                #[inline]
                fn may_have_changed(previous: &Self, next: &Self) -> bool {
                    previous != next
                }
            }
        )*
    };
}

structural!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    str,
    String,
);

impl ChangeDetection for &'static str {
    #[inline]
    fn may_have_changed(previous: &Self, next: &Self) -> bool {
        previous != next
    }
}

impl<T: ChangeDetection> ChangeDetection for Option<T> {
    fn may_have_changed(previous: &Self, next: &Self) -> bool {
        match (previous, next) {
            (None, None) => false,
            (Some(previous), Some(next)) => T::may_have_changed(previous, next),
            _ => true,
        }
    }
}

impl<T: ChangeDetection> ChangeDetection for [T] {
    fn may_have_changed(previous: &Self, next: &Self) -> bool {
        previous.len() != next.len()
            || previous
                .iter()
                .zip(next)
                .any(|(previous, next)| T::may_have_changed(previous, next))
    }
}

impl<T: ChangeDetection, const N: usize> ChangeDetection for [T; N] {
    #[inline]
    fn may_have_changed(previous: &Self, next: &Self) -> bool {
        <[T]>::may_have_changed(previous, next)
    }
}

impl<T: ChangeDetection> ChangeDetection for Vec<T> {
    #[inline]
    fn may_have_changed(previous: &Self, next: &Self) -> bool {
        <[T]>::may_have_changed(previous, next)
    }
}

impl<T: ChangeDetection + ?Sized> ChangeDetection for Box<T> {
    #[inline]
    fn may_have_changed(previous: &Self, next: &Self) -> bool {
        T::may_have_changed(previous, next)
    }
}

impl<B> ChangeDetection for Cow<'_, B>
where
    B: ChangeDetection + ToOwned + ?Sized,
{
    #[inline]
    fn may_have_changed(previous: &Self, next: &Self) -> bool {
        B::may_have_changed(previous, next)
    }
}

macro_rules! tuples {
    ($(($($name:ident $index:tt),+)),* $(,)?) => {
        $(
            impl<$($name: ChangeDetection),+> ChangeDetection for ($($name,)+) {
                fn may_have_changed(previous: &Self, next: &Self) -> bool {
                    $($name::may_have_changed(&previous.$index, &next.$index))||+
                }
            }
        )*
    };
}

tuples!(
    (A 0),
    (A 0, B 1),
    (A 0, B 1, C 2),
    (A 0, B 1, C 2, D 3),
    (A 0, B 1, C 2, D 3, E 4),
    (A 0, B 1, C 2, D 3, E 4, F 5),
);

impl<T: ?Sized> ChangeDetection for Rc<T> {
    #[inline]
    fn may_have_changed(previous: &Self, next: &Self) -> bool {
        !Self::ptr_eq(previous, next)
    }
}

impl<T: ?Sized> ChangeDetection for Arc<T> {
    #[inline]
    fn may_have_changed(previous: &Self, next: &Self) -> bool {
        !Self::ptr_eq(previous, next)
    }
}
