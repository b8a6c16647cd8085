//! # Payload Kinds
//!
//! How payload values are duplicated when a frame is captured or restored.
//!
//! Two kinds exist:
//! - **Blittable**: plain old data (`bytemuck::Pod`). Pages are copied as
//!   raw bytes.
//! - **Managed**: anything `Clone`. Values are cloned element by element,
//!   reusing the destination's allocations through `clone_from`.
//!
//! The kind is fixed when the data set is built and never changes.

use bytemuck::Pod;

/// Which copy strategy a data set uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// Bitwise copies.
    Blittable,
    /// Element-wise clones.
    Managed,
}

/// Copy strategy for payloads of type `T`.
pub trait PayloadCopy<T>: Send + Sync {
    /// Copies one value.
    fn copy_value(&self, source: &T, destination: &mut T);

    /// Copies a run of values. Both slices have the same length.
    fn copy_run(&self, source: &[T], destination: &mut [T]);

    /// The strategy this copier implements.
    fn kind(&self) -> PayloadKind;
}

/// Bitwise copier for plain old data.
///
/// # Example
///
/// ```rust
/// use rewind_core::{Blittable, PayloadCopy};
///
/// let source = [1u32, 2, 3];
/// let mut destination = [0u32; 3];
/// Blittable.copy_run(&source, &mut destination);
///
/// assert_eq!(destination, source);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Blittable;

impl<T: Pod> PayloadCopy<T> for Blittable {
    #[inline]
    fn copy_value(&self, source: &T, destination: &mut T) {
        *destination = *source;
    }

    #[inline]
    fn copy_run(&self, source: &[T], destination: &mut [T]) {
        if std::mem::size_of::<T>() == 0 {
            return;
        }
        bytemuck::cast_slice_mut::<T, u8>(destination).copy_from_slice(bytemuck::cast_slice(source));
    }

    fn kind(&self) -> PayloadKind {
        PayloadKind::Blittable
    }
}

/// Clone-based copier for payloads that own heap data.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeepCopy;

impl<T: Clone> PayloadCopy<T> for DeepCopy {
    #[inline]
    fn copy_value(&self, source: &T, destination: &mut T) {
        destination.clone_from(source);
    }

    #[inline]
    fn copy_run(&self, source: &[T], destination: &mut [T]) {
        destination.clone_from_slice(source);
    }

    fn kind(&self) -> PayloadKind {
        PayloadKind::Managed
    }
}
