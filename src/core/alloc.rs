// Fallible heap allocation for node shells and payloads.
use std::alloc::{self, Layout};

use crate::core::error::{Error, ErrorKind};

/// Moves `value` into a fresh heap allocation, handing it back if the
/// allocator returns null instead of aborting the process.
pub(crate) fn try_box<T>(value: T) -> Result<Box<T>, T> {
    if injected_failure() {
        return Err(value);
    }
    let layout = Layout::new::<T>();
    if layout.size() == 0 {
        return Ok(Box::new(value));
    }
    // SAFETY: `layout` has a non-zero size.
    let ptr = unsafe { alloc::alloc(layout) }.cast::<T>();
    if ptr.is_null() {
        return Err(value);
    }
    // SAFETY: `ptr` was just allocated by the global allocator with
    // `Layout::new::<T>()`, which is what `Box<T>` frees with.
    unsafe {
        ptr.write(value);
        Ok(Box::from_raw(ptr))
    }
}

/// Copies `bytes` into an exactly-sized owned buffer.
pub(crate) fn try_copy_bytes(bytes: &[u8]) -> Result<Box<[u8]>, Error> {
    if injected_failure() {
        return Err(payload_alloc_error(bytes.len()));
    }
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes.len()).map_err(|err| {
        Error::new(ErrorKind::AllocationFailure)
            .with_message(format!("failed to allocate {} byte payload", bytes.len()))
            .with_source(err)
    })?;
    buf.extend_from_slice(bytes);
    Ok(buf.into_boxed_slice())
}

pub(crate) fn node_alloc_error() -> Error {
    Error::new(ErrorKind::AllocationFailure).with_message("failed to allocate stack node")
}

pub(crate) fn payload_alloc_error(len: usize) -> Error {
    Error::new(ErrorKind::AllocationFailure)
        .with_message(format!("failed to allocate {len} byte payload"))
}

#[cfg(not(test))]
#[inline(always)]
fn injected_failure() -> bool {
    false
}

#[cfg(test)]
use self::inject::injected_failure;


#[cfg(test)]
mod tests {
    use super::{inject, try_box, try_copy_bytes};
    use crate::core::error::ErrorKind;

    #[test]
    fn try_box_moves_value() {
        let boxed = try_box(String::from("top")).expect("alloc");
        assert_eq!(boxed.as_str(), "top");
    }

    #[test]
    fn try_box_hands_value_back_on_failure() {
        inject::fail_after(0);
        let result = try_box(41u64);
        inject::reset();
        assert_eq!(result.expect_err("should fail"), 41);
    }

    #[test]
    fn copy_bytes_is_exact() {
        let buf = try_copy_bytes(&[1, 2, 3]).expect("alloc");
        assert_eq!(&*buf, &[1, 2, 3]);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn copy_bytes_reports_allocation_failure() {
        inject::fail_after(0);
        let err = try_copy_bytes(&[9; 4]).expect_err("should fail");
        inject::reset();
        assert_eq!(err.kind(), ErrorKind::AllocationFailure);
    }
}
