// Type-erased stack of fixed-width raw byte payloads.
use crate::core::alloc::{payload_alloc_error, try_box, try_copy_bytes};
use crate::core::error::{Error, ErrorKind, Rejected};
use crate::core::stack::Stack;

/// A stack whose elements are opaque byte buffers of one width chosen at
/// construction.
///
/// Every stored payload is exactly `element_size` bytes. Null or wrongly
/// sized input is rejected before anything is allocated.
#[derive(Debug)]
pub struct ByteStack {
    element_size: usize,
    // Each element is a boxed slot around the owned bytes. `Stack<T>` needs a
    // sized payload and adopts it through `emplace`, so the slot lets it own
    // the buffer without copying and reuse its iterative unlinking.
    inner: Stack<Box<[u8]>>,
}

impl ByteStack {
    pub fn new(element_size: usize) -> Result<Self, Error> {
        if element_size == 0 {
            return Err(Error::new(ErrorKind::InvalidArgument)
                .with_message("element size must be positive")
                .with_op("create"));
        }
        Ok(Self {
            element_size,
            inner: Stack::new(),
        })
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Copies `data` onto the top of the stack. `None` stands for a null
    /// element reference.
    pub fn push(&mut self, data: Option<&[u8]>) -> Result<(), Error> {
        let data = data.ok_or_else(|| null_error("push"))?;
        self.check_width(data.len(), "push")?;
        let payload = try_copy_bytes(data).map_err(|err| {
            tracing::warn!(op = "push", bytes = data.len(), "payload allocation failed");
            err.with_op("push")
        })?;
        let slot = try_box(payload).map_err(|payload| {
            tracing::warn!(op = "push", bytes = payload.len(), "payload slot allocation failed");
            payload_alloc_error(payload.len()).with_op("push")
        })?;
        self.inner
            .emplace(slot)
            .map_err(|rejected| rejected.into_parts().0.with_op("push"))
    }

    /// Adopts `data` as the new top payload without copying its bytes. Every
    /// failure hands the argument back.
    pub fn emplace(
        &mut self,
        data: Option<Box<[u8]>>,
    ) -> Result<(), Rejected<Option<Box<[u8]>>>> {
        let Some(data) = data else {
            return Err(Rejected::new(null_error("emplace"), None));
        };
        if let Err(err) = self.check_width(data.len(), "emplace") {
            return Err(Rejected::new(err, Some(data)));
        }
        let slot = match try_box(data) {
            Ok(slot) => slot,
            Err(data) => {
                tracing::warn!(
                    op = "emplace",
                    bytes = data.len(),
                    "payload slot allocation failed; buffer returned"
                );
                let err = payload_alloc_error(data.len()).with_op("emplace");
                return Err(Rejected::new(err, Some(data)));
            }
        };
        self.inner.emplace(slot).map_err(|rejected| {
            let (err, data) = rejected.into_parts();
            Rejected::new(err, Some(*data))
        })
    }

    pub fn pop(&mut self) -> Result<(), Error> {
        self.inner.pop()
    }

    pub fn peek(&self) -> Option<&[u8]> {
        self.inner.peek().map(|payload| &**payload)
    }

    pub fn destroy(&mut self) -> usize {
        self.inner.destroy()
    }

    /// Exchanges contents with `other`; both must share one element size.
    pub fn swap(&mut self, other: &mut ByteStack) -> Result<(), Error> {
        if self.element_size != other.element_size {
            return Err(Error::new(ErrorKind::InvalidArgument)
                .with_message(format!(
                    "element sizes differ ({} vs {})",
                    self.element_size, other.element_size
                ))
                .with_op("swap"));
        }
        self.inner.swap(&mut other.inner);
        Ok(())
    }

    fn check_width(&self, len: usize, op: &'static str) -> Result<(), Error> {
        if len != self.element_size {
            return Err(Error::new(ErrorKind::InvalidArgument)
                .with_message(format!(
                    "expected {} byte element, got {len}",
                    self.element_size
                ))
                .with_op(op));
        }
        Ok(())
    }
}

fn null_error(op: &'static str) -> Error {
    Error::new(ErrorKind::InvalidArgument)
        .with_message("element reference is null")
        .with_op(op)
}

#[cfg(test)]
mod tests {
    use super::ByteStack;
    use crate::core::alloc::inject;
    use crate::core::error::ErrorKind;

    #[test]
    fn zero_element_size_is_rejected() {
        let err = ByteStack::new(0).expect_err("zero size");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn null_push_and_emplace_fail_without_mutation() {
        let mut stack = ByteStack::new(4).expect("create");
        stack.push(Some(&500i32.to_le_bytes()[..])).expect("push");

        let err = stack.push(None).expect_err("null push");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let rejected = stack.emplace(None).expect_err("null emplace");
        assert_eq!(rejected.kind(), ErrorKind::InvalidArgument);
        assert!(rejected.into_inner().is_none());

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.peek(), Some(&500i32.to_le_bytes()[..]));
    }

    #[test]
    fn wrong_width_is_rejected() {
        let mut stack = ByteStack::new(4).expect("create");
        let err = stack.push(Some(&[1u8, 2][..])).expect_err("short");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let rejected = stack
            .emplace(Some(vec![0u8; 8].into_boxed_slice()))
            .expect_err("long");
        assert_eq!(rejected.into_inner().map(|buf| buf.len()), Some(8));
        assert!(stack.is_empty());
    }

    #[test]
    fn reference_scenario() {
        let mut stack = ByteStack::new(4).expect("create");
        stack.push(Some(&500i32.to_le_bytes()[..])).expect("push");
        stack.push(Some(&1000i32.to_le_bytes()[..])).expect("push");
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek(), Some(&1000i32.to_le_bytes()[..]));

        stack.pop().expect("pop");
        assert_eq!(stack.peek(), Some(&500i32.to_le_bytes()[..]));
        stack.pop().expect("pop");
        assert_eq!(stack.peek(), None);
        assert_eq!(stack.pop().expect_err("empty").kind(), ErrorKind::Empty);

        let owned: Box<[u8]> = Box::new(500i32.to_le_bytes());
        let addr = owned.as_ptr();
        stack.emplace(Some(owned)).expect("emplace");
        let top = stack.peek().expect("top");
        assert_eq!(top.as_ptr(), addr);
        assert_eq!(top, &500i32.to_le_bytes()[..]);

        stack.pop().expect("pop");
        assert!(stack.is_empty());
    }

    #[test]
    fn allocation_failure_during_push_is_reported() {
        let mut stack = ByteStack::new(2).expect("create");
        inject::fail_after(0);
        let err = stack.push(Some(&[1u8, 2][..])).expect_err("alloc");
        inject::reset();
        assert_eq!(err.kind(), ErrorKind::AllocationFailure);
        assert!(stack.is_empty());
    }

    #[test]
    fn allocation_failure_during_emplace_returns_buffer() {
        let mut stack = ByteStack::new(2).expect("create");
        inject::fail_after(0);
        let rejected = stack
            .emplace(Some(vec![3u8, 4].into_boxed_slice()))
            .expect_err("alloc");
        inject::reset();
        assert_eq!(rejected.kind(), ErrorKind::AllocationFailure);
        assert_eq!(rejected.into_inner().as_deref(), Some(&[3u8, 4][..]));
        assert!(stack.is_empty());
    }

    #[test]
    fn failed_slot_or_node_during_push_leaves_stack_unchanged() {
        // Allocation order for push: byte copy, payload slot, node.
        for ok in [1, 2] {
            let mut stack = ByteStack::new(2).expect("create");
            stack.push(Some(&[7u8, 0][..])).expect("push");

            inject::fail_after(ok);
            let err = stack.push(Some(&[8u8, 0][..])).expect_err("alloc");
            inject::reset();

            assert_eq!(err.kind(), ErrorKind::AllocationFailure, "fail_after({ok})");
            assert_eq!(err.op(), Some("push"));
            assert_eq!(stack.len(), 1);
            assert_eq!(stack.peek(), Some(&[7u8, 0][..]));
        }
    }

    #[test]
    fn failed_node_during_emplace_returns_buffer() {
        let mut stack = ByteStack::new(2).expect("create");
        stack.push(Some(&[7u8, 0][..])).expect("push");

        // The slot allocation succeeds; the node shell does not.
        inject::fail_after(1);
        let rejected = stack
            .emplace(Some(vec![3u8, 4].into_boxed_slice()))
            .expect_err("alloc");
        inject::reset();

        assert_eq!(rejected.kind(), ErrorKind::AllocationFailure);
        assert_eq!(rejected.error().op(), Some("emplace"));
        assert_eq!(rejected.into_inner().as_deref(), Some(&[3u8, 4][..]));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.peek(), Some(&[7u8, 0][..]));
    }

    #[test]
    fn destroy_empties_the_stack() {
        let mut stack = ByteStack::new(1).expect("create");
        for b in 0..5u8 {
            stack.push(Some(&[b][..])).expect("push");
        }
        assert_eq!(stack.destroy(), 5);
        assert!(stack.is_empty());
        assert_eq!(stack.peek(), None);
    }

    #[test]
    fn swap_requires_matching_widths() {
        let mut four = ByteStack::new(4).expect("create");
        let mut eight = ByteStack::new(8).expect("create");
        four.push(Some(&[0u8; 4][..])).expect("push");
        let err = four.swap(&mut eight).expect_err("mismatch");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(four.len(), 1);

        let mut other = ByteStack::new(4).expect("create");
        four.swap(&mut other).expect("swap");
        assert!(four.is_empty());
        assert_eq!(other.len(), 1);
    }
}
