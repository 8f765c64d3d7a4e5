// LIFO stack over an owned singly linked chain of heap nodes.
use std::fmt;
use std::mem;

use crate::core::alloc::{node_alloc_error, payload_alloc_error, try_box};
use crate::core::error::{Error, ErrorKind, Rejected};

type Link<T> = Option<Box<StackNode<T>>>;

/// One link of the chain. Owns its payload and everything beneath it.
struct StackNode<T> {
    payload: Box<T>,
    next: Link<T>,
}

/// A LIFO stack whose elements live in individually allocated payloads.
///
/// `count` always equals the number of nodes reachable from `head`, and
/// `count == 0` exactly when `head` is `None`. Every allocation-dependent
/// operation either completes or leaves the stack untouched.
pub struct Stack<T> {
    head: Link<T>,
    count: usize,
}

impl<T> Stack<T> {
    /// Size in bytes of one element.
    pub const ELEMENT_SIZE: usize = mem::size_of::<T>();

    /// Creates an empty stack. Zero-sized element types do not compile.
    pub const fn new() -> Self {
        const {
            assert!(
                mem::size_of::<T>() > 0,
                "stack elements must have a non-zero size"
            )
        };
        Self {
            head: None,
            count: 0,
        }
    }

    pub const fn element_size(&self) -> usize {
        Self::ELEMENT_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    /// Copies `value` into a fresh payload on top of the stack.
    pub fn push(&mut self, value: &T) -> Result<(), Error>
    where
        T: Clone,
    {
        let payload = try_box(value.clone()).map_err(|_| {
            tracing::warn!(op = "push", bytes = Self::ELEMENT_SIZE, "payload allocation failed");
            payload_alloc_error(Self::ELEMENT_SIZE).with_op("push")
        })?;
        self.link(payload).map_err(|_| {
            tracing::warn!(op = "push", "node allocation failed");
            node_alloc_error().with_op("push")
        })?;
        tracing::trace!(len = self.count, "push");
        Ok(())
    }

    /// Adopts a caller allocation as the new top payload without copying it.
    ///
    /// On failure the stack does not take ownership and the buffer comes back
    /// inside the [`Rejected`].
    pub fn emplace(&mut self, payload: Box<T>) -> Result<(), Rejected<Box<T>>> {
        match self.link(payload) {
            Ok(()) => {
                tracing::trace!(len = self.count, "emplace");
                Ok(())
            }
            Err(payload) => {
                tracing::warn!(op = "emplace", "node allocation failed; buffer returned");
                Err(Rejected::new(node_alloc_error().with_op("emplace"), payload))
            }
        }
    }

    /// Removes and releases the top element. The value is not returned; peek
    /// first if it is needed.
    pub fn pop(&mut self) -> Result<(), Error> {
        match self.unlink() {
            Some(_) => {
                tracing::trace!(len = self.count, "pop");
                Ok(())
            }
            None => Err(Error::new(ErrorKind::Empty)
                .with_message("stack is empty")
                .with_op("pop")),
        }
    }

    /// Borrows the top element, if any.
    pub fn peek(&self) -> Option<&T> {
        self.head.as_deref().map(|node| &*node.payload)
    }

    /// Releases every node and payload, leaving the stack empty and reusable.
    /// Returns how many elements were released.
    pub fn destroy(&mut self) -> usize {
        let mut released = 0;
        while self.unlink().is_some() {
            released += 1;
        }
        if released > 0 {
            tracing::debug!(released, "destroyed stack contents");
        }
        released
    }

    /// Exchanges the contents of two stacks in O(1).
    pub fn swap(&mut self, other: &mut Stack<T>) {
        mem::swap(&mut self.head, &mut other.head);
        mem::swap(&mut self.count, &mut other.count);
        tracing::debug!(left = self.count, right = other.count, "swapped stacks");
    }

    fn link(&mut self, payload: Box<T>) -> Result<(), Box<T>> {
        let node = StackNode {
            payload,
            next: self.head.take(),
        };
        match try_box(node) {
            Ok(node) => {
                self.head = Some(node);
                self.count += 1;
                Ok(())
            }
            Err(node) => {
                self.head = node.next;
                Err(node.payload)
            }
        }
    }

    // Detaches `next` before the shell drops so release never recurses.
    fn unlink(&mut self) -> Option<Box<T>> {
        self.head.take().map(|node| {
            let StackNode { payload, next } = *node;
            self.head = next;
            self.count -= 1;
            payload
        })
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Stack<T> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<T: fmt::Debug> fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("element_size", &Self::ELEMENT_SIZE)
            .field("len", &self.count)
            .field("top", &self.peek())
            .finish()
    }
}

/// True when `stack` is absent or holds no elements.
pub fn is_empty<T>(stack: Option<&Stack<T>>) -> bool {
    stack.is_none_or(Stack::is_empty)
}

/// Element count of `stack`, or 0 when it is absent.
pub fn size<T>(stack: Option<&Stack<T>>) -> usize {
    stack.map_or(0, Stack::len)
}
