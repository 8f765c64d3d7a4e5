// Core modules implementing the linked stack, its allocation, and error modeling.
pub(crate) mod alloc;
pub mod bytes;
pub mod error;
pub mod stack;
