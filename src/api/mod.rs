//! Purpose: Define the stable public Rust API boundary for linkstack.
//! Exports: Stack types, error types, and the absent-stack helpers.
//! Role: Public, additive-only surface; hides the allocation internals.
//! Invariants: This module is the only path the harness binary uses.

pub use crate::core::bytes::ByteStack;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind, Rejected};
pub use crate::core::stack::{Stack, is_empty, size};
