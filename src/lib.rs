//! Purpose: Linked-list LIFO stack library backing the `linkstack` harness and tests.
//! Exports: `api` (stable surface), `core` (stack, byte stack, errors).
//! Role: Library crate; the binary only drives it through `api`.
//! Invariants: Every allocation-dependent operation is fallible and never partially mutates.
//! Invariants: Stacks exclusively own their nodes; release is iterative.
pub mod api;
pub mod core;
