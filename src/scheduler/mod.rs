//! Work distribution between workers.
//!
//! Pending intervals that no worker has claimed sit on a single shared stack.
//! Workers drain it, refine privately, and hand work back when the shared
//! stack runs dry.

pub mod global_stack;

pub use global_stack::GlobalStack;
