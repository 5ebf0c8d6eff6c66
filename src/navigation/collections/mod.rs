//! Generic collections backing the search engine.
//!
//! # Example: Quick Start
//!
//! ```rust
//! use pathweaver::navigation::collections::{HeapItem, IndexedPriorityQueue};
//!
//! #[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
//! struct Job { priority: u32, id: usize }
//!
//! impl HeapItem for Job {
//!     fn heap_key(&self) -> usize { self.id }
//! }
//!
//! let mut queue = IndexedPriorityQueue::new(16);
//! queue.push(Job { priority: 30, id: 1 });
//! queue.push(Job { priority: 20, id: 2 });
//!
//! // Job 1 became urgent: decrease its key in place.
//! queue.update(Job { priority: 10, id: 1 });
//! assert_eq!(queue.pop_min().map(|j| j.id), Some(1));
//! ```

pub mod indexed_heap;

#[cfg(test)]
mod tests;

pub use indexed_heap::{HeapItem, IndexedPriorityQueue};
