//! # Passage Storage
//!
//! Storage abstraction layer for Passage backends.
//!
//! Provides the [`StorageBackend`] trait, conditional multi-key
//! [`WriteBatch`]es, and an in-memory backend for development and tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod batch;
pub mod error;
pub mod memory;

pub use backend::StorageBackend;
pub use batch::{BatchWrite, WriteBatch, WriteCondition};
pub use error::StorageError;
pub use memory::MemoryBackend;
