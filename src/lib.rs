//! patterndb - a read-only storage engine for binary device-detection
//! pattern data files (versions 3.1 and 3.2).
//!
//! The data file is a multi-section binary container holding the strings,
//! components, properties, values, profiles, signatures and prefix-tree
//! nodes a detection algorithm walks to classify HTTP clients. This crate
//! maps that container into typed, cross-referenced lists:
//!
//! - **Lazy materialization**: large sections are not loaded at open; each
//!   `get` seeks into the file and decodes one record.
//! - **Bounded reader pool**: concurrent reads share a pool of positioned
//!   readers over the file, a memory mapping, or an in-memory buffer.
//! - **Per-section LRU caches**: hot entities are kept in strict-LRU caches
//!   whose capacities (or implementations) the caller can override.
//! - **Resident hot sections**: components, maps, properties, root nodes
//!   and profile offsets are small and read whole at open.
//!
//! # Quick Start
//!
//! ```ignore
//! use patterndb::Dataset;
//!
//! let dataset = Dataset::open("device-data.dat")?;
//!
//! // resident metadata
//! let is_mobile = dataset.property_by_name("IsMobile")?.unwrap();
//! println!("{}", is_mobile.description(&dataset)?);
//!
//! // streamed entities materialize on demand
//! let signature = dataset.signatures()?.get(0)?;
//! for node in signature.nodes(&dataset)? {
//!     println!("node at {}", node.offset());
//! }
//!
//! dataset.close()?;
//! ```
//!
//! # Concurrency
//!
//! A [`Dataset`] is immutable after open and safe to share across threads.
//! Blocking happens only on the reader pool (file mode, when every handle
//! is checked out) and on cache mutexes. [`Dataset::close`] is idempotent
//! and may race outstanding reads, which either complete or fail with
//! [`Error::Closed`].

mod builder;
mod dataset;
mod error;

pub mod binary;
pub mod cache;
pub mod entities;
pub mod lists;

// Re-export core types
pub use builder::Builder;
pub use dataset::{Dataset, Mode};
pub use error::{Error, Result};

pub use binary::{Date, Version};
pub use cache::{CachePolicy, CacheSet, CacheStats, EntityCache, LruEntityCache};

// Re-export the entities callers hold
pub use entities::{
    AsciiString, Component, Map, Node, Profile, ProfileOffset, Property, PropertyValueType,
    RootNode, Signature, SignatureFlags, Value,
};
