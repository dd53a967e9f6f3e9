//! Read-only indexable views over the container sections.
//!
//! Small, hot sections are fully resident ([`MemoryFixedList`],
//! [`PropertiesList`]); large sections materialize entities on demand
//! through the reader pool ([`StreamList`]) with an optional cache in
//! between; packed integer tables get their own thin view
//! ([`IntegerList`]).

pub mod integer;
pub mod memory;
pub mod stream;

pub use integer::IntegerList;
pub use memory::{MemoryFixedList, PropertiesList};
pub use stream::{StreamIter, StreamList};
