//! The open dataset: preamble metadata plus the section lists.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::binary::{Date, Preamble, ReaderPool, Version};
use crate::builder::Builder;
use crate::entities::{
    AsciiStringFactory, ComponentFactory, MapFactory, NodeFactory, ProfileFactory,
    ProfileOffsetFactory, Property, RootNodeFactory, SignatureFactory, ValueFactory,
};
use crate::lists::{IntegerList, MemoryFixedList, PropertiesList, StreamList};
use crate::{Error, Result};

/// How the underlying data file is accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Seek-and-read through a bounded pool of OS file handles.
    File,
    /// One shared memory mapping; readers are cheap cursors.
    MemoryMapped,
    /// The whole file held in a byte buffer.
    InMemory,
}

/// An open, immutable pattern data file.
///
/// Small hot sections (components, maps, properties, root nodes, profile
/// offsets) are fully resident; the rest materialize entities on demand
/// through the reader pool, behind the configured caches. All reads are
/// thread-safe; no ordering is promised between concurrent `get`s.
///
/// Entities returned by the lists resolve their cross-references through an
/// explicit `&Dataset` parameter, so they stay plain values the caller may
/// hold or discard freely. The dataset must outlive such lookups, which the
/// borrow on `&Dataset` enforces.
pub struct Dataset {
    pub(crate) pool: Arc<ReaderPool>,
    pub(crate) closed: AtomicBool,
    pub(crate) mode: Mode,
    pub(crate) path: Option<PathBuf>,
    pub(crate) delete_on_close: bool,
    pub(crate) last_modified: Option<SystemTime>,
    pub(crate) preamble: Preamble,
    pub(crate) strings: StreamList<AsciiStringFactory>,
    pub(crate) components: MemoryFixedList<ComponentFactory>,
    pub(crate) maps: MemoryFixedList<MapFactory>,
    pub(crate) properties: PropertiesList,
    pub(crate) values: StreamList<ValueFactory>,
    pub(crate) profiles: StreamList<ProfileFactory>,
    pub(crate) signatures: StreamList<SignatureFactory>,
    pub(crate) signature_node_offsets: Option<IntegerList>,
    pub(crate) node_ranked_signature_indexes: Option<IntegerList>,
    pub(crate) ranked_signature_indexes: IntegerList,
    pub(crate) nodes: StreamList<NodeFactory>,
    pub(crate) root_nodes: MemoryFixedList<RootNodeFactory>,
    pub(crate) profile_offsets: MemoryFixedList<ProfileOffsetFactory>,
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("mode", &self.mode)
            .field("path", &self.path)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl Dataset {
    /// Open the data file at `path` with default options.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Builder::new().build(path)
    }

    /// Open a data file already read into memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Builder::new().build_from_bytes(data)
    }

    fn guard(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Data format version of the opened file.
    pub fn version(&self) -> Version {
        self.preamble.version
    }

    pub fn format_version(&self) -> u32 {
        self.preamble.format_version
    }

    /// Unique identifier of this data export.
    pub fn tag(&self) -> &[u8; 16] {
        &self.preamble.tag
    }

    pub fn copyright(&self) -> &str {
        &self.preamble.copyright
    }

    pub fn published(&self) -> Date {
        self.preamble.published
    }

    pub fn next_update(&self) -> Date {
        self.preamble.next_update
    }

    pub fn device_combinations(&self) -> u32 {
        self.preamble.device_combinations
    }

    pub fn max_user_agent_length(&self) -> u16 {
        self.preamble.max_user_agent_length
    }

    pub fn min_user_agent_length(&self) -> u16 {
        self.preamble.min_user_agent_length
    }

    /// First and last user-agent characters the node tree covers.
    pub fn character_range(&self) -> (u8, u8) {
        (
            self.preamble.lowest_character,
            self.preamble.highest_character,
        )
    }

    pub fn max_signatures(&self) -> u32 {
        self.preamble.max_signatures
    }

    /// Profile slots stored per signature record.
    pub fn signature_profiles_count(&self) -> u32 {
        self.preamble.signature_profiles_count
    }

    /// Node slots stored per 3.1 signature record.
    pub fn signature_nodes_count(&self) -> u32 {
        self.preamble.signature_nodes_count
    }

    /// Most values any single property carries.
    pub fn max_values(&self) -> u16 {
        self.preamble.max_values
    }

    /// Highest signature rank; zero for 3.1 files.
    pub fn max_rank(&self) -> u32 {
        self.preamble.max_rank
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Last-modified time recorded at open, when known.
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    /// The strings section.
    pub fn strings(&self) -> Result<&StreamList<AsciiStringFactory>> {
        self.guard()?;
        Ok(&self.strings)
    }

    /// The resident components section.
    pub fn components(&self) -> Result<&MemoryFixedList<ComponentFactory>> {
        self.guard()?;
        Ok(&self.components)
    }

    /// The resident maps section.
    pub fn maps(&self) -> Result<&MemoryFixedList<MapFactory>> {
        self.guard()?;
        Ok(&self.maps)
    }

    /// The resident properties section with its name index.
    pub fn properties(&self) -> Result<&PropertiesList> {
        self.guard()?;
        Ok(&self.properties)
    }

    /// Look a property up by its exact name.
    pub fn property_by_name(&self, name: &str) -> Result<Option<&Property>> {
        self.guard()?;
        Ok(self.properties.by_name(name))
    }

    /// The values section.
    pub fn values(&self) -> Result<&StreamList<ValueFactory>> {
        self.guard()?;
        Ok(&self.values)
    }

    /// The profiles section; keys are byte offsets.
    pub fn profiles(&self) -> Result<&StreamList<ProfileFactory>> {
        self.guard()?;
        Ok(&self.profiles)
    }

    /// The signatures section.
    pub fn signatures(&self) -> Result<&StreamList<SignatureFactory>> {
        self.guard()?;
        Ok(&self.signatures)
    }

    /// The nodes section; keys are byte offsets.
    pub fn nodes(&self) -> Result<&StreamList<NodeFactory>> {
        self.guard()?;
        Ok(&self.nodes)
    }

    /// The resident root-nodes section.
    pub fn root_nodes(&self) -> Result<&MemoryFixedList<RootNodeFactory>> {
        self.guard()?;
        Ok(&self.root_nodes)
    }

    /// The resident profile-offsets section.
    pub fn profile_offsets(&self) -> Result<&MemoryFixedList<ProfileOffsetFactory>> {
        self.guard()?;
        Ok(&self.profile_offsets)
    }

    /// Signature-to-node offsets table; present in 3.2 files only.
    pub fn signature_node_offsets(&self) -> Result<Option<&IntegerList>> {
        self.guard()?;
        Ok(self.signature_node_offsets.as_ref())
    }

    /// Node-to-ranked-signature table; present in 3.2 files only.
    pub fn node_ranked_signature_indexes(&self) -> Result<Option<&IntegerList>> {
        self.guard()?;
        Ok(self.node_ranked_signature_indexes.as_ref())
    }

    /// Signature indexes ordered by rank.
    pub fn ranked_signature_indexes(&self) -> Result<&IntegerList> {
        self.guard()?;
        Ok(&self.ranked_signature_indexes)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the dataset: shut the reader pool and, when requested at open,
    /// delete the backing file.
    ///
    /// Idempotent and safe to call concurrently with outstanding reads;
    /// those either complete or fail with [`Error::Closed`]. Every list
    /// accessor fails with [`Error::Closed`] afterwards.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.pool.close();
        if self.delete_on_close {
            if let Some(path) = &self.path {
                std::fs::remove_file(path)?;
            }
        }
        log::info!("closed pattern data {}", self.preamble.version);
        Ok(())
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
