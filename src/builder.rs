//! Dataset construction: open modes, cache wiring, section discovery.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::SystemTime;

use crate::binary::{
    BinaryReader, DataSource, Header, Preamble, ReaderPool, Version, DEFAULT_POOL_SIZE,
};
use crate::cache::CacheSet;
use crate::dataset::{Dataset, Mode};
use crate::entities::{
    AsciiStringFactory, ComponentFactory, MapFactory, NodeFactory, ProfileFactory,
    ProfileOffsetFactory, RootNodeFactory, SignatureFactory, ValueFactory,
};
use crate::lists::{IntegerList, MemoryFixedList, PropertiesList, StreamList};
use crate::Result;

/// Configures and opens a [`Dataset`].
///
/// ```no_run
/// use patterndb::{Builder, CacheSet, Mode};
///
/// let dataset = Builder::new()
///     .mode(Mode::MemoryMapped)
///     .caches(CacheSet::default())
///     .build("device-data.dat")?;
/// # Ok::<(), patterndb::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    mode: Mode,
    delete_on_close: bool,
    last_modified: Option<SystemTime>,
    pool_size: usize,
    caches: CacheSet,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            mode: Mode::File,
            delete_on_close: false,
            last_modified: None,
            pool_size: DEFAULT_POOL_SIZE,
            caches: CacheSet::default(),
        }
    }

    /// Select how the file is accessed. Ignored by `build_from_bytes`.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Delete the backing file when the dataset is closed. Intended for
    /// temporary copies handed to the engine.
    pub fn delete_on_close(mut self, delete: bool) -> Self {
        self.delete_on_close = delete;
        self
    }

    /// Record an explicit last-modified time instead of the file's mtime.
    pub fn last_modified(mut self, when: SystemTime) -> Self {
        self.last_modified = Some(when);
        self
    }

    /// Bound the number of OS file handles a file-mode pool may open.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Replace the per-section cache policies.
    pub fn caches(mut self, caches: CacheSet) -> Self {
        self.caches = caches;
        self
    }

    /// Open the data file at `path`.
    pub fn build(self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let source = match self.mode {
            Mode::File => DataSource::file(path)?,
            Mode::MemoryMapped => DataSource::mapped(path)?,
            Mode::InMemory => DataSource::memory(std::fs::read(path)?),
        };
        let last_modified = match self.last_modified {
            Some(when) => Some(when),
            None => std::fs::metadata(path)?.modified().ok(),
        };
        assemble(
            source,
            self.mode,
            Some(path.to_path_buf()),
            self.delete_on_close,
            last_modified,
            self.pool_size,
            self.caches,
        )
    }

    /// Open a data file already read into memory.
    pub fn build_from_bytes(self, data: Vec<u8>) -> Result<Dataset> {
        assemble(
            DataSource::memory(data),
            Mode::InMemory,
            None,
            false,
            self.last_modified,
            self.pool_size,
            self.caches,
        )
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one section header and skip the body to reach the next section.
fn next_section(reader: &mut BinaryReader) -> Result<Header> {
    let header = Header::load(reader)?;
    reader.set_pos(header.end());
    Ok(header)
}

fn assemble(
    source: DataSource,
    mode: Mode,
    path: Option<std::path::PathBuf>,
    delete_on_close: bool,
    last_modified: Option<SystemTime>,
    pool_size: usize,
    caches: CacheSet,
) -> Result<Dataset> {
    let pool = Arc::new(ReaderPool::new(source, pool_size)?);

    // Section discovery: the preamble, then one header per section in the
    // version-dependent order, skipping each body.
    let preamble;
    let strings_header;
    let components_header;
    let maps_header;
    let properties_header;
    let values_header;
    let profiles_header;
    let signatures_header;
    let mut signature_node_offsets_header = None;
    let mut node_ranked_signature_indexes_header = None;
    let ranked_signature_indexes_header;
    let nodes_header;
    let root_nodes_header;
    let profile_offsets_header;
    {
        let mut reader = pool.borrow()?;
        reader.set_pos(0);
        preamble = Preamble::load(&mut reader)?;

        strings_header = next_section(&mut reader)?;
        components_header = next_section(&mut reader)?;
        maps_header = next_section(&mut reader)?;
        properties_header = next_section(&mut reader)?;
        values_header = next_section(&mut reader)?;
        profiles_header = next_section(&mut reader)?;
        signatures_header = next_section(&mut reader)?;
        if preamble.version == Version::V32 {
            signature_node_offsets_header = Some(next_section(&mut reader)?);
            node_ranked_signature_indexes_header = Some(next_section(&mut reader)?);
        }
        ranked_signature_indexes_header = next_section(&mut reader)?;
        nodes_header = next_section(&mut reader)?;
        root_nodes_header = next_section(&mut reader)?;
        profile_offsets_header = next_section(&mut reader)?;
    }

    let version = preamble.version;
    let CacheSet {
        strings: strings_policy,
        nodes: nodes_policy,
        values: values_policy,
        profiles: profiles_policy,
        signatures: signatures_policy,
    } = caches;

    let strings = StreamList::new(
        strings_header,
        Arc::clone(&pool),
        AsciiStringFactory,
        strings_policy,
    )?;
    let mut components =
        MemoryFixedList::new(components_header, ComponentFactory::new(version));
    let mut maps = MemoryFixedList::new(maps_header, MapFactory);
    let mut properties = PropertiesList::new(properties_header);
    let values = StreamList::new(values_header, Arc::clone(&pool), ValueFactory, values_policy)?;
    let profiles = StreamList::new(
        profiles_header,
        Arc::clone(&pool),
        ProfileFactory,
        profiles_policy,
    )?;
    let signatures = StreamList::new(
        signatures_header,
        Arc::clone(&pool),
        SignatureFactory::new(
            version,
            preamble.signature_profiles_count,
            preamble.signature_nodes_count,
        ),
        signatures_policy,
    )?;
    let signature_node_offsets = signature_node_offsets_header
        .map(|header| IntegerList::new(header, Arc::clone(&pool)))
        .transpose()?;
    let node_ranked_signature_indexes = node_ranked_signature_indexes_header
        .map(|header| IntegerList::new(header, Arc::clone(&pool)))
        .transpose()?;
    let ranked_signature_indexes =
        IntegerList::new(ranked_signature_indexes_header, Arc::clone(&pool))?;
    let nodes = StreamList::new(
        nodes_header,
        Arc::clone(&pool),
        NodeFactory::new(version),
        nodes_policy,
    )?;
    let mut root_nodes = MemoryFixedList::new(root_nodes_header, RootNodeFactory);
    let mut profile_offsets = MemoryFixedList::new(profile_offsets_header, ProfileOffsetFactory);

    // Rewind into each resident section and read it whole.
    {
        let mut reader = pool.borrow()?;
        components.read(&mut reader)?;
        maps.read(&mut reader)?;
        properties.read(&mut reader)?;
        root_nodes.read(&mut reader)?;
        profile_offsets.read(&mut reader)?;
    }
    // Name resolution goes through the strings stream list, which borrows
    // its own readers; no pooled reader may be held here.
    properties.index_names(&strings)?;

    log::info!(
        "opened pattern data {} ({} properties, {} profiles, {} signatures, {} nodes)",
        preamble.version,
        properties.size(),
        profiles.size(),
        signatures.size(),
        nodes.size()
    );

    Ok(Dataset {
        pool,
        closed: AtomicBool::new(false),
        mode,
        path,
        delete_on_close,
        last_modified,
        preamble,
        strings,
        components,
        maps,
        properties,
        values,
        profiles,
        signatures,
        signature_node_offsets,
        node_ranked_signature_indexes,
        ranked_signature_indexes,
        nodes,
        root_nodes,
        profile_offsets,
    })
}
