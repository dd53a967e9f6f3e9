//! Component records: categories of related properties.

use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::binary::{BinaryReader, Version};
use crate::entities::{AsciiString, EntityFactory, Profile};
use crate::{Dataset, Result};

/// Header examined when only a user-agent is available.
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// Headers that may carry the original device user-agent.
pub const DEVICE_USER_AGENT_HEADERS: [&str; 4] = [
    "Device-Stock-UA",
    "x-Device-User-Agent",
    "X-Device-User-Agent",
    "X-OperaMini-Phone-UA",
];

/// Fixed prefix shared by both record versions.
const BASE_RECORD_SIZE: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
enum HttpHeaderSource {
    /// 3.1 derives the header list from the component name.
    ByName,
    /// 3.2 stores explicit string offsets in the record body.
    Explicit { offsets: Vec<u32> },
}

/// A category of related properties (hardware, software, browser, crawler).
#[derive(Debug, Clone)]
pub struct Component {
    index: u32,
    component_id: u8,
    name_offset: u32,
    default_profile_offset: u32,
    header_source: HttpHeaderSource,
    http_headers: OnceCell<Arc<[String]>>,
}

impl Component {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Stable identifier assigned by the data publisher.
    pub fn component_id(&self) -> u8 {
        self.component_id
    }

    /// The component name, resolved from the strings section.
    pub fn name(&self, dataset: &Dataset) -> Result<Arc<AsciiString>> {
        dataset.strings()?.get(self.name_offset)
    }

    /// The profile used when detection cannot decide.
    pub fn default_profile(&self, dataset: &Dataset) -> Result<Arc<Profile>> {
        dataset.profiles()?.get(self.default_profile_offset)
    }

    /// HTTP headers to examine for this component.
    ///
    /// Resolved once and memoised; 3.1 records derive the list from the
    /// component name, 3.2 records store explicit string offsets.
    pub fn http_headers(&self, dataset: &Dataset) -> Result<Arc<[String]>> {
        let headers = self.http_headers.get_or_try_init(|| -> Result<Arc<[String]>> {
            match &self.header_source {
                HttpHeaderSource::ByName => {
                    let name = self.name(dataset)?;
                    let names: &[&str] = match name.as_str().as_ref() {
                        "HardwarePlatform" | "SoftwarePlatform" => &DEVICE_USER_AGENT_HEADERS,
                        "BrowserUA" | "Crawler" => &[USER_AGENT_HEADER],
                        _ => &[],
                    };
                    Ok(names.iter().map(|s| s.to_string()).collect())
                }
                HttpHeaderSource::Explicit { offsets } => {
                    let mut names = Vec::with_capacity(offsets.len());
                    for &offset in offsets {
                        names.push(dataset.strings()?.get(offset)?.as_str().into_owned());
                    }
                    Ok(names.into())
                }
            }
        })?;
        Ok(Arc::clone(headers))
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        // the memo cell is derived state and not part of record identity
        self.index == other.index
            && self.component_id == other.component_id
            && self.name_offset == other.name_offset
            && self.default_profile_offset == other.default_profile_offset
            && self.header_source == other.header_source
    }
}

impl Eq for Component {}

/// Version-dispatching factory for [`Component`] records.
#[derive(Debug, Clone, Copy)]
pub struct ComponentFactory {
    version: Version,
}

impl ComponentFactory {
    pub fn new(version: Version) -> Self {
        Self { version }
    }
}

impl EntityFactory for ComponentFactory {
    type Entity = Component;

    fn create(&self, index: u32, reader: &mut BinaryReader) -> Result<Component> {
        let component_id = reader.read_u8()?;
        let name_offset = reader.read_u32()?;
        let default_profile_offset = reader.read_u32()?;
        let header_source = match self.version {
            Version::V31 => HttpHeaderSource::ByName,
            Version::V32 => {
                let count = reader.read_u16()? as usize;
                let mut offsets = Vec::with_capacity(count);
                for _ in 0..count {
                    offsets.push(reader.read_u32()?);
                }
                HttpHeaderSource::Explicit { offsets }
            }
        };
        Ok(Component {
            index,
            component_id,
            name_offset,
            default_profile_offset,
            header_source,
            http_headers: OnceCell::new(),
        })
    }

    fn record_length(&self) -> Option<usize> {
        match self.version {
            Version::V31 => Some(BASE_RECORD_SIZE),
            // 3.2 records embed their header-offset array
            Version::V32 => None,
        }
    }

    fn entity_length(&self, entity: &Component) -> usize {
        match &entity.header_source {
            HttpHeaderSource::ByName => BASE_RECORD_SIZE,
            HttpHeaderSource::Explicit { offsets } => BASE_RECORD_SIZE + 2 + 4 * offsets.len(),
        }
    }
}
