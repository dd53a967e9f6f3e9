//! Container format: version tags, preamble and section headers.

use crate::binary::reader::BinaryReader;
use crate::{Error, Result};

/// Size of a section header in bytes.
pub const HEADER_SIZE: u64 = 12;

/// Supported data file versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// Pattern 3.1
    V31,
    /// Pattern 3.2
    V32,
}

impl Version {
    /// Map a `(major, minor)` pair to a supported version.
    pub fn from_pair(major: u16, minor: u16) -> Result<Self> {
        match (major, minor) {
            (3, 1) => Ok(Version::V31),
            (3, 2) => Ok(Version::V32),
            _ => Err(Error::UnknownVersion { major, minor }),
        }
    }

    /// The `(major, minor)` pair stored in the preamble.
    pub fn pair(&self) -> (u16, u16) {
        match self {
            Version::V31 => (3, 1),
            Version::V32 => (3, 2),
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (major, minor) = self.pair();
        write!(f, "{}.{}", major, minor)
    }
}

/// A calendar date stored as `year u16, month u8, day u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl Date {
    pub(crate) fn load(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            year: reader.read_u16()?,
            month: reader.read_u8()?,
            day: reader.read_u8()?,
        })
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Container preamble at offset 0.
///
/// The version pair is validated before anything else is read so that an
/// unsupported file fails fast with [`Error::UnknownVersion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    pub version: Version,
    pub format_version: u32,
    pub tag: [u8; 16],
    pub copyright: String,
    pub published: Date,
    pub next_update: Date,
    pub device_combinations: u32,
    pub max_user_agent_length: u16,
    pub min_user_agent_length: u16,
    pub lowest_character: u8,
    pub highest_character: u8,
    pub max_signatures: u32,
    pub signature_profiles_count: u32,
    pub signature_nodes_count: u32,
    pub max_values: u16,
    /// Highest signature rank; only stored by 3.2 files.
    pub max_rank: u32,
}

impl Preamble {
    pub(crate) fn load(reader: &mut BinaryReader) -> Result<Self> {
        let major = reader.read_u16()?;
        let minor = reader.read_u16()?;
        let version = Version::from_pair(major, minor)?;

        let format_version = reader.read_u32()?;
        let mut tag = [0u8; 16];
        reader.read_exact(&mut tag)?;

        let copyright_length = reader.read_u16()? as usize;
        let copyright_offset = reader.pos();
        let copyright_bytes = reader.read_bytes(copyright_length)?;
        if !copyright_bytes.is_ascii() {
            return Err(Error::format("copyright is not ASCII", copyright_offset));
        }
        let copyright = String::from_utf8_lossy(&copyright_bytes).into_owned();

        let published = Date::load(reader)?;
        let next_update = Date::load(reader)?;
        let device_combinations = reader.read_u32()?;
        let max_user_agent_length = reader.read_u16()?;
        let min_user_agent_length = reader.read_u16()?;
        let lowest_character = reader.read_u8()?;
        let highest_character = reader.read_u8()?;
        let max_signatures = reader.read_u32()?;
        let signature_profiles_count = reader.read_u32()?;
        let signature_nodes_count = reader.read_u32()?;
        let max_values = reader.read_u16()?;
        let max_rank = match version {
            Version::V31 => 0,
            Version::V32 => reader.read_u32()?,
        };

        Ok(Self {
            version,
            format_version,
            tag,
            copyright,
            published,
            next_update,
            device_combinations,
            max_user_agent_length,
            min_user_agent_length,
            lowest_character,
            highest_character,
            max_signatures,
            signature_profiles_count,
            signature_nodes_count,
            max_values,
            max_rank,
        })
    }
}

/// Section descriptor: 12 bytes read at the current position.
///
/// `load` leaves the reader just past the header, at the first byte of the
/// section body; the assembler skips to `end()` to reach the next section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Absolute offset of the section body.
    pub start: u32,
    /// Byte length of the section body.
    pub length: u32,
    /// Number of logical entities in the section.
    pub count: u32,
}

impl Header {
    pub(crate) fn load(reader: &mut BinaryReader) -> Result<Self> {
        let header_pos = reader.pos();
        let header = Self {
            start: reader.read_u32()?,
            length: reader.read_u32()?,
            count: reader.read_u32()?,
        };
        header.validate(header_pos, reader.len())?;
        Ok(header)
    }

    fn validate(&self, header_pos: u64, file_size: u64) -> Result<()> {
        if u64::from(self.start) != header_pos + HEADER_SIZE {
            return Err(Error::format(
                format!("section start {} does not follow its header", self.start),
                header_pos,
            ));
        }
        if self.end() > file_size {
            return Err(Error::format(
                format!(
                    "section runs past end of data ({} > {})",
                    self.end(),
                    file_size
                ),
                header_pos,
            ));
        }
        Ok(())
    }

    /// Absolute offset of the first byte past the section body.
    pub fn end(&self) -> u64 {
        u64::from(self.start) + u64::from(self.length)
    }
}
