//! Data sources and the positioned little-endian reader.

use memmap2::Mmap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{Error, Result};

/// The byte source a dataset reads from, shared by every pooled reader.
///
/// File-backed sources hand each reader its own OS handle; memory-mapped and
/// in-memory sources are plain byte slices over which readers are cheap
/// cursors.
#[derive(Debug)]
pub enum DataSource {
    /// Re-opened per reader; the pool bounds the number of handles.
    File { path: PathBuf, len: u64 },
    /// One shared mapping of the whole file.
    Mapped { map: Mmap },
    /// A caller-supplied byte buffer.
    Memory { data: Vec<u8> },
}

impl DataSource {
    /// Describe a file source without opening a handle yet.
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = std::fs::metadata(&path)?.len();
        Ok(DataSource::File { path, len })
    }

    /// Map the file at `path` into memory.
    pub fn mapped(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let map = unsafe { Mmap::map(&file)? };
        Ok(DataSource::Mapped { map })
    }

    /// Wrap an in-memory copy of the data file.
    pub fn memory(data: Vec<u8>) -> Self {
        DataSource::Memory { data }
    }

    /// Total length of the underlying data in bytes.
    pub fn len(&self) -> u64 {
        match self {
            DataSource::File { len, .. } => *len,
            DataSource::Mapped { map } => map.len() as u64,
            DataSource::Memory { data } => data.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether readers over this source are cheap cursors.
    pub(crate) fn is_buffer(&self) -> bool {
        !matches!(self, DataSource::File { .. })
    }

    fn bytes(&self) -> Option<&[u8]> {
        match self {
            DataSource::File { .. } => None,
            DataSource::Mapped { map } => Some(&map[..]),
            DataSource::Memory { data } => Some(&data[..]),
        }
    }
}

enum Inner {
    Buffer { source: Arc<DataSource> },
    File { file: File, handle_pos: u64 },
}

/// Positioned reader over a [`DataSource`].
///
/// All integers are little-endian. Reading past the end of the data fails
/// with [`Error::InvalidFormat`] carrying the offending offset.
pub struct BinaryReader {
    inner: Inner,
    pos: u64,
    len: u64,
}

impl BinaryReader {
    /// Create a reader over `source`, opening a file handle when needed.
    pub(crate) fn create(source: &Arc<DataSource>) -> Result<Self> {
        let len = source.len();
        let inner = match &**source {
            DataSource::File { path, .. } => Inner::File {
                file: File::open(path)?,
                handle_pos: 0,
            },
            _ => Inner::Buffer {
                source: Arc::clone(source),
            },
        };
        Ok(Self { inner, pos: 0, len })
    }

    /// Current absolute position.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Total length of the underlying data.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Move the cursor to an absolute position. The move itself is always
    /// accepted; a position past the end fails on the next read.
    pub fn set_pos(&mut self, pos: u64) {
        self.pos = pos;
    }

    /// Fill `buf` from the current position and advance past it.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let wanted = buf.len() as u64;
        if self.pos + wanted > self.len {
            return Err(Error::format(
                format!(
                    "read of {} bytes past end of data (length {})",
                    wanted, self.len
                ),
                self.pos,
            ));
        }
        match &mut self.inner {
            Inner::Buffer { source } => {
                let bytes = source.bytes().expect("buffer source");
                let start = self.pos as usize;
                buf.copy_from_slice(&bytes[start..start + buf.len()]);
            }
            Inner::File { file, handle_pos } => {
                if *handle_pos != self.pos {
                    file.seek(SeekFrom::Start(self.pos))?;
                }
                file.read_exact(buf)?;
                *handle_pos = self.pos + wanted;
            }
        }
        self.pos += wanted;
        Ok(())
    }

    /// Read `n` bytes into a fresh buffer.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }
}

/// Build a reader over an in-memory buffer, for unit tests.
#[cfg(test)]
pub(crate) fn test_reader(bytes: Vec<u8>) -> BinaryReader {
    BinaryReader::create(&Arc::new(DataSource::memory(bytes))).expect("memory reader")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_primitives() {
        let mut reader = test_reader(vec![
            0x2A, // u8
            0x34, 0x12, // u16
            0xFE, 0xFF, // i16 = -2
            0x78, 0x56, 0x34, 0x12, // u32
            0xFF, 0xFF, 0xFF, 0xFF, // i32 = -1
        ]);
        assert_eq!(reader.read_u8().unwrap(), 0x2A);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_i16().unwrap(), -2);
        assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(reader.read_i32().unwrap(), -1);
        assert_eq!(reader.pos(), 13);
    }

    #[test]
    fn test_seek_and_reread() {
        let mut reader = test_reader(vec![1, 2, 3, 4]);
        assert_eq!(reader.read_u32().unwrap(), 0x0403_0201);
        reader.set_pos(2);
        assert_eq!(reader.read_u8().unwrap(), 3);
    }

    #[test]
    fn test_read_past_end() {
        let mut reader = test_reader(vec![1, 2]);
        reader.set_pos(1);
        let err = reader.read_u32().unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { offset: 1, .. }));
        // position is untouched by the failed read
        assert_eq!(reader.pos(), 1);
    }

    #[test]
    fn test_read_bytes() {
        let mut reader = test_reader(vec![9, 8, 7]);
        assert_eq!(reader.read_bytes(2).unwrap(), vec![9, 8]);
        assert_eq!(reader.read_bytes(0).unwrap(), Vec::<u8>::new());
    }
}
