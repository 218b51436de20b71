//! Random-access byte stores backing a FAT32 volume.
//!
//! Every read is positioned and all-or-nothing: a read that cannot be
//! satisfied in full is an error, never a partially zeroed buffer.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Fat32Error, Result};

/// Fixed-size, read-only, byte-addressable storage.
pub trait BlockSource {
    /// Fill `buf` with the bytes starting at `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Total size in bytes.
    fn size(&self) -> u64;

    /// Read `len` bytes starting at `offset` into a new buffer.
    fn read_vec(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_at(offset, &mut buf)?;
        Ok(buf)
    }
}

/// A [`BlockSource`] over any seekable reader, with its size cached at creation.
pub struct ImageSource<R> {
    reader: R,
    size: u64,
    label: String,
}

/// An image opened from the filesystem.
pub type ImageFile = ImageSource<File>;

impl<R: Read + Seek> ImageSource<R> {
    /// Wrap a reader, measuring its size by seeking to the end.
    pub fn new(mut reader: R, label: impl Into<String>) -> Result<Self> {
        let size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(ImageSource {
            reader,
            size,
            label: label.into(),
        })
    }

    /// Name used in log messages (usually the image path).
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl ImageSource<File> {
    /// Open an image file read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Fat32Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let source = ImageSource::new(file, path.display().to_string())?;
        log::info!("opened image {} ({} bytes)", source.label, source.size);
        Ok(source)
    }
}

impl ImageSource<Cursor<Vec<u8>>> {
    /// In-memory image, mostly useful for tests and generated volumes.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        ImageSource {
            reader: Cursor::new(data),
            size,
            label: String::from("<memory>"),
        }
    }
}

impl<R: Read + Seek> BlockSource for ImageSource<R> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let len = buf.len();
        let short = Fat32Error::ShortRead { offset, len };
        match offset.checked_add(len as u64) {
            Some(end) if end <= self.size => {}
            _ => return Err(short),
        }

        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => short,
            _ => Fat32Error::Io(e),
        })
    }

    fn size(&self) -> u64 {
        self.size
    }
}

impl<R> Drop for ImageSource<R> {
    fn drop(&mut self) {
        log::info!("closing image {}", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_at_offset() {
        let mut src = ImageSource::from_bytes((0u8..64).collect());
        assert_eq!(src.size(), 64);

        let mut buf = [0u8; 4];
        src.read_at(10, &mut buf).unwrap();
        assert_eq!(buf, [10, 11, 12, 13]);

        assert_eq!(src.read_vec(60, 4).unwrap(), vec![60, 61, 62, 63]);
    }

    #[test]
    fn test_short_read_is_an_error() {
        let mut src = ImageSource::from_bytes(vec![0u8; 16]);
        let mut buf = [0u8; 8];
        let err = src.read_at(12, &mut buf).unwrap_err();
        assert!(matches!(err, Fat32Error::ShortRead { offset: 12, len: 8 }));

        let err = src.read_at(u64::MAX, &mut buf).unwrap_err();
        assert!(matches!(err, Fat32Error::ShortRead { .. }));
    }

    /// Seekable reader whose reads always fail.
    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device gone"))
        }
    }

    impl Seek for FailingReader {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            Ok(match pos {
                SeekFrom::End(_) => 4096,
                SeekFrom::Start(n) => n,
                SeekFrom::Current(_) => 0,
            })
        }
    }

    #[test]
    fn test_read_failure_is_io_error() {
        let mut src = ImageSource::new(FailingReader, "failing").unwrap();
        assert_eq!(src.size(), 4096);

        let mut buf = [0u8; 32];
        let err = src.read_at(512, &mut buf).unwrap_err();
        assert!(matches!(err, Fat32Error::Io(ref e) if e.kind() == io::ErrorKind::Other));
    }

    #[test]
    fn test_new_measures_reader() {
        let src = ImageSource::new(Cursor::new(vec![1u8; 300]), "cursor").unwrap();
        assert_eq!(src.size(), 300);
        assert_eq!(src.label(), "cursor");
    }

    #[test]
    fn test_open_missing_file() {
        let err = ImageSource::open("/nonexistent/fat32/image.img").err().unwrap();
        assert!(matches!(err, Fat32Error::Open { .. }));
    }
}
