use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while opening or walking a FAT32 image.
#[derive(Error, Debug)]
pub enum Fat32Error {
    #[error("cannot open image {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image is {size} bytes, larger than the supported {max} bytes")]
    OversizeVolume { size: u64, max: u64 },

    #[error("boot sector signature is {found:#06x}, expected 0xaa55: not a FAT32 volume")]
    SignatureMismatch { found: u16 },

    #[error("short read: {len} bytes at offset {offset}")]
    ShortRead { offset: u64, len: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed geometry: {field} is zero")]
    MalformedGeometry { field: &'static str },

    #[error("cluster {cluster} is not a data cluster")]
    InvalidCluster { cluster: u32 },

    #[error("directory cluster {cluster} is reachable twice")]
    CyclicStructure { cluster: u32 },

    #[error("long name fragment {ordinal} exceeds the 255 character limit")]
    LongNameOverflow { ordinal: u8 },

    #[error("long name fragment has invalid ordinal {ordinal}")]
    MalformedLongName { ordinal: u8 },
}

pub type Result<T> = std::result::Result<T, Fat32Error>;
