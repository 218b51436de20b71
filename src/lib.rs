//! FAT32 Directory Tree Inspector
//!
//! Reads a raw FAT32 volume image without mounting it and rebuilds its
//! directory tree, long file names included.
//!
//! # Features
//! - Boot sector signature check and BPB decoding
//! - Cluster to byte offset mapping, FAT chain following for directories
//! - Short entry decoding and LFN reassembly
//! - Depth-first tree walk with cycle detection
//! - Indented or JSON output
//!
//! # Usage
//! ```no_run
//! use fat32_tree::fat32::Fat32Volume;
//! use fat32_tree::render::tree_line;
//!
//! let mut volume = Fat32Volume::open("disk.img")?;
//! volume.walk_with(|node| println!("{}", tree_line(node)))?;
//! # Ok::<(), fat32_tree::Fat32Error>(())
//! ```
//!
//! # Limits
//! Starting clusters are 16-bit: the high word of a directory entry's
//! cluster number is not used, so data at cluster 65536 and above is
//! out of reach.

pub mod error;
pub mod fat32;
pub mod logger;
pub mod render;

// Re-export commonly used types at crate root
pub use error::{Fat32Error, Result};
pub use fat32::{DirEntry, Fat32Volume, TreeNode, VolumeGeometry};
pub use render::Output;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
