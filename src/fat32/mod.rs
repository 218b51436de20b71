//! Read-only FAT32 volume access

pub mod block_source;
pub mod boot_sector;
pub mod directory;
pub mod fat;
pub mod walker;

pub use block_source::{BlockSource, ImageFile, ImageSource};
pub use boot_sector::{check_signature, VolumeGeometry, BOOT_SECTOR_SIZE};
pub use directory::{decode_long_name_fragment, decode_short_entry, DirEntry, LongNameAccumulator};
pub use directory::{ATTR_ARCHIVE, ATTR_DIRECTORY, ATTR_HIDDEN, ATTR_LONG_NAME, ATTR_READ_ONLY,
                    ATTR_SYSTEM, ATTR_VOLUME_ID};
pub use fat::FatEntry;
pub use walker::{ClusterCursor, DirectoryWalker, NextEntry, TreeNode};

use std::path::Path;

use crate::error::{Fat32Error, Result};

/// Largest image accepted, in bytes
pub const MAX_IMAGE_SIZE: u64 = u32::MAX as u64;

/// An opened FAT32 volume: the byte store plus its decoded geometry.
///
/// The volume owns its source for the whole scan; dropping the volume
/// releases it, whether the walk succeeded or not.
pub struct Fat32Volume<S> {
    source: S,
    geometry: VolumeGeometry,
}

impl Fat32Volume<ImageFile> {
    /// Open and validate an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(ImageSource::open(path)?)
    }
}

impl<S: BlockSource> Fat32Volume<S> {
    /// Validate size and boot signature, then decode the BPB.
    pub fn new(mut source: S) -> Result<Self> {
        let size = source.size();
        if size > MAX_IMAGE_SIZE {
            return Err(Fat32Error::OversizeVolume { size, max: MAX_IMAGE_SIZE });
        }

        let mut boot = [0u8; BOOT_SECTOR_SIZE];
        source.read_at(0, &mut boot)?;
        check_signature(&boot)?;
        log::info!("boot signature ok ({} bytes)", size);

        let geometry = VolumeGeometry::decode(&boot);
        log::debug!("decoded BPB:\n{}", geometry);
        if let Some(field) = geometry.degenerate_field() {
            return Err(Fat32Error::MalformedGeometry { field });
        }

        Ok(Fat32Volume { source, geometry })
    }

    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    pub fn root_cluster(&self) -> u32 {
        self.geometry.root_cluster
    }

    /// Walker borrowing this volume's source and geometry.
    pub fn walker(&mut self) -> DirectoryWalker<'_, S> {
        DirectoryWalker::new(&mut self.source, &self.geometry)
    }

    /// Stream the tree below the root directory, depth-first.
    pub fn walk_with<F>(&mut self, visit: F) -> Result<()>
    where
        F: FnMut(&TreeNode),
    {
        let root = self.root_cluster();
        self.walker().list_directory(ClusterCursor::new(root), 0, visit)
    }

    /// Collect the tree below the root directory.
    pub fn walk(&mut self) -> Result<Vec<TreeNode>> {
        let root = self.root_cluster();
        self.walker().walk(root)
    }
}
