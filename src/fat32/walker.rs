//! Directory traversal
//!
//! A [`ClusterCursor`] remembers where the next record of one directory
//! is. The [`DirectoryWalker`] keeps a stack of cursors, one per level
//! being visited, so descending into a subdirectory suspends the parent
//! cursor until the child is exhausted.

use std::collections::HashSet;

use super::block_source::BlockSource;
use super::boot_sector::VolumeGeometry;
use super::directory::{
    decode_long_name_fragment, decode_short_entry, is_long_name_attr, DirEntry,
    LongNameAccumulator, RawRecord, DIR_ENTRY_SIZE, END_OF_DIR, LAST_LONG_ENTRY, UNUSED_ENTRY,
};
use super::fat::read_fat_entry;
use crate::error::{Fat32Error, Result};

/// Read position inside one directory's cluster chain.
#[derive(Debug, Clone)]
pub struct ClusterCursor {
    first_cluster: u32,
    current_cluster: u32,
    offset: u64,
    chain: HashSet<u32>,
    finished: bool,
}

impl ClusterCursor {
    /// Cursor at the first record of the directory starting at `first_cluster`.
    pub fn new(first_cluster: u32) -> Self {
        ClusterCursor {
            first_cluster,
            current_cluster: first_cluster,
            offset: 0,
            chain: HashSet::from([first_cluster]),
            finished: false,
        }
    }

    pub fn first_cluster(&self) -> u32 {
        self.first_cluster
    }

    pub fn current_cluster(&self) -> u32 {
        self.current_cluster
    }

    /// Byte offset of the next record within the current cluster
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Read the next raw record, following the FAT chain at cluster ends.
    ///
    /// Returns `None` once the chain ends.
    fn next_record<S: BlockSource + ?Sized>(
        &mut self,
        source: &mut S,
        geometry: &VolumeGeometry,
    ) -> Result<Option<RawRecord>> {
        if self.finished {
            return Ok(None);
        }

        if self.offset + DIR_ENTRY_SIZE as u64 > geometry.bytes_per_cluster() {
            let entry = read_fat_entry(source, geometry, self.current_cluster)?;
            match entry.next_cluster() {
                Some(next) => {
                    if !self.chain.insert(next) {
                        return Err(Fat32Error::CyclicStructure { cluster: next });
                    }
                    log::trace!(
                        "directory {}: cluster {} -> {}",
                        self.first_cluster,
                        self.current_cluster,
                        next
                    );
                    self.current_cluster = next;
                    self.offset = 0;
                }
                None => {
                    log::trace!(
                        "directory {}: chain ends at cluster {} ({:?})",
                        self.first_cluster,
                        self.current_cluster,
                        entry
                    );
                    self.finished = true;
                    return Ok(None);
                }
            }
        }

        let at = geometry.cluster_offset(self.current_cluster)? + self.offset;
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        source.read_at(at, &mut raw)?;
        self.offset += DIR_ENTRY_SIZE as u64;
        Ok(Some(raw))
    }
}

/// Outcome of reading one logical entry from a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextEntry {
    /// A live entry, with its long name attached when it had one
    Entry(DirEntry),
    /// A deleted entry: not to be shown, but reading continues
    Unused(DirEntry),
    /// End-of-directory marker or end of the cluster chain
    End,
}

/// One emitted entry and how deep it sits below the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub depth: usize,
    pub entry: DirEntry,
}

/// Depth-first walker over the directory tree of one volume.
pub struct DirectoryWalker<'a, S: ?Sized> {
    source: &'a mut S,
    geometry: &'a VolumeGeometry,
}

impl<'a, S: BlockSource + ?Sized> DirectoryWalker<'a, S> {
    pub fn new(source: &'a mut S, geometry: &'a VolumeGeometry) -> Self {
        DirectoryWalker { source, geometry }
    }

    /// Read one logical entry: any LFN records, then the short record
    /// they belong to.
    pub fn read_next_entry(&mut self, cursor: &mut ClusterCursor) -> Result<NextEntry> {
        let mut long_name = LongNameAccumulator::new();
        let mut expected: Option<u8> = None;

        loop {
            let Some(raw) = cursor.next_record(&mut *self.source, self.geometry)? else {
                if !long_name.is_empty() {
                    log::warn!(
                        "directory {}: long name run cut off by end of chain",
                        cursor.first_cluster
                    );
                }
                return Ok(NextEntry::End);
            };

            if raw[0] == END_OF_DIR {
                if !long_name.is_empty() {
                    log::warn!(
                        "directory {}: long name run cut off by end of directory",
                        cursor.first_cluster
                    );
                }
                cursor.finished = true;
                return Ok(NextEntry::End);
            }

            // once every announced fragment is in, the next record is the short entry
            let run_complete = expected == Some(0);
            if run_complete && is_long_name_attr(raw[11]) {
                log::warn!(
                    "directory {}: long name record {:#04x} past the announced run, read as short entry",
                    cursor.first_cluster,
                    raw[0]
                );
            }

            if is_long_name_attr(raw[11]) && !run_complete {
                if raw[0] == UNUSED_ENTRY {
                    // deleted LFN record; its short record is deleted too
                    long_name.clear();
                    expected = None;
                    continue;
                }
                if raw[0] & LAST_LONG_ENTRY != 0 {
                    if !long_name.is_empty() {
                        log::warn!(
                            "directory {}: dropping long name run without a short entry",
                            cursor.first_cluster
                        );
                    }
                    long_name.clear();
                } else if expected != Some(raw[0]) {
                    log::warn!(
                        "directory {}: long name fragment {} out of sequence (expected {:?})",
                        cursor.first_cluster,
                        raw[0],
                        expected
                    );
                }
                let ordinal = decode_long_name_fragment(&raw, &mut long_name)?;
                expected = Some(ordinal - 1);
                continue;
            }

            let mut entry = decode_short_entry(&raw);
            if expected.is_some_and(|remaining| remaining != 0) {
                log::warn!(
                    "directory {}: short entry {:?} arrived with long name fragments missing",
                    cursor.first_cluster,
                    entry.short_display_name()
                );
            }
            entry.long_name = long_name.finish()?;
            log::trace!(
                "directory {}: cluster {} offset {}: {:?} attr {:#04x}",
                cursor.first_cluster,
                cursor.current_cluster,
                cursor.offset - DIR_ENTRY_SIZE as u64,
                entry.display_name(),
                entry.attr
            );

            if entry.is_unused() {
                return Ok(NextEntry::Unused(entry));
            }
            return Ok(NextEntry::Entry(entry));
        }
    }

    /// Walk the directory behind `cursor` and everything below it,
    /// calling `visit` for each shown entry in depth-first pre-order.
    ///
    /// Dot entries and volume labels are neither shown nor entered.
    pub fn list_directory<F>(&mut self, cursor: ClusterCursor, depth: usize, mut visit: F) -> Result<()>
    where
        F: FnMut(&TreeNode),
    {
        let mut visited: HashSet<u32> = HashSet::from([cursor.first_cluster]);
        let mut stack = vec![(cursor, depth)];

        while let Some((cursor, depth)) = stack.last_mut() {
            let depth = *depth;
            let entry = match self.read_next_entry(cursor)? {
                NextEntry::End => {
                    stack.pop();
                    continue;
                }
                NextEntry::Unused(_) => continue,
                NextEntry::Entry(entry) => entry,
            };

            if entry.is_dot() || entry.is_volume_id() || entry.is_long_name() {
                continue;
            }

            let child = entry.is_directory().then(|| entry.cluster());
            if child.is_some() && entry.cluster_high() != 0 {
                log::warn!(
                    "directory {:?}: high cluster word {:#06x} ignored",
                    entry.display_name(),
                    entry.cluster_high()
                );
            }

            let node = TreeNode { depth, entry };
            visit(&node);

            if let Some(cluster) = child {
                if cluster < 2 {
                    return Err(Fat32Error::InvalidCluster { cluster });
                }
                if !visited.insert(cluster) {
                    return Err(Fat32Error::CyclicStructure { cluster });
                }
                log::debug!("entering {:?} at cluster {}", node.entry.display_name(), cluster);
                stack.push((ClusterCursor::new(cluster), depth + 1));
            }
        }

        Ok(())
    }

    /// Walk the whole tree below `root_cluster`, collecting every node.
    pub fn walk(&mut self, root_cluster: u32) -> Result<Vec<TreeNode>> {
        let mut nodes = Vec::new();
        self.list_directory(ClusterCursor::new(root_cluster), 0, |node| {
            nodes.push(node.clone())
        })?;
        Ok(nodes)
    }
}
