//! FAT32 Directory Entry handling
//!
//! Directory entries are 32-byte records. A file's long name is stored in
//! a run of LFN records placed before its short (8.3) record, highest
//! ordinal first.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Fat32Error, Result};

/// Size of one directory record
pub const DIR_ENTRY_SIZE: usize = 32;
/// Length of the space-padded short name (8 + 3, no dot)
pub const SHORT_NAME_LEN: usize = 11;

/// First name byte of the record that ends a directory
pub const END_OF_DIR: u8 = 0x00;
/// First name byte of a deleted record
pub const UNUSED_ENTRY: u8 = 0xE5;
/// Stored in place of a leading 0xE5 that belongs to the name itself
const KANJI_E5: u8 = 0x05;

/// Set on the ordinal byte of the first LFN record of a run
pub const LAST_LONG_ENTRY: u8 = 0x40;
/// UTF-16 units carried by one LFN record
pub const LFN_CHARS_PER_ENTRY: usize = 13;
/// Most LFN records a single name can use
pub const MAX_LFN_FRAGMENTS: u8 = 20;
/// Longest long name, in UTF-16 units
pub const MAX_LONG_NAME_LEN: usize = 255;

// Directory entry attribute flags
/// Read-only file
pub const ATTR_READ_ONLY: u8 = 0x01;
/// Hidden file
pub const ATTR_HIDDEN: u8 = 0x02;
/// System file
pub const ATTR_SYSTEM: u8 = 0x04;
/// Volume label (root directory only)
pub const ATTR_VOLUME_ID: u8 = 0x08;
/// Directory
pub const ATTR_DIRECTORY: u8 = 0x10;
/// Archive flag
pub const ATTR_ARCHIVE: u8 = 0x20;
/// Long filename entry (combination of other flags)
pub const ATTR_LONG_NAME: u8 = ATTR_READ_ONLY | ATTR_HIDDEN | ATTR_SYSTEM | ATTR_VOLUME_ID;

/// One raw directory record
pub type RawRecord = [u8; DIR_ENTRY_SIZE];

/// Where the three name slices of an LFN record live: (offset, units)
const LFN_SLICES: [(usize, usize); 3] = [(1, 5), (14, 6), (28, 2)];

/// True when the attribute byte carries every LFN bit
#[inline]
pub fn is_long_name_attr(attr: u8) -> bool {
    attr & ATTR_LONG_NAME == ATTR_LONG_NAME
}

/// A decoded directory entry: the short record plus its long name, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    /// Short name as stored (8 + 3 chars, space-padded)
    pub short_name: [u8; SHORT_NAME_LEN],
    /// File attributes
    pub attr: u8,
    /// Starting cluster (low word only)
    pub cluster: u16,
    /// Raw high word of the starting cluster, not folded into `cluster`
    pub cluster_high: u16,
    /// File size in bytes
    pub size: u32,
    /// Reassembled long name
    pub long_name: Option<String>,
}

impl DirEntry {
    /// Starting cluster number.
    ///
    /// Only the low 16 bits are used; directories and files starting at
    /// cluster 65536 or above are out of scope. See [`DirEntry::cluster_high()`].
    #[inline]
    pub fn cluster(&self) -> u32 {
        self.cluster as u32
    }

    /// Raw high word of the starting cluster; nonzero means `cluster()`
    /// is truncated.
    #[inline]
    pub fn cluster_high(&self) -> u16 {
        self.cluster_high
    }

    /// Check if entry is a directory
    #[inline]
    pub fn is_directory(&self) -> bool {
        self.attr & ATTR_DIRECTORY != 0
    }

    /// Check if entry is the volume label
    #[inline]
    pub fn is_volume_id(&self) -> bool {
        self.attr & ATTR_VOLUME_ID != 0
    }

    /// Check if the attribute marks a long filename record
    #[inline]
    pub fn is_long_name(&self) -> bool {
        is_long_name_attr(self.attr)
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.attr & ATTR_HIDDEN != 0
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.attr & ATTR_READ_ONLY != 0
    }

    #[inline]
    pub fn is_system(&self) -> bool {
        self.attr & ATTR_SYSTEM != 0
    }

    #[inline]
    pub fn is_archive(&self) -> bool {
        self.attr & ATTR_ARCHIVE != 0
    }

    /// `.`, `..` and anything else whose name starts with a dot
    #[inline]
    pub fn is_dot(&self) -> bool {
        self.short_name[0] == b'.'
    }

    /// Check if the record was deleted
    #[inline]
    pub fn is_unused(&self) -> bool {
        self.short_name[0] == UNUSED_ENTRY
    }

    /// Short name in `NAME.EXT` form, padding removed.
    pub fn short_display_name(&self) -> String {
        let mut raw = self.short_name;
        if raw[0] == KANJI_E5 {
            raw[0] = UNUSED_ENTRY;
        }

        let trim = |bytes: &[u8]| -> String {
            let end = bytes
                .iter()
                .rposition(|&b| b != b' ' && b != 0)
                .map_or(0, |i| i + 1);
            bytes[..end].iter().map(|&b| b as char).collect()
        };

        let base = trim(&raw[..8]);
        let ext = trim(&raw[8..]);
        if ext.is_empty() {
            base
        } else {
            format!("{}.{}", base, ext)
        }
    }

    /// Long name when one was recorded, short name otherwise.
    pub fn display_name(&self) -> String {
        match &self.long_name {
            Some(name) => name.clone(),
            None => self.short_display_name(),
        }
    }
}

/// Decode a short (8.3) record.
///
/// The high cluster word is kept in `cluster_high` but does not take part
/// in `cluster`: the starting cluster is a 16-bit quantity here.
pub fn decode_short_entry(raw: &RawRecord) -> DirEntry {
    let mut short_name = [0u8; SHORT_NAME_LEN];
    short_name.copy_from_slice(&raw[..SHORT_NAME_LEN]);

    DirEntry {
        short_name,
        attr: raw[11],
        cluster_high: LittleEndian::read_u16(&raw[20..22]),
        cluster: LittleEndian::read_u16(&raw[26..28]),
        size: LittleEndian::read_u32(&raw[28..32]),
        long_name: None,
    }
}

/// Collects LFN fragments by ordinal until the short record arrives.
///
/// Fragments are stored at their ordinal's position, so the on-disk
/// high-to-low order does not matter.
#[derive(Debug, Default)]
pub struct LongNameAccumulator {
    units: Vec<u16>,
    highest_ordinal: u8,
}

impl LongNameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.highest_ordinal == 0
    }

    pub fn clear(&mut self) {
        self.units.clear();
        self.highest_ordinal = 0;
    }

    /// Assemble the collected fragments and reset the accumulator.
    ///
    /// The name ends at the first NUL; 0xFFFF padding is dropped.
    pub fn finish(&mut self) -> Result<Option<String>> {
        if self.is_empty() {
            return Ok(None);
        }
        let ordinal = self.highest_ordinal;
        let units = std::mem::take(&mut self.units);
        self.highest_ordinal = 0;

        let name: Vec<u16> = units
            .into_iter()
            .take_while(|&u| u != 0x0000)
            .filter(|&u| u != 0xFFFF)
            .collect();

        if name.len() > MAX_LONG_NAME_LEN {
            return Err(Fat32Error::LongNameOverflow { ordinal });
        }
        if name.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf16_lossy(&name)))
    }

    fn fill(&mut self, position: usize, value: u16) {
        if self.units.len() <= position {
            self.units.resize(position + 1, 0xFFFF);
        }
        self.units[position] = value;
    }
}

/// Store one LFN record's 13 characters in the accumulator.
///
/// Returns the record's 1-based ordinal.
pub fn decode_long_name_fragment(raw: &RawRecord, acc: &mut LongNameAccumulator) -> Result<u8> {
    let ordinal = raw[0] & !LAST_LONG_ENTRY;
    if ordinal == 0 {
        return Err(Fat32Error::MalformedLongName { ordinal: raw[0] });
    }
    if ordinal > MAX_LFN_FRAGMENTS {
        return Err(Fat32Error::LongNameOverflow { ordinal });
    }

    let base = (ordinal as usize - 1) * LFN_CHARS_PER_ENTRY;
    let mut position = base;
    for (offset, count) in LFN_SLICES {
        for i in 0..count {
            let at = offset + i * 2;
            acc.fill(position, LittleEndian::read_u16(&raw[at..at + 2]));
            position += 1;
        }
    }

    if raw[0] & LAST_LONG_ENTRY != 0 {
        acc.fill(base + LFN_CHARS_PER_ENTRY, 0x0000);
    }
    acc.highest_ordinal = acc.highest_ordinal.max(ordinal);
    Ok(ordinal)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a short record.
    pub(crate) fn short_record(name: &[u8; 11], attr: u8, cluster: u16, size: u32) -> RawRecord {
        let mut data = [0u8; 32];
        data[..11].copy_from_slice(name);
        data[11] = attr;
        data[26..28].copy_from_slice(&cluster.to_le_bytes());
        data[28..32].copy_from_slice(&size.to_le_bytes());
        data
    }

    /// Build one LFN record carrying up to 13 characters of `part`.
    pub(crate) fn lfn_record(ordinal: u8, last: bool, part: &str) -> RawRecord {
        let mut units: Vec<u16> = part.encode_utf16().collect();
        assert!(units.len() <= LFN_CHARS_PER_ENTRY);
        if units.len() < LFN_CHARS_PER_ENTRY {
            units.push(0x0000);
        }
        units.resize(LFN_CHARS_PER_ENTRY, 0xFFFF);

        let mut data = [0u8; 32];
        data[0] = if last { ordinal | LAST_LONG_ENTRY } else { ordinal };
        data[11] = ATTR_LONG_NAME;
        let mut i = 0;
        for (offset, count) in LFN_SLICES {
            for k in 0..count {
                let at = offset + k * 2;
                data[at..at + 2].copy_from_slice(&units[i].to_le_bytes());
                i += 1;
            }
        }
        data
    }

    #[test]
    fn test_short_entry_fields() {
        let raw = short_record(b"FOO        ", ATTR_ARCHIVE, 5, 1234);
        let entry = decode_short_entry(&raw);

        assert_eq!(entry.short_display_name(), "FOO");
        assert_eq!(entry.attr, ATTR_ARCHIVE);
        assert!(entry.is_archive());
        assert_eq!(entry.size, 1234);
        assert_eq!(entry.cluster(), 5);
        assert_eq!(entry.long_name, None);
        assert_eq!(entry.display_name(), "FOO");
    }

    #[test]
    fn test_short_name_with_extension() {
        let entry = decode_short_entry(&short_record(b"A       TXT", ATTR_ARCHIVE, 7, 3));
        assert_eq!(entry.short_display_name(), "A.TXT");
        assert_eq!(&entry.short_name, b"A       TXT");
    }

    #[test]
    fn test_leading_e5_escape() {
        let entry = decode_short_entry(&short_record(b"\x05BC        ", ATTR_ARCHIVE, 3, 0));
        assert!(!entry.is_unused());
        assert_eq!(entry.short_display_name(), "\u{e5}BC");
    }

    #[test]
    fn test_high_cluster_word_is_not_folded_in() {
        let mut raw = short_record(b"BIG        ", ATTR_DIRECTORY, 0x0200, 0);
        raw[20..22].copy_from_slice(&1u16.to_le_bytes());
        let entry = decode_short_entry(&raw);
        assert_eq!(entry.cluster(), 0x0200);
        assert_eq!(entry.cluster_high(), 1);

        let small = decode_short_entry(&short_record(b"SMALL      ", ATTR_DIRECTORY, 0x0200, 0));
        assert_eq!(small.cluster_high(), 0);
    }

    #[test]
    fn test_attributes() {
        let entry = decode_short_entry(&short_record(b"DOCS       ", ATTR_DIRECTORY, 3, 0));
        assert!(entry.is_directory());
        assert!(!entry.is_volume_id());
        assert!(!entry.is_long_name());

        let label = decode_short_entry(&short_record(b"MYDISK     ", ATTR_VOLUME_ID, 0, 0));
        assert!(label.is_volume_id());

        let lfn = decode_short_entry(&lfn_record(1, true, "x"));
        assert!(lfn.is_long_name());
        // LFN detection is a mask check, extra bits do not hide it
        assert!(is_long_name_attr(ATTR_LONG_NAME | ATTR_ARCHIVE));
        assert!(!is_long_name_attr(ATTR_HIDDEN | ATTR_SYSTEM));
    }

    #[test]
    fn test_dot_entries() {
        let dot = decode_short_entry(&short_record(b".          ", ATTR_DIRECTORY, 3, 0));
        let dotdot = decode_short_entry(&short_record(b"..         ", ATTR_DIRECTORY, 0, 0));
        assert!(dot.is_dot());
        assert!(dotdot.is_dot());
        assert_eq!(dotdot.short_display_name(), "..");
    }

    #[test]
    fn test_two_fragments_in_disk_order() {
        let mut acc = LongNameAccumulator::new();
        // on disk: ordinal 2 (last) first, then ordinal 1
        assert_eq!(decode_long_name_fragment(&lfn_record(2, true, "Name.txt"), &mut acc).unwrap(), 2);
        assert_eq!(decode_long_name_fragment(&lfn_record(1, false, "A_Very_Long_F"), &mut acc).unwrap(), 1);
        assert_eq!(acc.finish().unwrap().as_deref(), Some("A_Very_Long_FName.txt"));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_fragment_order_does_not_matter() {
        let mut acc = LongNameAccumulator::new();
        decode_long_name_fragment(&lfn_record(1, false, "0123456789abc"), &mut acc).unwrap();
        decode_long_name_fragment(&lfn_record(2, true, "def"), &mut acc).unwrap();
        assert_eq!(acc.finish().unwrap().as_deref(), Some("0123456789abcdef"));
    }

    #[test]
    fn test_exact_multiple_of_thirteen() {
        let mut acc = LongNameAccumulator::new();
        decode_long_name_fragment(&lfn_record(1, true, "exactly13char"), &mut acc).unwrap();
        assert_eq!(acc.finish().unwrap().as_deref(), Some("exactly13char"));
    }

    #[test]
    fn test_invalid_ordinals() {
        let mut acc = LongNameAccumulator::new();
        let mut raw = lfn_record(1, true, "x");
        raw[0] = LAST_LONG_ENTRY;
        assert!(matches!(
            decode_long_name_fragment(&raw, &mut acc),
            Err(Fat32Error::MalformedLongName { ordinal: 0x40 })
        ));

        raw[0] = LAST_LONG_ENTRY | 21;
        assert!(matches!(
            decode_long_name_fragment(&raw, &mut acc),
            Err(Fat32Error::LongNameOverflow { ordinal: 21 })
        ));
    }

    #[test]
    fn test_name_longer_than_255_rejected() {
        let mut acc = LongNameAccumulator::new();
        let chunk = "abcdefghijklm";
        for ordinal in (1..=20u8).rev() {
            decode_long_name_fragment(&lfn_record(ordinal, ordinal == 20, chunk), &mut acc).unwrap();
        }
        assert!(matches!(acc.finish(), Err(Fat32Error::LongNameOverflow { ordinal: 20 })));
    }

    #[test]
    fn test_name_of_255_accepted() {
        let name: String = std::iter::repeat('z').take(255).collect();
        let mut acc = LongNameAccumulator::new();
        for ordinal in (1..=20u8).rev() {
            let start = (ordinal as usize - 1) * 13;
            let end = (start + 13).min(255);
            decode_long_name_fragment(&lfn_record(ordinal, ordinal == 20, &name[start..end]), &mut acc)
                .unwrap();
        }
        assert_eq!(acc.finish().unwrap().map(|n| n.len()), Some(255));
    }

    #[test]
    fn test_non_ascii_long_name() {
        let mut acc = LongNameAccumulator::new();
        decode_long_name_fragment(&lfn_record(1, true, "résumé.doc"), &mut acc).unwrap();
        assert_eq!(acc.finish().unwrap().as_deref(), Some("résumé.doc"));
    }
}
