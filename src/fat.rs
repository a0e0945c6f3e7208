use crate::common::{
    Fat12Result, Sector, FAT_TABLE_1_START, FAT_TABLE_2_END, FAT_TABLE_2_START, MEDIA_TYPE,
    SECTOR_SIZE,
};
use crate::sector_io::SectorIo;
use log::debug;
use std::fmt::{Display, Formatter};
use std::io::{Read, Seek, Write};

/// Entry 0 carries the media descriptor in its low byte.
pub const FAT_MEDIA_ENTRY: u16 = 0xF00 | MEDIA_TYPE as u16;
pub const FAT_END_OF_CHAIN: u16 = 0xFFF;
pub const FAT_BAD_CLUSTER: u16 = 0xFF7;

const ENTRY_MASK: u16 = 0x0FFF;

/// Number of whole 12-bit entries that fit in one FAT sector.
pub const ENTRIES_PER_SECTOR: usize = SECTOR_SIZE * 2 / 3;

/// Stores the 12-bit `value` as entry `index` of a packed FAT12 table.
///
/// Entries come in pairs sharing three bytes. An even entry owns the first
/// byte and the low nibble of the second; an odd entry owns the high nibble of
/// the first and the whole second byte. The neighbour's nibble is preserved and
/// bits of `value` above the twelfth are ignored.
pub fn set_fat_entry(buffer: &mut [u8], index: usize, value: u16) {
    let offset = index * 3 / 2;
    let value = value & ENTRY_MASK;
    if index % 2 == 0 {
        buffer[offset] = (value & 0xFF) as u8;
        buffer[offset + 1] = (buffer[offset + 1] & 0xF0) | (value >> 8) as u8;
    } else {
        buffer[offset] = (buffer[offset] & 0x0F) | ((value & 0x0F) << 4) as u8;
        buffer[offset + 1] = (value >> 4) as u8;
    }
}

pub fn get_fat_entry(buffer: &[u8], index: usize) -> u16 {
    let offset = index * 3 / 2;
    let word = u16::from_le_bytes([buffer[offset], buffer[offset + 1]]);
    if index % 2 == 0 {
        word & ENTRY_MASK
    } else {
        word >> 4
    }
}

/// 0x000 free
///
/// 0x001 reserved
///
/// 0x002 - 0xFEF next cluster in the chain
///
/// 0xFF0 - 0xFF6 reserved
///
/// 0xFF7 bad cluster
///
/// 0xFF8 - 0xFFF last cluster of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterEntry {
    Free,
    Next(u16),
    Reserved(u16),
    Bad,
    EndOfChain(u16),
}

impl From<u16> for ClusterEntry {
    fn from(raw: u16) -> Self {
        match raw & ENTRY_MASK {
            0x000 => ClusterEntry::Free,
            v @ 0x002..=0xFEF => ClusterEntry::Next(v),
            FAT_BAD_CLUSTER => ClusterEntry::Bad,
            v @ 0xFF8..=0xFFF => ClusterEntry::EndOfChain(v),
            v => ClusterEntry::Reserved(v),
        }
    }
}

impl From<ClusterEntry> for u16 {
    fn from(entry: ClusterEntry) -> Self {
        match entry {
            ClusterEntry::Free => 0x000,
            ClusterEntry::Bad => FAT_BAD_CLUSTER,
            ClusterEntry::Next(v) | ClusterEntry::Reserved(v) | ClusterEntry::EndOfChain(v) => v,
        }
    }
}

impl Display for ClusterEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterEntry::Free => write!(f, "Free"),
            ClusterEntry::Next(v) => write!(f, "{}", v),
            ClusterEntry::Reserved(v) => write!(f, "Reserved({:#05x})", v),
            ClusterEntry::Bad => write!(f, "Bad"),
            ClusterEntry::EndOfChain(_) => write!(f, "EndOfChain"),
        }
    }
}

/// Decodes every whole entry held in one FAT sector.
pub fn sector_entries(buffer: &Sector) -> Vec<ClusterEntry> {
    (0..ENTRIES_PER_SECTOR)
        .map(|i| ClusterEntry::from(get_fat_entry(buffer, i)))
        .collect()
}

/// Writes both FAT copies: the first sector of each carries the two reserved
/// entries, every other FAT sector is zero (all clusters free).
///
/// `buffer` is cleared before use.
pub fn write_fat_tables<S: Read + Write + Seek>(
    io: &mut SectorIo<S>,
    buffer: &mut Sector,
) -> Fat12Result<()> {
    buffer.fill(0);
    for sector in (FAT_TABLE_1_START + 1)..=FAT_TABLE_2_END {
        if sector == FAT_TABLE_2_START {
            continue;
        }
        io.write_sector(sector, buffer)?;
    }

    set_fat_entry(buffer, 0, FAT_MEDIA_ENTRY);
    set_fat_entry(buffer, 1, FAT_END_OF_CHAIN);
    let entries = sector_entries(buffer);
    for start in [FAT_TABLE_1_START, FAT_TABLE_2_START] {
        debug!(
            "writing FAT copy at sector {}: entry 0 {}, entry 1 {}",
            start, entries[0], entries[1]
        );
        io.write_sector(start, buffer)?;
    }
    Ok(())
}
