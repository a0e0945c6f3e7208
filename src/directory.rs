use crate::common::{
    Fat12Error, Fat12Result, Sector, EMPTY_FOLDER_MARK, ROOT_DIRECTORY_END, ROOT_DIRECTORY_START,
    ROOT_ENTRY_COUNT, SECTOR_SIZE,
};
use crate::sector_io::SectorIo;
use binrw::{BinRead, BinWrite};
use modular_bitfield::prelude::*;
use std::io::{Cursor, Read, Seek, Write};

/// Serialized size of one [`DirEntry`].
pub const DIR_ENTRY_SIZE: usize = 32;
pub const ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / DIR_ENTRY_SIZE;

const _: () = assert!(SECTOR_SIZE % DIR_ENTRY_SIZE == 0);
const _: () = assert!(
    (ROOT_DIRECTORY_END - ROOT_DIRECTORY_START + 1) as usize * ENTRIES_PER_SECTOR
        == ROOT_ENTRY_COUNT as usize
);

/// Packed FAT time stamp, two-second resolution.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct FatTime {
    pub sec: B5,
    pub min: B6,
    pub hour: B5,
}

/// Packed FAT date, years counted from 1980.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct FatDate {
    pub day: B5,
    pub month: B4,
    pub year: B7,
}

/// One 32-byte short-name directory slot.
#[derive(Debug, Clone, BinRead, BinWrite)]
#[brw(little)]
pub struct DirEntry {
    // 0
    pub name: [u8; 8],
    // 8
    pub ext: [u8; 3],
    // 11
    pub attr: u8,
    // 12: case of the short name
    pub winnt_flags: u8,
    // 13: creation time, 10ms units
    pub create_time_secs: u8,
    // 14
    pub create_time: u16,
    // 16
    pub create_date: u16,
    // 18
    pub last_access: u16,
    // 20: always 0 on FAT12
    pub first_cluster_hi: u16,
    // 22
    #[br(map = |b: [u8; 2]| FatTime::from_bytes(b))]
    #[bw(map = |t: &FatTime| t.into_bytes())]
    pub modified_time: FatTime,
    // 24
    #[br(map = |b: [u8; 2]| FatDate::from_bytes(b))]
    #[bw(map = |d: &FatDate| d.into_bytes())]
    pub modified_date: FatDate,
    // 26
    pub first_cluster_lo: u16,
    // 28
    pub size: u32,
}

impl Default for DirEntry {
    fn default() -> Self {
        Self {
            name: [0; 8],
            ext: [0; 3],
            attr: 0,
            winnt_flags: 0,
            create_time_secs: 0,
            create_time: 0,
            create_date: 0,
            last_access: 0,
            first_cluster_hi: 0,
            modified_time: FatTime::new(),
            modified_date: FatDate::new(),
            first_cluster_lo: 0,
            size: 0,
        }
    }
}

impl DirEntry {
    /// A slot holding no entry: all zero except the free mark.
    pub fn free() -> Self {
        let mut entry = Self::default();
        entry.name[0] = EMPTY_FOLDER_MARK;
        entry
    }

    pub fn is_free(&self) -> bool {
        self.name[0] == EMPTY_FOLDER_MARK
    }
}

/// One sector of directory slots.
#[derive(Debug, Clone, BinRead, BinWrite)]
#[brw(little)]
#[br(import(entry_count: u16))]
pub struct Directory {
    #[br(count = entry_count)]
    pub entries: Vec<DirEntry>,
}

impl Directory {
    /// A sector whose every slot is free.
    pub fn free_sector() -> Fat12Result<Self> {
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(ENTRIES_PER_SECTOR)
            .map_err(|_| Fat12Error::Allocation)?;
        entries.resize_with(ENTRIES_PER_SECTOR, DirEntry::free);
        Ok(Self { entries })
    }

    pub fn encode(&self, buffer: &mut Sector) -> Fat12Result<()> {
        self.write_le(&mut Cursor::new(&mut buffer[..]))?;
        Ok(())
    }

    pub fn decode(buffer: &Sector) -> Fat12Result<Self> {
        let count = ENTRIES_PER_SECTOR as u16;
        Ok(Self::read_le_args(&mut Cursor::new(&buffer[..]), (count,))?)
    }
}

/// Marks every slot of the root directory free, writing the same sector to
/// each root directory index.
pub fn write_root_directory<S: Read + Write + Seek>(io: &mut SectorIo<S>) -> Fat12Result<()> {
    let mut sector = [0u8; SECTOR_SIZE];
    Directory::free_sector()?.encode(&mut sector)?;
    for index in ROOT_DIRECTORY_START..=ROOT_DIRECTORY_END {
        io.write_sector(index, &sector)?;
    }
    Ok(())
}
