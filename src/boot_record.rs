use crate::common::{
    Fat12Result, Sector, BOOT_SECTOR, MEDIA_TYPE, ROOT_ENTRY_COUNT, SECTORS_PER_FAT, SECTOR_SIZE,
    TOTAL_SECTORS,
};
use crate::sector_io::SectorIo;
use binrw::{binrw, BinRead, BinWrite};
use std::fmt::{Display, Formatter};
use std::io::{Cursor, Read, Seek, Write};

/// Serialized size of [`BootRecord`] in bytes.
pub const BOOT_RECORD_SIZE: usize = 36;

const _: () = assert!(BOOT_RECORD_SIZE <= SECTOR_SIZE);

/// Short jump over the parameter block followed by a NOP.
pub const BOOT_JUMP: [u8; 3] = [0xEB, 0x00, 0x90];
pub const OEM_NAME: &str = "FAT12";

/// BIOS parameter block at the start of sector 0.
///
/// Fields are written little-endian in declaration order; the byte offset of
/// each field is noted beside it.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootRecord {
    // 0: x86 jump to boot code. No boot code is written, the jump is cosmetic.
    pub bootjmp: [u8; 3],
    // 3: OEM name, NUL padded.
    pub oem_id: [u8; 8],
    // 11
    pub sector_size: u16,
    // 13
    pub sectors_per_cluster: u8,
    // 14: includes the boot sector itself.
    pub reserved_sector_count: u16,
    // 16
    pub number_of_fats: u8,
    // 17: root directory slots.
    pub number_of_dirents: u16,
    // 19: when 0, the count lives in `sector_count_large`.
    pub sector_count: u16,
    // 21: media descriptor, also the low byte of FAT entry 0.
    pub media_type: u8,
    // 22: sectors in one FAT copy.
    pub fat_size_sectors: u16,
    // 24
    pub sectors_per_track: u16,
    // 26
    pub nheads: u16,
    // 28
    pub sectors_hidden: u32,
    // 32
    pub sector_count_large: u32,
}

impl Default for BootRecord {
    /// Geometry of a 1.44M 3.5" floppy.
    fn default() -> Self {
        Self {
            bootjmp: BOOT_JUMP,
            oem_id: oem_id(OEM_NAME),
            sector_size: SECTOR_SIZE as u16,
            sectors_per_cluster: 1,
            reserved_sector_count: 1,
            number_of_fats: 2,
            number_of_dirents: ROOT_ENTRY_COUNT,
            sector_count: TOTAL_SECTORS,
            media_type: MEDIA_TYPE,
            fat_size_sectors: SECTORS_PER_FAT,
            sectors_per_track: 18,
            nheads: 2,
            sectors_hidden: 0,
            sector_count_large: 0,
        }
    }
}

impl BootRecord {
    /// Writes the record into the first [`BOOT_RECORD_SIZE`] bytes of
    /// `buffer`. The remaining bytes are left as they were.
    pub fn encode(&self, buffer: &mut Sector) -> Fat12Result<()> {
        self.write_le(&mut Cursor::new(&mut buffer[..BOOT_RECORD_SIZE]))?;
        Ok(())
    }

    pub fn decode(buffer: &Sector) -> Fat12Result<Self> {
        Ok(Self::read_le(&mut Cursor::new(&buffer[..BOOT_RECORD_SIZE]))?)
    }

    /// Total sectors on the volume, whichever field holds it.
    pub fn total_sectors(&self) -> u32 {
        if self.sector_count == 0 {
            self.sector_count_large
        } else {
            self.sector_count as u32
        }
    }

    pub fn oem_name(&self) -> String {
        self.oem_id
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| *b as char)
            .collect()
    }
}

impl Display for BootRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "sector_size: {}", self.sector_size)?;
        writeln!(f, "sectors_per_cluster: {}", self.sectors_per_cluster)?;
        writeln!(f, "reserved_sector_count: {}", self.reserved_sector_count)?;
        writeln!(f, "number_of_fats: {}", self.number_of_fats)?;
        writeln!(f, "number_of_dirents: {}", self.number_of_dirents)?;
        write!(f, "sector_count: {}", self.sector_count)
    }
}

/// Left-justifies `name` in an 8-byte NUL padded field, truncating if longer.
fn oem_id(name: &str) -> [u8; 8] {
    let mut id = [0u8; 8];
    for (dst, src) in id.iter_mut().zip(name.bytes()) {
        *dst = src;
    }
    id
}

/// Encodes the default record into `buffer` and writes it to sector 0.
///
/// The caller zeroes `buffer` first; whatever sits past the record ends up in
/// the image.
pub fn write_boot_sector<S: Read + Write + Seek>(
    io: &mut SectorIo<S>,
    buffer: &mut Sector,
) -> Fat12Result<BootRecord> {
    let record = BootRecord::default();
    record.encode(buffer)?;
    io.write_sector(BOOT_SECTOR, buffer)?;
    Ok(record)
}
