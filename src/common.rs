use std::path::PathBuf;
use thiserror::Error;

/// Bytes per sector. Every read and write moves exactly this much.
pub const SECTOR_SIZE: usize = 512;

pub const BOOT_SECTOR: u32 = 0;

/// FAT copy 1 spans sectors 1..=9, FAT copy 2 spans 10..=18.
pub const FAT_TABLE_1_START: u32 = 1;
pub const FAT_TABLE_2_START: u32 = 10;
pub const FAT_TABLE_2_END: u32 = 18;

pub const ROOT_DIRECTORY_START: u32 = 19;
pub const ROOT_DIRECTORY_END: u32 = 32;
pub const DATA_AREA_START: u32 = 33;

/// 1.44M floppy: 80 cylinders, 2 heads, 18 sectors per track.
pub const TOTAL_SECTORS: u16 = 2880;
pub const ROOT_ENTRY_COUNT: u16 = 224;
pub const SECTORS_PER_FAT: u16 = 9;
pub const MEDIA_TYPE: u8 = 0xF0;

/// First byte of a directory entry name marking the slot as free.
pub const EMPTY_FOLDER_MARK: u8 = 0xE5;

/// One sector worth of bytes.
pub type Sector = [u8; SECTOR_SIZE];

#[derive(Debug, Error)]
pub enum Fat12Error {
    #[error("unable to open image file {}", path.display())]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not allocate sector buffer")]
    Allocation,
    #[error("storage error")]
    Storage(#[from] std::io::Error),
    #[error("seek to sector {sector} did not land on its offset")]
    SeekMismatch { sector: u32 },
    #[error("short transfer on sector {sector}: {transferred} bytes moved")]
    ShortTransfer { sector: u32, transferred: usize },
    #[error("encoding error")]
    Encoding(#[from] binrw::Error),
}

pub type Fat12Result<T> = Result<T, Fat12Error>;
