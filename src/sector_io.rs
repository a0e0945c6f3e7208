use crate::common::{Fat12Error, Fat12Result, Sector, SECTOR_SIZE};
use std::io::{Read, Seek, SeekFrom, Write};

/// Positioned whole-sector access over a random-access byte store.
///
/// Every call seeks and transfers directly; nothing is buffered between calls.
/// A seek that lands elsewhere, or a transfer that moves fewer than
/// [`SECTOR_SIZE`] bytes, is an error and is never retried.
#[derive(Debug)]
pub struct SectorIo<S> {
    store: S,
}

impl<S: Read + Write + Seek> SectorIo<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Writes one sector at `index * SECTOR_SIZE`, growing the store if the
    /// offset is past its end.
    pub fn write_sector(&mut self, index: u32, buffer: &Sector) -> Fat12Result<()> {
        self.seek_to(index)?;
        let transferred = self.store.write(buffer)?;
        if transferred != SECTOR_SIZE {
            return Err(Fat12Error::ShortTransfer { sector: index, transferred });
        }
        Ok(())
    }

    pub fn read_sector(&mut self, index: u32, buffer: &mut Sector) -> Fat12Result<()> {
        self.seek_to(index)?;
        let transferred = self.store.read(buffer)?;
        if transferred != SECTOR_SIZE {
            return Err(Fat12Error::ShortTransfer { sector: index, transferred });
        }
        Ok(())
    }

    fn seek_to(&mut self, index: u32) -> Fat12Result<()> {
        let offset = index as u64 * SECTOR_SIZE as u64;
        let dest = self.store.seek(SeekFrom::Start(offset))?;
        if dest != offset {
            return Err(Fat12Error::SeekMismatch { sector: index });
        }
        Ok(())
    }
}

/// Allocates a zeroed sector on the heap, reporting exhaustion as
/// [`Fat12Error::Allocation`] instead of aborting.
pub fn allocate_sector() -> Fat12Result<Box<Sector>> {
    let mut bytes: Vec<u8> = Vec::new();
    bytes.try_reserve_exact(SECTOR_SIZE).map_err(|_| Fat12Error::Allocation)?;
    bytes.resize(SECTOR_SIZE, 0);
    bytes.into_boxed_slice().try_into().map_err(|_| Fat12Error::Allocation)
}
