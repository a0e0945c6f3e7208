use crate::boot_record::BootRecord;
use crate::common::{Fat12Result, Sector, DATA_AREA_START};
use crate::sector_io::SectorIo;
use std::io::{Read, Seek, Write};

/// Zeroes every sector from the data area start up to the record's total
/// sector count. Returns the number of sectors written.
pub fn zero_data_area<S: Read + Write + Seek>(
    io: &mut SectorIo<S>,
    buffer: &mut Sector,
    record: &BootRecord,
) -> Fat12Result<u32> {
    buffer.fill(0);
    let end = record.total_sectors();
    for index in DATA_AREA_START..end {
        io.write_sector(index, buffer)?;
    }
    Ok(end.saturating_sub(DATA_AREA_START))
}
