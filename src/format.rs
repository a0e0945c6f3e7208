use crate::boot_record::{write_boot_sector, BootRecord};
use crate::common::{Fat12Error, Fat12Result, Sector, BOOT_SECTOR};
use crate::data_area::zero_data_area;
use crate::directory::write_root_directory;
use crate::fat::write_fat_tables;
use crate::sector_io::{allocate_sector, SectorIo};
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::Path;

/// Drives a full formatting pass over one exclusively owned store.
///
/// The store and the shared sector buffer live as long as the formatter and
/// are released on drop, on success and on every error path alike.
#[derive(Debug)]
pub struct Formatter<S> {
    io: SectorIo<S>,
    buffer: Box<Sector>,
}

impl<S: Read + Write + Seek> Formatter<S> {
    pub fn new(store: S) -> Fat12Result<Self> {
        Ok(Self {
            io: SectorIo::new(store),
            buffer: allocate_sector()?,
        })
    }

    /// Writes boot sector, both FATs, the root directory and the data area,
    /// then reads sector 0 back and returns the decoded record.
    pub fn run(&mut self) -> Fat12Result<BootRecord> {
        self.buffer.fill(0);
        let record = write_boot_sector(&mut self.io, &mut self.buffer)?;
        debug!("boot sector written, {} sectors", record.total_sectors());

        write_fat_tables(&mut self.io, &mut self.buffer)?;
        debug!("FAT tables written");

        write_root_directory(&mut self.io)?;
        debug!("root directory slots marked free");

        let zeroed = zero_data_area(&mut self.io, &mut self.buffer, &record)?;
        debug!("data area zeroed, {} sectors", zeroed);

        self.io.read_sector(BOOT_SECTOR, &mut self.buffer)?;
        BootRecord::decode(&self.buffer)
    }

    pub fn into_inner(self) -> S {
        self.io.into_inner()
    }
}

/// Opens the image at `path` for read/write, creating it with mode 0644 when
/// absent, and formats it. Existing contents are overwritten, not truncated.
pub fn format_path<P: AsRef<Path>>(path: P) -> Fat12Result<BootRecord> {
    let path = path.as_ref();
    let file = open_store(path).map_err(|source| Fat12Error::StoreOpen {
        path: path.to_path_buf(),
        source,
    })?;
    info!("formatting {}", path.display());

    let record = Formatter::new(file)?.run()?;
    info!(
        "{} formatted as {}: {} sectors of {} bytes",
        path.display(),
        record.oem_name(),
        record.total_sectors(),
        record.sector_size
    );
    Ok(record)
}

fn open_store(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{
        DATA_AREA_START, EMPTY_FOLDER_MARK, FAT_TABLE_1_START, FAT_TABLE_2_START,
        ROOT_DIRECTORY_END, ROOT_DIRECTORY_START, SECTOR_SIZE,
    };
    use crate::directory::DIR_ENTRY_SIZE;
    use crate::fat::get_fat_entry;
    use std::io::{self, Cursor, SeekFrom};

    const IMAGE_SIZE: usize = 2880 * SECTOR_SIZE;

    fn format_in_memory(initial: Vec<u8>) -> Vec<u8> {
        let mut formatter = Formatter::new(Cursor::new(initial)).unwrap();
        formatter.run().unwrap();
        formatter.into_inner().into_inner()
    }

    fn scratch_path(test: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("fat12-format-{}-{}.img", test, std::process::id()))
    }

    /// Store that moves only 100 bytes on every write after the first `limit`.
    struct FailingStore {
        inner: Cursor<Vec<u8>>,
        limit: usize,
        writes: usize,
    }

    impl Read for FailingStore {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Write for FailingStore {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            if self.writes > self.limit {
                self.inner.write(&buf[..100])
            } else {
                self.inner.write(buf)
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FailingStore {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    fn sector(image: &[u8], index: u32) -> &[u8] {
        let from = index as usize * SECTOR_SIZE;
        &image[from..from + SECTOR_SIZE]
    }

    #[test]
    fn run_reports_written_geometry() {
        let mut formatter = Formatter::new(Cursor::new(Vec::new())).unwrap();
        let record = formatter.run().unwrap();
        assert_eq!(record.sector_size, 512);
        assert_eq!(record.sectors_per_cluster, 1);
        assert_eq!(record.reserved_sector_count, 1);
        assert_eq!(record.number_of_fats, 2);
        assert_eq!(record.number_of_dirents, 224);
        assert_eq!(record.sector_count, 2880);
        assert_eq!(record.media_type, 0xF0);
        assert_eq!(record.fat_size_sectors, 9);
        assert_eq!(record.sectors_per_track, 18);
        assert_eq!(record.nheads, 2);
    }

    #[test]
    fn full_image_layout() {
        let image = format_in_memory(Vec::new());
        assert_eq!(image.len(), IMAGE_SIZE);

        let boot = sector(&image, 0);
        assert_eq!(boot[0], 0xEB);
        assert_eq!(boot[2], 0x90);
        assert_eq!(&boot[3..11], b"FAT12\0\0\0");
        assert_eq!(u16::from_le_bytes([boot[11], boot[12]]), 512);
        assert!(boot[36..].iter().all(|b| *b == 0));

        for start in [FAT_TABLE_1_START, FAT_TABLE_2_START] {
            let fat: Vec<u8> = (start..start + 9)
                .flat_map(|s| sector(&image, s).to_vec())
                .collect();
            assert_eq!(get_fat_entry(&fat, 0), 0xFF0);
            assert_eq!(get_fat_entry(&fat, 1), 0xFFF);
            let entries = fat.len() * 2 / 3;
            assert!((2..entries).all(|i| get_fat_entry(&fat, i) == 0));
        }

        for index in ROOT_DIRECTORY_START..=ROOT_DIRECTORY_END {
            for slot in sector(&image, index).chunks(DIR_ENTRY_SIZE) {
                assert_eq!(slot[0], EMPTY_FOLDER_MARK);
                assert!(slot[1..].iter().all(|b| *b == 0));
            }
        }

        let data = &image[DATA_AREA_START as usize * SECTOR_SIZE..];
        assert!(data.iter().all(|b| *b == 0));
    }

    #[test]
    fn stale_image_fully_overwritten() {
        let fresh = format_in_memory(Vec::new());
        let stale = format_in_memory(vec![0xA5; IMAGE_SIZE]);
        assert!(fresh == stale);
    }

    #[test]
    fn formatting_twice_is_identical() {
        let once = format_in_memory(Vec::new());
        let twice = format_in_memory(once.clone());
        assert!(once == twice);
    }

    #[test]
    fn short_write_aborts_run() {
        // boot sector, FAT sectors 2..=9 and 11..=18, then 1 and 10, root 19..=32
        for (limit, expected) in [(0, 0), (5, 6), (17, 1), (18, 10), (25, 25), (100, 100)] {
            let store = FailingStore { inner: Cursor::new(Vec::new()), limit, writes: 0 };
            let mut formatter = Formatter::new(store).unwrap();
            match formatter.run() {
                Err(Fat12Error::ShortTransfer { sector: s, transferred: 100 }) => {
                    assert_eq!(s, expected)
                }
                other => panic!("unexpected result: {:?}", other),
            }
            assert_eq!(formatter.into_inner().writes, limit + 1);
        }
    }

    #[test]
    fn format_path_creates_image() {
        let path = scratch_path("creates-image");
        if path.exists() {
            std::fs::remove_file(&path).unwrap();
        }

        let record = format_path(&path).unwrap();
        assert_eq!(record, BootRecord::default());
        let first = std::fs::read(&path).unwrap();
        assert_eq!(first.len(), 1_474_560);

        format_path(&path).unwrap();
        let second = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(first == second);
    }

    #[test]
    fn unopenable_path_is_store_open_fault() {
        let path = scratch_path("unopenable").join("floppy.img");
        match format_path(&path) {
            Err(Fat12Error::StoreOpen { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
