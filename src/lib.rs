pub mod common;
pub mod sector_io;
pub mod boot_record;
pub mod fat;
pub mod directory;
pub mod data_area;
pub mod format;
pub mod logging;
