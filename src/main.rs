use clap::Parser;
use fat12_format::format::format_path;
use fat12_format::logging;
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Formats a raw image file as an empty 1.44M FAT12 floppy.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Image file to format, created if it does not exist.
    image: PathBuf,

    /// Log progress to stderr (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if logging::init(cli.verbose).is_err() {
        eprintln!("logger already initialized");
    }

    match format_path(&cli.image) {
        Ok(record) => {
            println!("{}", record);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let mut message = err.to_string();
            let mut source = err.source();
            while let Some(cause) = source {
                message.push_str(&format!(": {}", cause));
                source = cause.source();
            }
            error!("{}", message);
            ExitCode::FAILURE
        }
    }
}
