use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "fecpack")]
#[command(version)]
#[command(about = "Packs conversion output into a streaming ZIP64 archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  fecpack -o out.zip SA17A.csv SB23.csv      pack files into out.zip\n  \
  convert filing.fec | fecpack --events -o out.zip\n  \
                                             pack a converter's event stream\n  \
  fecpack --events | curl -T - https://...   stream the archive to stdout")]
pub struct Cli {
    /// Files to pack as archive entries
    #[arg(value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Output archive path (default: stdout)
    #[arg(short = 'o', long = "output", value_name = "ARCHIVE")]
    pub output: Option<PathBuf>,

    /// Read framed (filename, bytes) events from stdin
    #[arg(long)]
    pub events: bool,

    /// Use the classic 32-bit writer: strict names, no ZIP64
    #[arg(long)]
    pub classic: bool,

    /// Show the first N rows of each produced .csv entry
    #[arg(long, value_name = "ROWS")]
    pub preview: Option<usize>,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// The archive destination, or `None` for stdout (`-o -` counts too).
    pub fn output_path(&self) -> Option<&Path> {
        match &self.output {
            Some(path) if path.as_os_str() != "-" => Some(path),
            _ => None,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}
