//! Main entry point for the fecpack CLI.
//!
//! Wires a producer — either the files named on the command line or a
//! converter's framed event stream on stdin — into one of the two archive
//! writers, and the writer into a file or stdout sink. Payload bytes flow
//! straight through; nothing is buffered beyond the open entry's counters.

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::AsyncReadExt;

use fecpack::{
    Cli, ClassicWriter, CsvError, CsvReader, FeedReader, FileSink, Sink, StdoutSink, Zip64Writer,
    ZipWrite,
};

/// Read size for file inputs.
const CHUNK_SIZE: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.events && !cli.inputs.is_empty() {
        bail!("--events reads from stdin; FILE arguments are not allowed with it");
    }
    if !cli.events && cli.inputs.is_empty() {
        bail!("nothing to pack: pass FILE arguments or --events");
    }

    let sink: Box<dyn Sink> = match cli.output_path() {
        Some(path) => Box::new(
            FileSink::create(path)
                .await
                .with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(StdoutSink::new()),
    };

    let mut writer: Box<dyn ZipWrite> = if cli.classic {
        Box::new(ClassicWriter::new(sink))
    } else {
        Box::new(Zip64Writer::new(sink))
    };

    let mut previews = Previews::new(cli.preview);
    let report = if cli.events {
        pack_events(writer.as_mut(), &mut previews, &cli).await?
    } else {
        pack_files(writer.as_mut(), &mut previews, &cli).await?
    };
    writer.close().await?;

    if !cli.is_very_quiet() {
        eprintln!(
            "packed {} entries, {} of content",
            report.entries,
            format_size(report.payload_bytes)
        );
    }
    previews.print();

    Ok(())
}

#[derive(Default)]
struct Report {
    entries: usize,
    payload_bytes: u64,
}

/// Pack the files named on the command line, streaming each in fixed-size
/// chunks under its base filename.
async fn pack_files(
    writer: &mut dyn ZipWrite,
    previews: &mut Previews,
    cli: &Cli,
) -> Result<Report> {
    let mut report = Report::default();
    let mut buf = vec![0u8; CHUNK_SIZE];

    for path in &cli.inputs {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .with_context(|| format!("not a file path: {}", path.display()))?;

        if !cli.is_quiet() {
            eprintln!("  packing: {name}");
        }

        let mut file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("cannot open {}", path.display()))?;

        let mut wrote_any = false;
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.push(&name, &buf[..n]).await?;
            previews.feed(&name, &buf[..n]);
            report.payload_bytes += n as u64;
            wrote_any = true;
        }
        if !wrote_any {
            // An empty file still gets an entry
            writer.push(&name, b"").await?;
        }
        report.entries += 1;
    }

    Ok(report)
}

/// Pack a converter's event stream from stdin until its end-of-stream frame.
async fn pack_events(
    writer: &mut dyn ZipWrite,
    previews: &mut Previews,
    cli: &Cli,
) -> Result<Report> {
    let mut report = Report::default();
    let mut feed = FeedReader::new(tokio::io::stdin());
    let mut last_name: Option<String> = None;

    while let Some(chunk) = feed.next().await? {
        if last_name.as_deref() != Some(chunk.name.as_str()) {
            if !cli.is_quiet() {
                eprintln!("  packing: {}", chunk.name);
            }
            last_name = Some(chunk.name.clone());
            report.entries += 1;
        }
        writer.push(&chunk.name, &chunk.data).await?;
        previews.feed(&chunk.name, &chunk.data);
        report.payload_bytes += chunk.data.len() as u64;
    }

    Ok(report)
}

/// Head-of-file previews for produced `.csv` entries, parsed in flight so no
/// content has to be kept around.
struct Previews {
    cutoff: Option<usize>,
    readers: Vec<(String, std::result::Result<CsvReader, CsvError>)>,
}

impl Previews {
    fn new(cutoff: Option<usize>) -> Self {
        Self {
            cutoff,
            readers: Vec::new(),
        }
    }

    fn feed(&mut self, name: &str, data: &[u8]) {
        let Some(cutoff) = self.cutoff else { return };
        if !name.ends_with(".csv") {
            return;
        }
        if !self.readers.iter().any(|(n, _)| n == name) {
            self.readers
                .push((name.to_string(), Ok(CsvReader::with_cutoff(cutoff))));
        }
        if let Some((_, state)) = self.readers.iter_mut().find(|(n, _)| n == name) {
            if let Ok(reader) = state.as_mut() {
                if let Err(e) = reader.process(data) {
                    *state = Err(e);
                }
            }
        }
    }

    fn print(&self) {
        for (name, state) in &self.readers {
            eprintln!("--- {name} ---");
            match state {
                Ok(reader) => {
                    for row in &reader.rows {
                        eprintln!("{}", row.join(","));
                    }
                }
                Err(e) => eprintln!("(malformed csv: {e})"),
            }
        }
    }
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
