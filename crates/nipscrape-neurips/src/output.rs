//! Output layout, the shared paper sink, and final bundling

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use nipscrape_core::{CsvSink, JsonLinesSink, sanitize_filename, write_json_file, zip_directory, zip_files};

use crate::record::{CSV_HEADER, PaperRecord};

/// Where a run writes its files, all under one root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// One `<sanitized-title>.json` per paper
    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join("metadata")
    }

    /// One `<sanitized-title>.pdf` per paper
    pub fn pdf_dir(&self) -> PathBuf {
        self.root.join("pdfs")
    }

    /// Line-delimited JSON of every record
    pub fn json_path(&self) -> PathBuf {
        self.root.join("output.json")
    }

    /// Quoted CSV of every record
    pub fn csv_path(&self) -> PathBuf {
        self.root.join("output.csv")
    }

    pub fn metadata_bundle(&self) -> PathBuf {
        self.root.join("metadata.zip")
    }

    pub fn incremental_bundle(&self) -> PathBuf {
        self.root.join("incremental_metadata.zip")
    }

    pub fn create_dirs(&self, with_pdfs: bool) -> io::Result<()> {
        fs::create_dir_all(self.metadata_dir())?;
        if with_pdfs {
            fs::create_dir_all(self.pdf_dir())?;
        }
        Ok(())
    }
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new("neurips")
    }
}

/// Durable output for extracted papers, shared by every worker.
///
/// The JSON stream and the CSV stream each have their own lock, so a record
/// and a row from different workers may land in either order, but no line is
/// ever split.
#[derive(Debug)]
pub struct PaperSink {
    records: JsonLinesSink,
    rows: CsvSink,
    metadata_dir: PathBuf,
}

impl PaperSink {
    pub fn new(layout: &OutputLayout) -> Self {
        Self {
            records: JsonLinesSink::new(layout.json_path()),
            rows: CsvSink::new(layout.csv_path(), CSV_HEADER),
            metadata_dir: layout.metadata_dir(),
        }
    }

    /// Write the per-paper file, then append to both shared streams.
    ///
    /// Returns the per-paper file path. Papers with the same sanitized title
    /// share a file; the last writer wins.
    pub fn write_record(&self, record: &PaperRecord) -> io::Result<PathBuf> {
        let path = write_json_file(&self.metadata_dir, &sanitize_filename(&record.title), record)?;
        self.records.append(record)?;
        self.rows.append(record)?;
        Ok(path)
    }
}

/// Paths and entry counts of the two bundles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundles {
    pub metadata: PathBuf,
    pub metadata_entries: usize,
    pub incremental: PathBuf,
    pub incremental_entries: usize,
}

/// Zip the per-paper files and the two aggregate streams
pub fn bundle(layout: &OutputLayout) -> io::Result<Bundles> {
    let metadata = layout.metadata_bundle();
    let metadata_entries = zip_directory(&layout.metadata_dir(), &metadata)?;
    log::info!("Metadata folder zipped as {} ({metadata_entries} files)", metadata.display());

    let incremental = layout.incremental_bundle();
    let (json, csv) = (layout.json_path(), layout.csv_path());
    let incremental_entries = zip_files(&[json.as_path(), csv.as_path()], &incremental)?;
    log::info!("Incremental metadata zipped as {}", incremental.display());

    Ok(Bundles {
        metadata,
        metadata_entries,
        incremental,
        incremental_entries,
    })
}
