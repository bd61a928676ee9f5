//! Optional PDF download next to the metadata

use std::io;
use std::path::Path;

use nipscrape_core::{Fetcher, sanitize_filename};

use crate::record::PaperRecord;

/// Result of one PDF download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfOutcome {
    Downloaded { bytes: u64 },
    AlreadyPresent,
    Failed,
}

/// Fetch `record.pdf_url` into `<pdf_dir>/<sanitized-title>.pdf`.
///
/// Each download streams into its own temp file in `pdf_dir`, which is moved
/// into place only if the target is still absent. Of two papers whose titles
/// sanitize to the same name, one wins and the other reports
/// [`PdfOutcome::AlreadyPresent`]; a truncated PDF is never left behind.
/// Failures are logged and reported as [`PdfOutcome::Failed`].
pub fn download_pdf<F: Fetcher + ?Sized>(
    fetcher: &F,
    record: &PaperRecord,
    pdf_dir: &Path,
) -> PdfOutcome {
    let stem = sanitize_filename(&record.title);
    let target = pdf_dir.join(format!("{stem}.pdf"));
    if target.is_file() {
        log::info!("File exists: {}", target.display());
        return PdfOutcome::AlreadyPresent;
    }

    let temp = match tempfile::Builder::new()
        .prefix(&format!(".{stem}."))
        .suffix(".pdf.part")
        .tempfile_in(pdf_dir)
    {
        Ok(temp) => temp,
        Err(e) => {
            log::warn!("Failed to create temp file in {}: {e}", pdf_dir.display());
            return PdfOutcome::Failed;
        }
    };

    // Dropping `temp` on any early return removes the partial body
    let bytes = match fetcher.download(&record.pdf_url, temp.path()) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to download {}: {e}", record.pdf_url);
            return PdfOutcome::Failed;
        }
    };

    match temp.persist_noclobber(&target) {
        Ok(_) => {
            log::debug!("Downloaded {} ({bytes} bytes)", target.display());
            PdfOutcome::Downloaded { bytes }
        }
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
            log::info!("File exists: {}", target.display());
            PdfOutcome::AlreadyPresent
        }
        Err(e) => {
            log::warn!("Failed to move {} into place: {}", target.display(), e.error);
            PdfOutcome::Failed
        }
    }
}
