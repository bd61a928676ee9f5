//! Zip bundles of finished output, written via tmp file then renamed

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn tmp_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Build `dest` by feeding `entries` (archive name, source file) through a zip writer
fn write_zip(dest: &Path, entries: &[(String, PathBuf)]) -> io::Result<usize> {
    let tmp = tmp_path(dest);
    let mut zip = ZipWriter::new(BufWriter::new(File::create(&tmp)?));
    for (name, source) in entries {
        zip.start_file(name.as_str(), options())?;
        io::copy(&mut File::open(source)?, &mut zip)?;
    }
    zip.finish()?;
    fs::rename(&tmp, dest)?;
    Ok(entries.len())
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<(String, PathBuf)>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let rel = path.strip_prefix(root).map_err(io::Error::other)?;
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push((name, path));
        }
    }
    Ok(())
}

/// Zip every file under `src` (recursively, paths relative to `src`) into `dest`.
///
/// Returns the number of entries written. A missing `src` yields an empty archive.
pub fn zip_directory(src: &Path, dest: &Path) -> io::Result<usize> {
    let mut entries = Vec::new();
    if src.is_dir() {
        collect_files(src, src, &mut entries)?;
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    write_zip(dest, &entries)
}

/// Zip the given files, flat, into `dest`. Files that do not exist are skipped.
pub fn zip_files(files: &[&Path], dest: &Path) -> io::Result<usize> {
    let entries: Vec<(String, PathBuf)> = files
        .iter()
        .filter(|p| p.is_file())
        .filter_map(|p| {
            let name = p.file_name()?.to_string_lossy().into_owned();
            Some((name, p.to_path_buf()))
        })
        .collect();
    for missing in files.iter().filter(|p| !p.is_file()) {
        log::debug!("Not bundling missing file {}", missing.display());
    }
    write_zip(dest, &entries)
}
