//! Append-only output sinks shared across workers.
//!
//! Each sink owns one file behind its own mutex. A record is encoded before
//! the lock is taken and appended with a single `write_all`, so concurrent
//! writers never interleave within a line. Files are opened lazily on the
//! first append and never truncated.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

/// Characters replaced with `_` in file names
const UNSAFE_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replace characters that are invalid in file names with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn lock_file<'a>(
    slot: &'a Mutex<Option<File>>,
    path: &Path,
) -> io::Result<MutexGuard<'a, Option<File>>> {
    slot.lock().map_err(|_| {
        io::Error::other(format!("sink lock poisoned: {}", path.display()))
    })
}

/// Line-delimited JSON stream: one compact object per line
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record` as one JSON line
    pub fn append<T: Serialize>(&self, record: &T) -> io::Result<()> {
        let mut line = serde_json::to_vec(record).map_err(io::Error::other)?;
        line.push(b'\n');

        let mut guard = lock_file(&self.file, &self.path)?;
        let file = match &mut *guard {
            Some(f) => f,
            slot @ None => slot.insert(open_append(&self.path)?),
        };
        file.write_all(&line)
    }
}

/// CSV stream with every field double-quoted.
///
/// The header is written under the same lock as data rows, when the file
/// is first opened and found empty, so it appears exactly once.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    header: &'static [&'static str],
    file: Mutex<Option<File>>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, header: &'static [&'static str]) -> Self {
        Self {
            path: path.into(),
            header,
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `row` (a struct serialized field-by-field) as one CSV line
    pub fn append<T: Serialize>(&self, row: &T) -> io::Result<()> {
        let line = encode_row(row)?;

        let mut guard = lock_file(&self.file, &self.path)?;
        let file = match &mut *guard {
            Some(f) => f,
            slot @ None => {
                let mut f = open_append(&self.path)?;
                if f.metadata()?.len() == 0 {
                    let mut header = self.header.join(",");
                    header.push('\n');
                    f.write_all(header.as_bytes())?;
                }
                slot.insert(f)
            }
        };
        file.write_all(&line)
    }
}

/// Encode one row: fields double-quoted, inner quotes doubled, `\n` terminated
fn encode_row<T: Serialize>(row: &T) -> io::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.serialize(row).map_err(io::Error::from)?;
    writer
        .into_inner()
        .map_err(|e| io::Error::other(e.to_string()))
}

/// Write `value` as pretty JSON to `<dir>/<stem>.json`, replacing any existing file
pub fn write_json_file<T: Serialize>(dir: &Path, stem: &str, value: &T) -> io::Result<PathBuf> {
    let path = dir.join(format!("{stem}.json"));
    let json = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
    fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        name: String,
        note: String,
    }

    const HEADER: &[&str] = &["name", "note"];

    fn row(name: &str, note: &str) -> Row {
        Row {
            name: name.into(),
            note: note.into(),
        }
    }

    #[test]
    fn sanitize_replaces_all_unsafe() {
        assert_eq!(sanitize_filename(r#"a\b/c:d*e?f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn sanitize_keeps_safe_text() {
        assert_eq!(sanitize_filename("Attention Is All You Need"), "Attention Is All You Need");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn sanitize_idempotent() {
        for s in [r#"What? "Why" / How: <x>|y\z*"#, "plain", "::::", "résumé: ü*"] {
            let once = sanitize_filename(s);
            assert_eq!(sanitize_filename(&once), once);
            assert!(!once.contains(UNSAFE_FILENAME_CHARS));
        }
    }

    #[test]
    fn encode_row_quotes_everything() {
        let line = encode_row(&row("a", r#"say "hi", ok"#)).unwrap();
        assert_eq!(String::from_utf8(line).unwrap(), "\"a\",\"say \"\"hi\"\", ok\"\n");
    }

    #[test]
    fn csv_header_once_then_rows() {
        let dir = TempDir::new().unwrap();
        let sink = CsvSink::new(dir.path().join("out.csv"), HEADER);
        sink.append(&row("a", "1")).unwrap();
        sink.append(&row("b", "2")).unwrap();
        let text = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(text, "name,note\n\"a\",\"1\"\n\"b\",\"2\"\n");
    }

    #[test]
    fn csv_existing_file_gets_no_second_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        CsvSink::new(&path, HEADER).append(&row("a", "1")).unwrap();
        // A second run appends to the same file
        CsvSink::new(&path, HEADER).append(&row("b", "2")).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("name,note").count(), 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn csv_rows_read_back() {
        let dir = TempDir::new().unwrap();
        let sink = CsvSink::new(dir.path().join("out.csv"), HEADER);
        let tricky = row("multi\nline", r#"quotes "" and, commas"#);
        sink.append(&tricky).unwrap();
        let mut reader = csv::Reader::from_path(sink.path()).unwrap();
        let rows: Vec<Row> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, vec![tricky]);
    }

    #[test]
    fn json_lines_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(dir.path().join("out.json"));
        let rows = vec![row("a", "line\nbreak"), row("b", r#"{"nested": "json"}"#)];
        for r in &rows {
            sink.append(r).unwrap();
        }
        let text = fs::read_to_string(sink.path()).unwrap();
        let back: Vec<Row> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(back, rows);
    }

    #[test]
    fn sinks_open_lazily() {
        let dir = TempDir::new().unwrap();
        let json = JsonLinesSink::new(dir.path().join("out.json"));
        let csv = CsvSink::new(dir.path().join("out.csv"), HEADER);
        assert!(!json.path().exists());
        assert!(!csv.path().exists());
    }

    #[test]
    fn concurrent_csv_appends_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(CsvSink::new(dir.path().join("out.csv"), HEADER));
        let n = 32;
        let note = "x".repeat(4096);
        let handles: Vec<_> = (0..n)
            .map(|i| {
                let sink = sink.clone();
                let note = note.clone();
                std::thread::spawn(move || sink.append(&row(&format!("w{i}"), &note)).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let text = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(text.lines().count(), n + 1);
        assert_eq!(text.lines().next(), Some("name,note"));
        let mut reader = csv::Reader::from_path(sink.path()).unwrap();
        let rows: Vec<Row> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), n);
        assert!(rows.iter().all(|r| r.note == note));
    }

    #[test]
    fn concurrent_json_appends_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(JsonLinesSink::new(dir.path().join("out.json")));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let sink = sink.clone();
                std::thread::spawn(move || sink.append(&row(&format!("w{i}"), &"y".repeat(8192))).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let text = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(text.lines().count(), 16);
        for line in text.lines() {
            let r: Row = serde_json::from_str(line).unwrap();
            assert_eq!(r.note.len(), 8192);
        }
    }

    #[test]
    fn json_file_pretty_and_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = write_json_file(dir.path(), "paper", &row("a", "1")).unwrap();
        assert_eq!(path, dir.path().join("paper.json"));
        write_json_file(dir.path(), "paper", &row("b", "2")).unwrap();
        let back: Row = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, row("b", "2"));
        assert!(fs::read_to_string(&path).unwrap().contains("\n  \"name\""));
    }
}
