//! CSV splitting for document upload
//!
//! Each data row of a CSV file becomes `document_NNNNN.txt` holding the
//! header line followed by that row. Quoted fields may span lines; records
//! are copied verbatim so quoting survives.

use crate::error::{CliError, StorageError};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PATTERN: &str = "*.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "split_documents";
const PROGRESS_EVERY: usize = 1000;

#[derive(Debug, Default, PartialEq)]
pub struct SplitReport {
    /// Source file and number of documents written from it
    pub files: Vec<(PathBuf, usize)>,
    /// Source files that could not be split, with the reason
    pub failed: Vec<(PathBuf, String)>,
    pub output_dir: PathBuf,
}

impl SplitReport {
    pub fn total_documents(&self) -> usize {
        self.files.iter().map(|(_, count)| count).sum()
    }
}

/// Split a CSV file, or every file in a folder matching `pattern`.
///
/// With more than one input file each gets its own sub-directory named
/// after the file stem.
pub fn split_path(input: &Path, output_dir: &Path, pattern: &str) -> crate::Result<SplitReport> {
    if !input.exists() {
        return Err(CliError::InvalidArguments(format!(
            "Input path '{}' does not exist",
            input.display()
        ))
        .into());
    }

    let csv_files = if input.is_file() {
        let is_csv = input
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(CliError::InvalidArguments(format!(
                "'{}' is not a CSV file",
                input.display()
            ))
            .into());
        }
        vec![input.to_path_buf()]
    } else {
        let files = matching_files(input, pattern)?;
        if files.is_empty() {
            return Err(CliError::InvalidArguments(format!(
                "No CSV files found in '{}' matching pattern '{}'",
                input.display(),
                pattern
            ))
            .into());
        }
        files
    };

    let mut report = SplitReport {
        output_dir: output_dir.to_path_buf(),
        ..SplitReport::default()
    };
    let per_file_dirs = csv_files.len() > 1;

    for csv_file in csv_files {
        let target = match (per_file_dirs, csv_file.file_stem()) {
            (true, Some(stem)) => output_dir.join(stem),
            _ => output_dir.to_path_buf(),
        };

        log::info!("Splitting '{}'", csv_file.display());
        match split_file(&csv_file, &target) {
            Ok(count) => report.files.push((csv_file, count)),
            Err(e) => {
                log::error!("Error processing '{}': {}", csv_file.display(), e);
                report.failed.push((csv_file, e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Write one document per data row of `csv_file` into `output_dir`.
pub fn split_file(csv_file: &Path, output_dir: &Path) -> crate::Result<usize> {
    let content = fs::read_to_string(csv_file).map_err(|source| io_error(csv_file, source))?;
    let mut records = split_records(&content).into_iter();

    let header = records.next().ok_or_else(|| {
        CliError::InvalidArguments(format!("'{}' has no header row", csv_file.display()))
    })?;

    fs::create_dir_all(output_dir).map_err(|source| io_error(output_dir, source))?;

    let mut written = 0;
    for row in records {
        written += 1;
        let path = output_dir.join(document_file_name(written));
        fs::write(&path, format!("{}\n{}\n", header, row))
            .map_err(|source| io_error(&path, source))?;

        if written % PROGRESS_EVERY == 0 {
            log::info!("Processed {} documents...", written);
        }
    }

    Ok(written)
}

pub fn document_file_name(row: usize) -> String {
    format!("document_{:05}.txt", row)
}

/// Split CSV text into raw records, honoring double-quoted fields that
/// contain newlines. Blank lines are dropped.
pub fn split_records(content: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (index, byte) in content.bytes().enumerate() {
        match byte {
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => {
                push_record(&mut records, &content[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    push_record(&mut records, &content[start..]);

    records
}

fn push_record<'a>(records: &mut Vec<&'a str>, raw: &'a str) {
    let record = raw.strip_suffix('\r').unwrap_or(raw);
    if !record.trim().is_empty() {
        records.push(record);
    }
}

/// Files under `dir` matching `pattern`, which may hold `*`, `?`, `[...]`
/// classes and sub-directory segments.
pub fn matching_files(dir: &Path, pattern: &str) -> crate::Result<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let full = Path::new(&base).join(pattern);

    let entries = glob::glob(&full.to_string_lossy()).map_err(|e| {
        CliError::InvalidArguments(format!("Invalid file pattern '{}': {}", pattern, e.msg))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            io_error(&path, e.into_error())
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::FileIo {
        path: path.to_string_lossy().to_string(),
        source,
    }
}
