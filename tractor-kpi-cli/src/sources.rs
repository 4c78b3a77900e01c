use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use tractor_kpi::{LogSource, LogStream, stamp_log_bytes};

/// Log files with one extension in one directory, read in file name order.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    extension: String,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Matching files, sorted by path so runs are repeatable.
    pub fn discover(&self) -> io::Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("cannot read logs directory {}: {err}", self.dir.display()),
            )
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(self.extension.as_str()))
            {
                files.push(path);
            }
        }
        files.sort();
        debug!("found {} .{} files in {}", files.len(), self.extension, self.dir.display());
        Ok(files)
    }
}

impl LogSource for DirectorySource {
    type Error = io::Error;

    /// Discovery failures abort; a file that cannot be opened becomes a
    /// stream whose first read fails, so it is counted as a read failure and
    /// the other files are still analyzed.
    fn open_streams(&self) -> Result<Vec<LogStream>, Self::Error> {
        Ok(self.discover()?.iter().map(PathBuf::as_path).map(open_stream).collect())
    }
}

fn open_stream(path: &Path) -> LogStream {
    let name = path.display().to_string();
    match File::open(path) {
        Ok(file) => LogStream::new(name, BufReader::new(file)),
        Err(err) => {
            warn!("{name}: cannot open log file, skipping: {err}");
            LogStream::new(name, BufReader::new(UnopenedFile { error: Some(err) }))
        }
    }
}

/// Replays the open error on the first read, then reads as empty.
struct UnopenedFile {
    error: Option<io::Error>,
}

impl Read for UnopenedFile {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        self.error.take().map_or(Ok(0), Err)
    }
}

/// Rewrite every log file with fresh sequence numbers. Files with no valid
/// record are left untouched. Returns the number of files rewritten.
pub fn stamp_directory(source: &DirectorySource) -> Result<usize> {
    let mut rewritten = 0;
    for path in source.discover()? {
        if stamp_file(&path)? {
            rewritten += 1;
        }
    }
    Ok(rewritten)
}

fn stamp_file(path: &Path) -> Result<bool> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let stamped = stamp_log_bytes(&bytes);
    if stamped.malformed_lines > 0 {
        warn!(
            "{}: dropping {} malformed lines while stamping",
            path.display(),
            stamped.malformed_lines
        );
    }
    if stamped.is_empty() {
        info!("{}: no valid records, left untouched", path.display());
        return Ok(false);
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".stamping");
    let temp_path = path.with_file_name(temp_name);
    fs::write(&temp_path, stamped.to_text())
        .with_context(|| format!("failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    debug!("{}: stamped {} records", path.display(), stamped.lines.len());
    Ok(true)
}
