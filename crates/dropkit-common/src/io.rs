//! Delimited table I/O.
//!
//! Inputs may be plain or gzip-compressed; compression is sniffed from the magic bytes.
//! Outputs are written to a temporary file next to the destination and renamed into
//! place only once complete, so a failed run never leaves a truncated table behind.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::bufread::MultiGzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::debug;

use crate::error::{DropkitError, Result};
use crate::table::Table;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Output compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    /// gzip at the given level (0-9).
    Gzip(u32),
}

/// Open `path` for line-oriented reading, transparently decompressing gzip input.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| DropkitError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let is_gzip = reader
        .fill_buf()
        .map_err(|e| DropkitError::io(path, e))?
        .starts_with(&GZIP_MAGIC);

    if is_gzip {
        debug!("Reading {:?} as gzip", path);
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Field delimiter implied by a file name: comma for `.csv` (optionally `.gz`), tab otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    if name.ends_with(".csv") {
        b','
    } else {
        b'\t'
    }
}

/// Read a delimited file with a header row into a [`Table`].
pub fn read_table(path: &Path, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(open_reader(path)?);

    let headers = reader
        .headers()
        .map_err(|e| csv_parse_error(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut table = Table::new(headers);

    for record in reader.records() {
        let record = record.map_err(|e| csv_parse_error(path, e))?;
        table.push_row(record.iter().map(str::to_string).collect())?;
    }

    debug!(
        "Read {} rows x {} columns from {:?}",
        table.len(),
        table.columns().len(),
        path
    );
    Ok(table)
}

fn csv_parse_error(path: &Path, err: csv::Error) -> DropkitError {
    let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
    DropkitError::parse(path, line, err.to_string())
}

/// Write `table` as tab-separated text with a header row and no index column.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    write_atomic(path, Compression::None, |out| {
        let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row)?;
        }
        writer.flush().map_err(|e| DropkitError::io(path, e))?;
        Ok(())
    })?;
    debug!("Wrote {} rows to {:?}", table.len(), path);
    Ok(())
}

/// Run `write` against a temporary file in the destination directory, then rename it
/// over `path`. Nothing is left at `path` if `write` fails.
pub fn write_atomic<F>(path: &Path, compression: Compression, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".dropkit-")
        .suffix(".partial")
        .tempfile_in(dir)
        .map_err(|e| DropkitError::io(dir, e))?;

    {
        let mut buffered = BufWriter::new(staged.as_file_mut());
        match compression {
            Compression::None => {
                write(&mut buffered)?;
                buffered.flush().map_err(|e| DropkitError::io(path, e))?;
            }
            Compression::Gzip(level) => {
                let mut encoder = GzEncoder::new(buffered, flate2::Compression::new(level));
                write(&mut encoder)?;
                let mut buffered = encoder.finish().map_err(|e| DropkitError::io(path, e))?;
                buffered.flush().map_err(|e| DropkitError::io(path, e))?;
            }
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| DropkitError::io(path, e))?;
    }

    staged
        .persist(path)
        .map_err(|e| DropkitError::io(path, e.error))?;
    Ok(())
}

/// Write `value` as pretty-printed JSON, all-or-nothing.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    write_atomic(path, Compression::None, |out| {
        serde_json::to_writer_pretty(&mut *out, value).map_err(|e| DropkitError::Other(e.into()))?;
        out.write_all(b"\n").map_err(|e| DropkitError::io(path, e))
    })
}
