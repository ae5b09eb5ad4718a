//! CSV I/O for index and composite tables.
//!
//! Rows are plain serde structs whose renamed fields match the header
//! columns. Output files are written atomically: a temp file is
//! created next to the destination and persisted over it only once every
//! row has been written, so a failed run never leaves a half-written table.

use crate::error::BookIndexError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Header of an index table.
pub const INDEX_HEADERS: [&str; 3] = ["Term", "Pages", "Definition"];

/// Header of a composite table.
pub const COMPOSITE_HEADERS: [&str; 4] = ["Term", "Book", "Page", "Definition"];

/// Write `headers` then `rows` to `path`, replacing any existing file.
///
/// The header is written explicitly so that an empty table still carries it.
pub fn write_rows<T: Serialize>(
    path: &Path,
    headers: &[&str],
    rows: &[T],
) -> Result<(), BookIndexError> {
    let write_err = |source: std::io::Error| BookIndexError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    {
        let mut writer = headerless_writer(tmp.as_file());
        writer
            .write_record(headers)
            .map_err(|e| write_err(csv_to_io(e)))?;
        for row in rows {
            writer.serialize(row).map_err(|e| write_err(csv_to_io(e)))?;
        }
        writer.flush().map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Read every row of a headed CSV table.
///
/// A missing file is [`BookIndexError::SourceTableMissing`]; a header or row
/// that does not fit `T` is [`BookIndexError::MalformedTable`].
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, BookIndexError> {
    if !path.is_file() {
        return Err(BookIndexError::SourceTableMissing {
            path: path.to_path_buf(),
        });
    }

    let malformed = |detail: String| BookIndexError::MalformedTable {
        path: path.to_path_buf(),
        detail,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| malformed(e.to_string()))?;

    let mut rows = Vec::new();
    for (line, record) in reader.deserialize::<T>().enumerate() {
        // +2: 1-based lines plus the header row
        let row = record.map_err(|e| malformed(format!("row {}: {}", line + 2, e)))?;
        rows.push(row);
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn csv_to_io(e: csv::Error) -> std::io::Error {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => io,
        other => std::io::Error::other(format!("{other:?}")),
    }
}

fn headerless_writer<W: std::io::Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().has_headers(false).from_writer(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexRow;
    use serde::Deserialize;

    fn to_csv_string<T: Serialize>(headers: &[&str], rows: &[T]) -> String {
        let mut writer = headerless_writer(Vec::new());
        writer.write_record(headers).unwrap();
        for row in rows {
            writer.serialize(row).unwrap();
        }
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    fn row(term: &str, pages: &str, def: &str) -> IndexRow {
        IndexRow {
            term: term.into(),
            pages: pages.into(),
            definition: def.into(),
        }
    }

    #[test]
    fn index_rows_have_expected_header_and_quoting() {
        let rows = [row("Zero Trust", "2, 5", "a model, not a product")];
        let csv = to_csv_string(&INDEX_HEADERS, &rows);
        assert_eq!(
            csv,
            "Term,Pages,Definition\nZero Trust,\"2, 5\",\"a model, not a product\"\n"
        );
    }

    #[test]
    fn write_then_read_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        let rows = vec![row("MFA", "3", "multi-factor auth"), row("IAM", "0, 7", "identity")];

        write_rows(&path, &INDEX_HEADERS, &rows).unwrap();
        let back: Vec<IndexRow> = read_rows(&path).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn missing_table_is_reported() {
        let err = read_rows::<IndexRow>(Path::new("/no/such/SEC5881.csv")).unwrap_err();
        assert!(matches!(err, BookIndexError::SourceTableMissing { .. }));
    }

    #[test]
    fn wrong_header_is_malformed() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Needs {
            #[serde(rename = "Term")]
            term: String,
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "Name,Pages\nx,1\n").unwrap();
        let err = read_rows::<Needs>(&path).unwrap_err();
        assert!(matches!(err, BookIndexError::MalformedTable { .. }));
    }

    #[test]
    fn empty_table_still_has_header() {
        assert_eq!(
            to_csv_string::<IndexRow>(&INDEX_HEADERS, &[]),
            "Term,Pages,Definition\n"
        );
    }
}
