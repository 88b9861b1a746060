//! JSONL table export reader
//!
//! Reads a snapshot of a wide-column table, one JSON object per line:
//!
//! ```text
//! {"key":"p42","cells":{"post":{"user":"alice","message":"hi"},"location":{"lat":"10.0","lon":"-20.0"}}}
//! {"key":"cDQz","encoding":"base64","cells":{"post":{"user":"Ym9i"}}}
//! ```
//!
//! With `"encoding": "base64"` the key and every cell value are base64, which
//! lets an export carry bytes that are not valid UTF-8.

use super::types::{RowSource, RowStream, SourceRow};
use crate::error::{Error, Result};
use crate::types::SourceTable;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

/// How keys and cell values are written in an export line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellEncoding {
    #[default]
    Utf8,
    Base64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportLine {
    key: String,
    #[serde(default, skip_serializing_if = "is_utf8")]
    encoding: CellEncoding,
    #[serde(default)]
    cells: BTreeMap<String, BTreeMap<String, String>>,
}

fn is_utf8(encoding: &CellEncoding) -> bool {
    *encoding == CellEncoding::Utf8
}

/// Row source backed by a JSONL export file
#[derive(Debug, Clone)]
pub struct ExportRowSource {
    table: SourceTable,
    path: PathBuf,
}

impl ExportRowSource {
    pub fn new(table: SourceTable, path: impl AsRef<Path>) -> Self {
        Self {
            table,
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unreachable(&self, message: impl std::fmt::Display) -> Error {
        Error::connectivity(
            self.table.to_string(),
            format!("export {}: {message}", self.path.display()),
        )
    }
}

#[async_trait]
impl RowSource for ExportRowSource {
    fn table(&self) -> &SourceTable {
        &self.table
    }

    async fn check(&self) -> Result<()> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.unreachable(e))?;
        if !metadata.is_file() {
            return Err(self.unreachable("not a regular file"));
        }
        Ok(())
    }

    async fn scan(&self) -> Result<RowStream> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| self.unreachable(e))?;

        tracing::debug!("Scanning {} from {}", self.table, self.path.display());

        let lines = BufReader::new(file).lines();
        let stream = futures::stream::try_unfold((lines, 0usize), |(lines, line_no)| {
            next_row(lines, line_no)
        });

        Ok(Box::pin(stream))
    }
}

type ExportLines = Lines<BufReader<File>>;

/// Read lines until the next non-blank one and parse it
async fn next_row(
    mut lines: ExportLines,
    mut line_no: usize,
) -> Result<Option<(SourceRow, (ExportLines, usize))>> {
    loop {
        line_no += 1;
        let next = lines
            .next_line()
            .await
            .map_err(|e| Error::scan(format!("read failed at line {line_no}: {e}")))?;
        let Some(line) = next else {
            return Ok(None);
        };
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_export_line(&line, line_no)?;
        return Ok(Some((row, (lines, line_no))));
    }
}

/// Parse one export line into a row
pub fn parse_export_line(line: &str, line_no: usize) -> Result<SourceRow> {
    let parsed: ExportLine = serde_json::from_str(line)
        .map_err(|e| Error::scan(format!("malformed export at line {line_no}: {e}")))?;

    let encoding = parsed.encoding;
    let decode = |text: &str| -> Result<Bytes> {
        match encoding {
            CellEncoding::Utf8 => Ok(Bytes::from(text.to_owned())),
            CellEncoding::Base64 => STANDARD
                .decode(text.as_bytes())
                .map(Bytes::from)
                .map_err(|e| Error::scan(format!("invalid base64 at line {line_no}: {e}"))),
        }
    };

    let mut row = SourceRow::new(decode(&parsed.key)?);
    for (family, cells) in parsed.cells {
        for (qualifier, value) in cells {
            row.insert(family.clone(), qualifier, decode(&value)?);
        }
    }
    Ok(row)
}

/// Render a row as one export line
///
/// Plain text is used when the key and every value are valid UTF-8,
/// base64 otherwise.
pub fn export_line(row: &SourceRow) -> Result<String> {
    let all_utf8 = std::str::from_utf8(row.key()).is_ok()
        && row
            .families()
            .flat_map(|(_, cells)| cells.values())
            .all(|value| std::str::from_utf8(value).is_ok());

    let encoding = if all_utf8 {
        CellEncoding::Utf8
    } else {
        CellEncoding::Base64
    };
    let encode = |bytes: &Bytes| match encoding {
        CellEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        CellEncoding::Base64 => STANDARD.encode(bytes),
    };

    let cells = row
        .families()
        .map(|(family, cells)| {
            let values = cells
                .iter()
                .map(|(qualifier, value)| (qualifier.clone(), encode(value)))
                .collect();
            (family.to_string(), values)
        })
        .collect();

    let line = ExportLine {
        key: encode(row.key()),
        encoding,
        cells,
    };
    Ok(serde_json::to_string(&line)?)
}

/// Write rows as a JSONL export file, replacing any existing file
pub async fn write_export(path: impl AsRef<Path>, rows: &[SourceRow]) -> Result<usize> {
    let mut content = String::new();
    for row in rows {
        content.push_str(&export_line(row)?);
        content.push('\n');
    }
    tokio::fs::write(path.as_ref(), content).await?;
    Ok(rows.len())
}
