//! DuckDB-backed warehouse sink
//!
//! A dataset maps to a DuckDB schema and a table to a table inside it. Each
//! load runs in a single transaction on the blocking pool, so a failed load
//! leaves the previous table contents in place.

use super::types::{BulkSink, LoadOptions, LoadSummary};
use crate::decode::PostRecord;
use crate::error::{Error, Result};
use crate::schema::{quote_ident, TableSchema};
use crate::types::{CreateDisposition, DestinationTable, WriteDisposition};
use async_trait::async_trait;
use duckdb::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Warehouse sink using DuckDB
pub struct WarehouseSink {
    /// Shared with the blocking load task; one writer at a time
    handle: Arc<Mutex<Handle>>,
    /// Database file, `None` when in memory
    path: Option<PathBuf>,
}

/// Connection state; a file-backed warehouse connects on first use
struct Handle {
    path: Option<PathBuf>,
    conn: Option<Connection>,
}

impl Handle {
    fn connection(&mut self) -> Result<&mut Connection> {
        if self.conn.is_none() {
            let path = self
                .path
                .as_deref()
                .ok_or_else(|| Error::sink("in-memory warehouse lost its connection"))?;
            self.conn = Some(connect(path)?);
        }
        self.conn
            .as_mut()
            .ok_or_else(|| Error::sink("warehouse connection unavailable"))
    }
}

impl WarehouseSink {
    /// Warehouse at a database file, opened on first use
    ///
    /// Nothing is created on disk until a table is read or loaded.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            handle: Arc::new(Mutex::new(Handle {
                path: Some(path.clone()),
                conn: None,
            })),
            path: Some(path),
        }
    }

    /// Open (or create) a database file now
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let sink = Self::new(path);
        lock(&sink.handle)?.connection()?;
        Ok(sink)
    }

    /// Create a transient in-memory warehouse
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::connectivity(":memory:", format!("cannot open warehouse: {e}")))?;

        Ok(Self {
            handle: Arc::new(Mutex::new(Handle {
                path: None,
                conn: Some(conn),
            })),
            path: None,
        })
    }

    /// Location of the warehouse, for logging
    pub fn location(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string())
    }

    fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut handle = lock(&self.handle)?;
        f(handle.connection()?)
    }

    /// Check whether a table exists
    pub fn table_exists(&self, table: &DestinationTable) -> Result<bool> {
        self.with_connection(|conn| table_exists(conn, table))
    }

    /// Number of rows in a table
    pub fn row_count(&self, table: &DestinationTable) -> Result<usize> {
        self.with_connection(|conn| row_count(conn, table))
    }

    /// Read a table back as post records, ordered by `postId`
    pub fn read_records(
        &self,
        table: &DestinationTable,
        limit: Option<usize>,
    ) -> Result<Vec<PostRecord>> {
        self.with_connection(|conn| {
            if !table_exists(conn, table)? {
                return Err(Error::TableNotFound {
                    table: table.to_string(),
                });
            }

            let mut query = format!(
                "SELECT \"postId\", \"user\", \"message\", \"lat\", \"lon\" FROM {} ORDER BY \"postId\"",
                qualified_name(table)
            );
            if let Some(limit) = limit {
                query = format!("{query} LIMIT {limit}");
            }

            let mut stmt = conn.prepare(&query)?;
            let records = stmt
                .query_map([], |row| {
                    Ok(PostRecord {
                        post_id: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                        user: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        message: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        lat: row.get(3)?,
                        lon: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(records)
        })
    }
}

#[async_trait]
impl BulkSink for WarehouseSink {
    async fn check(&self) -> Result<()> {
        let mut handle = lock(&self.handle)?;
        if handle.conn.is_none() {
            if let Some(path) = handle.path.as_deref().filter(|p| !p.exists()) {
                return check_creatable(path);
            }
        }

        handle.connection()?.execute_batch("SELECT 1;").map_err(|e| {
            Error::connectivity(self.location(), format!("warehouse check failed: {e}"))
        })
    }

    async fn load(
        &self,
        table: &DestinationTable,
        schema: &TableSchema,
        options: LoadOptions,
        records: Vec<PostRecord>,
    ) -> Result<LoadSummary> {
        tracing::info!(
            "Loading {} records into {} ({}, {}) at {}",
            records.len(),
            table,
            options.create_disposition,
            options.write_disposition,
            self.location()
        );

        let shared = Arc::clone(&self.handle);
        let table = table.clone();
        let schema = schema.clone();
        tokio::task::spawn_blocking(move || {
            let mut handle = lock(&shared)?;
            load_into(handle.connection()?, &table, &schema, options, &records)
        })
        .await
        .map_err(|e| Error::Other(format!("warehouse load task failed: {e}")))?
    }
}

fn lock(handle: &Mutex<Handle>) -> Result<MutexGuard<'_, Handle>> {
    handle
        .lock()
        .map_err(|_| Error::sink("warehouse connection lock poisoned"))
}

fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Connection::open(path).map_err(|e| {
        Error::connectivity(path.display().to_string(), format!("cannot open warehouse: {e}"))
    })
}

/// A missing database file is reachable when its nearest existing ancestor is
/// a writable directory
fn check_creatable(path: &Path) -> Result<()> {
    let location = path.display().to_string();
    let ancestor = path
        .ancestors()
        .skip(1)
        .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
        .find(|p| p.exists())
        .ok_or_else(|| Error::connectivity(location.clone(), "no existing parent directory"))?;

    let metadata = std::fs::metadata(ancestor)
        .map_err(|e| Error::connectivity(location.clone(), e.to_string()))?;
    if !metadata.is_dir() {
        return Err(Error::connectivity(
            location,
            format!("{} is not a directory", ancestor.display()),
        ));
    }
    if metadata.permissions().readonly() {
        return Err(Error::connectivity(
            location,
            format!("{} is read-only", ancestor.display()),
        ));
    }

    tracing::debug!("Warehouse {} will be created on first load", location);
    Ok(())
}

fn load_into(
    conn: &mut Connection,
    table: &DestinationTable,
    schema: &TableSchema,
    options: LoadOptions,
    records: &[PostRecord],
) -> Result<LoadSummary> {
    let tx = conn.transaction()?;

    let exists = table_exists(&tx, table)?;
    if !exists && options.create_disposition == CreateDisposition::CreateNever {
        return Err(Error::TableNotFound {
            table: table.to_string(),
        });
    }

    let name = qualified_name(table);
    let columns = schema.to_ddl_columns();
    if !exists {
        tx.execute_batch(&format!(
            "CREATE SCHEMA IF NOT EXISTS {};",
            quote_ident(&table.dataset_id)
        ))?;
    }

    match options.write_disposition {
        WriteDisposition::WriteTruncate => {
            let sql = format!("CREATE OR REPLACE TABLE {name} ({columns});");
            tracing::debug!("Executing: {}", sql);
            tx.execute_batch(&sql)?;
        }
        WriteDisposition::WriteAppend | WriteDisposition::WriteEmpty => {
            if exists {
                check_columns(&tx, table, schema)?;
            } else {
                let sql = format!("CREATE TABLE {name} ({columns});");
                tracing::debug!("Executing: {}", sql);
                tx.execute_batch(&sql)?;
            }
            if options.write_disposition == WriteDisposition::WriteEmpty {
                let rows = row_count(&tx, table)?;
                if rows > 0 {
                    return Err(Error::TableNotEmpty {
                        table: table.to_string(),
                        rows,
                    });
                }
            }
        }
    }

    insert_records(&tx, &name, schema, records)?;
    tx.commit()?;

    let mut summary = LoadSummary::new(table.clone(), records.len());
    summary.created = !exists;
    summary.replaced = exists && options.write_disposition == WriteDisposition::WriteTruncate;
    Ok(summary)
}

/// `"dataset"."table"`
fn qualified_name(table: &DestinationTable) -> String {
    format!(
        "{}.{}",
        quote_ident(&table.dataset_id),
        quote_ident(&table.table_id)
    )
}

fn table_exists(conn: &Connection, table: &DestinationTable) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
        params![table.dataset_id, table.table_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn row_count(conn: &Connection, table: &DestinationTable) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {}", qualified_name(table));
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Ensure an existing table has the schema's columns, in order, with the same types
fn check_columns(conn: &Connection, table: &DestinationTable, schema: &TableSchema) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT column_name, data_type FROM information_schema.columns \
         WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
    )?;
    let existing: Vec<(String, String)> = stmt
        .query_map(params![table.dataset_id, table.table_id], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<std::result::Result<_, _>>()?;

    let expected: Vec<(String, String)> = schema
        .fields()
        .iter()
        .map(|f| (f.name.clone(), f.field_type.sql_type().to_string()))
        .collect();

    if existing != expected {
        let describe = |cols: &[(String, String)]| {
            cols.iter()
                .map(|(name, ty)| format!("{name} {ty}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        return Err(Error::schema_mismatch(
            table.to_string(),
            format!(
                "table has ({}), load expects ({})",
                describe(&existing),
                describe(&expected)
            ),
        ));
    }
    Ok(())
}

fn insert_records(
    conn: &Connection,
    name: &str,
    schema: &TableSchema,
    records: &[PostRecord],
) -> Result<()> {
    let column_list = schema
        .fields()
        .iter()
        .map(|f| quote_ident(&f.name))
        .collect::<Vec<_>>()
        .join(", ");

    // Values are bound by position in the post field order
    if schema.names() != ["postId", "user", "message", "lat", "lon"] {
        return Err(Error::schema_mismatch(
            name,
            format!("cannot bind post records to columns ({column_list})"),
        ));
    }

    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {name} ({column_list}) VALUES (?, ?, ?, ?, ?)"
    ))?;
    for record in records {
        stmt.execute(params![
            record.post_id,
            record.user,
            record.message,
            record.lat,
            record.lon
        ])?;
    }

    tracing::debug!("Inserted {} rows into {}", records.len(), name);
    Ok(())
}
