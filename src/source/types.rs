//! Row source types and traits
//!
//! Defines the wide-column row handle and the scan abstraction.

use crate::error::Result;
use crate::types::SourceTable;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::BTreeMap;
use std::pin::Pin;

/// Cells of one column family, keyed by qualifier
pub type Family = BTreeMap<String, Bytes>;

/// One row of a wide-column table
///
/// A row key plus a sparse set of `(family, qualifier) -> bytes` cells. Any
/// family or qualifier may be absent; that is a valid state, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    key: Bytes,
    families: BTreeMap<String, Family>,
}

impl SourceRow {
    /// Create an empty row with the given key
    pub fn new(key: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            families: BTreeMap::new(),
        }
    }

    /// Add a cell, builder style
    #[must_use]
    pub fn with_cell(
        mut self,
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Self {
        self.insert(family, qualifier, value);
        self
    }

    /// Set a cell, replacing any previous value
    pub fn insert(
        &mut self,
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl Into<Bytes>,
    ) {
        self.families
            .entry(family.into())
            .or_default()
            .insert(qualifier.into(), value.into());
    }

    /// Raw row key
    pub fn key(&self) -> &Bytes {
        &self.key
    }

    /// Row key decoded as UTF-8, with invalid sequences replaced
    pub fn key_lossy(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }

    /// Look up a single cell
    pub fn value(&self, family: &str, qualifier: &str) -> Option<&Bytes> {
        self.families.get(family)?.get(qualifier)
    }

    /// All cells of one family
    pub fn family(&self, family: &str) -> Option<&Family> {
        self.families.get(family)
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.families.contains_key(family)
    }

    /// Iterate over families in name order
    pub fn families(&self) -> impl Iterator<Item = (&str, &Family)> {
        self.families.iter().map(|(name, cells)| (name.as_str(), cells))
    }

    /// Total number of cells across all families
    pub fn cell_count(&self) -> usize {
        self.families.values().map(BTreeMap::len).sum()
    }
}

/// A finite stream of scanned rows
pub type RowStream = Pin<Box<dyn Stream<Item = Result<SourceRow>> + Send>>;

/// A scannable wide-column table
///
/// `scan` yields every row present at scan time, in no guaranteed order, and
/// then terminates. A scan cannot be resumed; scanning again starts over.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Identifiers of the table being scanned
    fn table(&self) -> &SourceTable;

    /// Verify the table is reachable
    async fn check(&self) -> Result<()>;

    /// Start a full table scan
    async fn scan(&self) -> Result<RowStream>;
}
