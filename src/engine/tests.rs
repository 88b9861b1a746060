//! Tests for engine module

use super::*;
use crate::decode::{encode_post, map_post};
use crate::sink::{LoadSummary, WarehouseSink};
use crate::source::{ExportRowSource, MemoryRowSource, RowStream};
use crate::types::{CreateDisposition, SourceTable, WriteDisposition};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::Mutex;

fn post_table() -> SourceTable {
    SourceTable::new("orbital-heaven-286400", "around-post", "post")
}

fn daily_dump() -> DestinationTable {
    DestinationTable::new("orbital-heaven-286400", "post_analysis", "daily_dump_1")
}

fn posts(count: usize) -> Vec<SourceRow> {
    (0..count)
        .map(|i| encode_post(&format!("p{i:03}"), "user", "msg", i as f64, -(i as f64)))
        .collect()
}

fn memory_source(rows: Vec<SourceRow>) -> Arc<dyn RowSource> {
    Arc::new(MemoryRowSource::with_rows(post_table(), rows))
}

/// Sink that records every load it receives
#[derive(Default)]
struct RecordingSink {
    loads: Mutex<Vec<Vec<PostRecord>>>,
}

impl RecordingSink {
    fn load_count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }
}

#[async_trait]
impl BulkSink for RecordingSink {
    async fn check(&self) -> Result<()> {
        Ok(())
    }

    async fn load(
        &self,
        table: &DestinationTable,
        _schema: &TableSchema,
        _options: LoadOptions,
        records: Vec<PostRecord>,
    ) -> Result<LoadSummary> {
        let summary = LoadSummary::new(table.clone(), records.len());
        self.loads.lock().unwrap().push(records);
        Ok(summary)
    }
}

/// Source whose scan yields some rows and then an error
struct FailingSource {
    table: SourceTable,
    good_rows: usize,
}

#[async_trait]
impl RowSource for FailingSource {
    fn table(&self) -> &SourceTable {
        &self.table
    }

    async fn check(&self) -> Result<()> {
        Ok(())
    }

    async fn scan(&self) -> Result<RowStream> {
        let mut items: Vec<Result<SourceRow>> = posts(self.good_rows).into_iter().map(Ok).collect();
        items.push(Err(Error::connectivity(
            self.table.to_string(),
            "connection reset",
        )));
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

// ============================================================================
// RunConfig Tests
// ============================================================================

#[test]
fn test_run_config_default() {
    let config = RunConfig::default();
    assert!(config.parallelism > 0);
    assert_eq!(config.batch_size, 1000);
    config.validate().unwrap();
}

#[test]
fn test_run_config_rejects_zero() {
    assert!(RunConfig::new().with_parallelism(0).validate().is_err());
    assert!(RunConfig::new().with_batch_size(0).validate().is_err());
}

// ============================================================================
// Stage Tests
// ============================================================================

#[test]
fn test_stages_in_order() {
    let pipeline = Pipeline::new(
        memory_source(Vec::new()),
        Arc::new(RecordingSink::default()),
        daily_dump(),
    );

    let stages = pipeline.stages();
    let names: Vec<&str> = stages.iter().map(PipelineStage::name).collect();
    assert_eq!(names, vec!["read", "map", "load"]);

    assert_eq!(
        stages[0].to_string(),
        "read  projects/orbital-heaven-286400/instances/around-post/tables/post"
    );
    assert_eq!(stages[1].to_string(), "map   (postId, user, message, lat, lon)");
    assert_eq!(
        stages[2].to_string(),
        "load  orbital-heaven-286400:post_analysis.daily_dump_1 (CREATE_IF_NEEDED, WRITE_TRUNCATE)"
    );
}

#[test]
fn test_stage_serializes_with_tag() {
    let stage = PipelineStage::Map {
        columns: vec!["postId".into()],
    };
    let json = serde_json::to_value(&stage).unwrap();
    assert_eq!(json, serde_json::json!({"stage": "map", "columns": ["postId"]}));
}

// ============================================================================
// Run Tests
// ============================================================================

#[tokio::test]
async fn test_run_maps_every_row() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::new(memory_source(posts(25)), sink.clone(), daily_dump())
        .with_config(RunConfig::new().with_batch_size(4).with_parallelism(3));

    let stats = pipeline.run().await.unwrap();

    assert_eq!(stats.rows_read, 25);
    assert_eq!(stats.records_loaded(), 25);
    assert_eq!(stats.chunks, 7);
    assert_eq!(sink.load_count(), 1);

    let mut ids: Vec<String> = sink.loads.lock().unwrap()[0]
        .iter()
        .map(|r| r.post_id.clone())
        .collect();
    ids.sort();
    let expected: Vec<String> = (0..25).map(|i| format!("p{i:03}")).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_run_empty_source_still_loads() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::new(memory_source(Vec::new()), sink.clone(), daily_dump());

    let stats = pipeline.run().await.unwrap();

    assert_eq!(stats.rows_read, 0);
    assert_eq!(stats.chunks, 0);
    assert_eq!(sink.load_count(), 1);
}

#[tokio::test]
async fn test_run_p42_into_warehouse() {
    let row = SourceRow::new("p42")
        .with_cell("post", "user", "alice")
        .with_cell("post", "message", "hi")
        .with_cell("location", "lat", "10.0")
        .with_cell("location", "lon", "-20.0");
    let warehouse = Arc::new(WarehouseSink::in_memory().unwrap());
    let pipeline = Pipeline::new(memory_source(vec![row]), warehouse.clone(), daily_dump());

    let stats = pipeline.run().await.unwrap();

    assert!(stats.load.created);
    assert_eq!(
        warehouse.read_records(&daily_dump(), None).unwrap(),
        vec![PostRecord::new("p42", "alice", "hi", 10.0, -20.0)]
    );
}

#[tokio::test]
async fn test_run_is_idempotent() {
    let warehouse = Arc::new(WarehouseSink::in_memory().unwrap());
    let pipeline = Pipeline::new(memory_source(posts(10)), warehouse.clone(), daily_dump());

    pipeline.run().await.unwrap();
    let first = warehouse.read_records(&daily_dump(), None).unwrap();
    let stats = pipeline.run().await.unwrap();
    let second = warehouse.read_records(&daily_dump(), None).unwrap();

    assert!(stats.load.replaced);
    assert_eq!(first, second);
    assert_eq!(second.len(), 10);
}

#[tokio::test]
async fn test_missing_location_aborts_before_load() {
    let mut rows = posts(5);
    rows.push(SourceRow::new("p-bad").with_cell("post", "user", "x"));
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::new(memory_source(rows), sink.clone(), daily_dump())
        .with_config(RunConfig::new().with_batch_size(2));

    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, Error::Decode { ref row_key, .. } if row_key == "p-bad"));
    assert!(err.is_record_error());
    assert_eq!(sink.load_count(), 0);
}

#[tokio::test]
async fn test_format_error_keeps_previous_table() {
    let warehouse = Arc::new(WarehouseSink::in_memory().unwrap());
    Pipeline::new(memory_source(posts(3)), warehouse.clone(), daily_dump())
        .run()
        .await
        .unwrap();

    let mut rows = posts(5);
    rows.push(
        SourceRow::new("p-bad")
            .with_cell("location", "lat", "abc")
            .with_cell("location", "lon", "1"),
    );
    let err = Pipeline::new(memory_source(rows), warehouse.clone(), daily_dump())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Format { .. }));
    assert_eq!(warehouse.row_count(&daily_dump()).unwrap(), 3);
}

#[tokio::test]
async fn test_scan_error_aborts_before_load() {
    let source = Arc::new(FailingSource {
        table: post_table(),
        good_rows: 3,
    });
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::new(source, sink.clone(), daily_dump());

    let err = pipeline.run().await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(sink.load_count(), 0);
}

#[tokio::test]
async fn test_unreachable_source_fails_check_and_run() {
    let source = Arc::new(ExportRowSource::new(post_table(), "/nonexistent/post.jsonl"));
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::new(source, sink.clone(), daily_dump());

    assert!(matches!(pipeline.check().await, Err(Error::Connectivity { .. })));
    assert!(matches!(pipeline.run().await, Err(Error::Connectivity { .. })));
    assert_eq!(sink.load_count(), 0);
}

#[tokio::test]
async fn test_custom_mapper_and_options() {
    let shout: Arc<dyn RowMapper> = Arc::new(|row: &SourceRow| -> Result<PostRecord> {
        let mut record = map_post(row)?;
        record.message = record.message.to_uppercase();
        Ok(record)
    });
    let warehouse = Arc::new(WarehouseSink::in_memory().unwrap());
    let options = LoadOptions::default()
        .with_create_disposition(CreateDisposition::CreateIfNeeded)
        .with_write_disposition(WriteDisposition::WriteAppend);
    let pipeline = Pipeline::new(memory_source(posts(2)), warehouse.clone(), daily_dump())
        .with_mapper(shout)
        .with_load_options(options);

    pipeline.run().await.unwrap();
    pipeline.run().await.unwrap();

    let stored = warehouse.read_records(&daily_dump(), None).unwrap();
    assert_eq!(stored.len(), 4);
    assert!(stored.iter().all(|r| r.message == "MSG"));
}

#[tokio::test]
async fn test_zero_parallelism_rejected() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::new(memory_source(posts(1)), sink.clone(), daily_dump())
        .with_config(RunConfig::new().with_parallelism(0));

    assert!(matches!(
        pipeline.run().await,
        Err(Error::InvalidConfigValue { .. })
    ));
    assert_eq!(sink.load_count(), 0);
}
