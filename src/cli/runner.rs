//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{DestinationFormat, PipelineConfig};
use crate::decode::PostRecord;
use crate::error::{Error, Result};
use crate::output::{batch_to_records, read_parquet};
use crate::schema::post_schema;
use crate::sink::{ParquetSink, WarehouseSink};
use serde::Serialize;
use serde_json::json;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run => self.run_pipeline().await,
            Commands::Check => self.check().await,
            Commands::Validate => self.validate(),
            Commands::Schema => self.schema(),
            Commands::Plan => self.plan(),
            Commands::Inspect { limit } => self.inspect(*limit),
        }
    }

    /// Load configuration from `--config`, defaults and environment
    fn load_config(&self) -> Result<PipelineConfig> {
        PipelineConfig::load(self.cli.config.as_deref())
    }

    async fn run_pipeline(&self) -> Result<()> {
        let config = self.load_config()?;
        let pipeline = config.build_pipeline()?;

        tracing::info!(
            "Running post dump from {} into {}",
            config.source_table(),
            config.destination_table()
        );
        let stats = pipeline.run().await?;

        self.output(&json!({
            "type": "RUN",
            "status": "SUCCEEDED",
            "stats": stats,
        }))
    }

    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        let pipeline = config.build_pipeline()?;
        pipeline.check().await?;

        self.output(&json!({
            "type": "CONNECTION_STATUS",
            "status": "SUCCEEDED",
            "source": config.source_table().to_string(),
            "destination": config.destination_table().to_string(),
        }))
    }

    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        self.output(&json!({
            "type": "CONFIG",
            "status": "VALID",
            "config": config,
        }))
    }

    fn schema(&self) -> Result<()> {
        self.output(&post_schema())
    }

    fn plan(&self) -> Result<()> {
        let config = self.load_config()?;

        for (index, stage) in config.stages().iter().enumerate() {
            match self.cli.format {
                OutputFormat::Json => self.output(stage)?,
                OutputFormat::Pretty => println!("{}. {stage}", index + 1),
            }
        }
        Ok(())
    }

    fn inspect(&self, limit: usize) -> Result<()> {
        let config = self.load_config()?;
        let records = read_destination(&config, limit)?;

        for record in &records {
            self.output(record)?;
        }
        tracing::info!(
            "Printed {} rows from {}",
            records.len(),
            config.destination_table()
        );
        Ok(())
    }

    /// Print a value in the selected format
    fn output<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{text}");
        Ok(())
    }
}

/// Up to `limit` destination rows, ordered by `postId`
fn read_destination(config: &PipelineConfig, limit: usize) -> Result<Vec<PostRecord>> {
    let table = config.destination_table();
    let not_found = || Error::TableNotFound {
        table: table.to_string(),
    };

    match config.destination.format {
        DestinationFormat::Warehouse => {
            if !config.destination.path.is_file() {
                return Err(not_found());
            }
            WarehouseSink::open(&config.destination.path)?.read_records(&table, Some(limit))
        }
        DestinationFormat::Parquet => {
            let path = ParquetSink::new(&config.destination.path).table_path(&table);
            if !path.is_file() {
                return Err(not_found());
            }
            let mut records = Vec::new();
            for batch in read_parquet(&path)? {
                records.extend(batch_to_records(&batch)?);
            }
            records.sort_by(|a, b| a.post_id.cmp(&b.post_id));
            records.truncate(limit);
            Ok(records)
        }
    }
}
