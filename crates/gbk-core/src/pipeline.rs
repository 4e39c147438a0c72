// GenBank conversion pipeline
//
// Converts a single input file:
// 1. Parse the file (blocking, off the async runtime)
// 2. Reserve genome and record ids
// 3. Map records, features and qualifiers onto rows
// 4. Write every row in one transaction

use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::assigner::EntityAssigner;
use crate::error::{ConvertError, Result};
use crate::mapper::map_genome;
use crate::models::{FileReport, ParsedGenome};
use crate::parser::read_genome;
use crate::storage::GenbankStore;

/// Reads one input file into parsed records
pub type GenomeReader = fn(&Path) -> Result<ParsedGenome>;

#[derive(Debug, Clone)]
pub struct GenbankPipeline {
    store: GenbankStore,
    assigner: Arc<EntityAssigner>,
    reader: GenomeReader,
}

impl GenbankPipeline {
    pub fn new(store: GenbankStore, assigner: Arc<EntityAssigner>) -> Self {
        Self {
            store,
            assigner,
            reader: read_genome,
        }
    }

    /// Replace the GenBank reader (plain/gzip file reader by default)
    pub fn with_reader(mut self, reader: GenomeReader) -> Self {
        self.reader = reader;
        self
    }

    /// Pipeline whose id counters continue after the rows already stored
    pub async fn resuming(store: GenbankStore) -> Result<Self> {
        let (max_genome_id, max_record_id) = store.max_ids().await?;
        if max_genome_id > 0 {
            info!(
                max_genome_id,
                max_record_id, "Appending to existing database"
            );
        }
        let assigner = EntityAssigner::starting_after(max_genome_id, max_record_id);
        Ok(Self::new(store, Arc::new(assigner)))
    }

    pub fn store(&self) -> &GenbankStore {
        &self.store
    }

    /// Convert one file; on error nothing from this file is stored
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn convert_file(&self, path: &Path) -> Result<FileReport> {
        let start_time = Instant::now();

        let owned = path.to_path_buf();
        let reader = self.reader;
        let parsed = tokio::task::spawn_blocking(move || reader(&owned))
            .await
            .map_err(|e| {
                // A parser panic is scoped to this file.
                if e.is_panic() {
                    ConvertError::parse(
                        path.display().to_string(),
                        format!("parser panicked: {}", panic_message(e.into_panic())),
                    )
                } else {
                    ConvertError::internal(format!("Parser task failed: {}", e))
                }
            })??;

        let ids = self.assigner.allocate(parsed.records.len())?;
        let mapped = map_genome(&parsed, &ids)?;

        self.store.write_genome(&mapped).await?;

        let report = FileReport {
            path: parsed.source_path,
            genome_id: mapped.genome.id,
            records: mapped.records.len(),
            features: mapped.features.len(),
            qualifiers: mapped.qualifiers.len(),
            stats: mapped.stats,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        };

        info!(
            genome_id = report.genome_id,
            records = report.records,
            features = report.features,
            qualifiers = report.qualifiers,
            ambiguous_strands = report.stats.ambiguous_strands,
            unresolved_locations = report.stats.unresolved_locations,
            "Converted file in {:.2}s",
            report.duration_seconds
        );

        Ok(report)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
