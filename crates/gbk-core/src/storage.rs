// Storage layer for converted GenBank data
//
// Every input file is written inside one transaction: genome, records,
// features, qualifiers. Rows go out as multi-row INSERT statements chunked by
// the configured batch size, clamped so that no statement exceeds SQLite's
// bind-parameter limit. Any error drops the transaction, which rolls it back.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{QueryBuilder, Sqlite, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{ConvertConfig, DEFAULT_BATCH_SIZE};
use crate::error::{ConvertError, Result};
use crate::models::{FeatureRow, MappedGenome, QualifierRow, RecordRow};
use crate::schema;

/// Highest parameter number SQLite accepts in one statement (3.32+)
const SQLITE_MAX_BIND_PARAMS: usize = 32766;

const RECORD_COLUMNS: usize = 6;
const FEATURE_COLUMNS: usize = 7;
const QUALIFIER_COLUMNS: usize = 6;

/// Row counts of the four tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub genomes: i64,
    pub records: i64,
    pub features: i64,
    pub qualifiers: i64,
}

/// Referential and location checks over the whole database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Records pointing at a missing genome
    pub orphan_records: i64,
    /// Features pointing at a missing record (or a record of another genome)
    pub orphan_features: i64,
    /// Qualifiers pointing at a missing feature
    pub orphan_qualifiers: i64,
    /// Features with start > end, or only one bound set
    pub invalid_locations: i64,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.orphan_records == 0
            && self.orphan_features == 0
            && self.orphan_qualifiers == 0
            && self.invalid_locations == 0
    }
}

/// SQLite destination for converted genomes
#[derive(Debug, Clone)]
pub struct GenbankStore {
    pool: SqlitePool,
    batch_size: usize,
}

impl GenbankStore {
    /// Open (or create) the database file and make sure the schema exists
    pub async fn open(path: &Path, config: &ConvertConfig) -> Result<Self> {
        config.validate()?;

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        let options = if config.fast_import {
            options
                .journal_mode(SqliteJournalMode::Memory)
                .synchronous(SqliteSynchronous::Off)
                .pragma("temp_store", "MEMORY")
                .pragma("cache_size", "100000")
        } else {
            options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        // One writer per in-flight file; SQLite serializes them on its lock.
        let max_connections = u32::try_from(config.concurrency).unwrap_or(u32::MAX).max(1);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!(
            path = %path.display(),
            fast_import = config.fast_import,
            max_connections,
            "Opened SQLite database"
        );

        let store = Self::from_pool(pool, config.batch_size);
        store.init_schema().await?;
        Ok(store)
    }

    /// Open an existing database for inspection only
    ///
    /// Nothing is created or changed: no schema, no journal mode. Fails when
    /// the file lacks any of the converted tables.
    pub async fn open_read_only(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let missing = schema::missing_tables(&pool).await?;
        if !missing.is_empty() {
            pool.close().await;
            return Err(ConvertError::MissingTables {
                path: path.display().to_string(),
                missing: missing.join(", "),
            });
        }

        debug!(path = %path.display(), "Opened SQLite database read-only");
        Ok(Self::from_pool(pool, DEFAULT_BATCH_SIZE))
    }

    /// Private in-memory database, mainly for tests
    pub async fn in_memory(batch_size: usize) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // Each connection would see its own empty database, and dropping the
        // only one loses the data.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self::from_pool(pool, batch_size);
        store.init_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool, batch_size: usize) -> Self {
        Self {
            pool,
            batch_size: batch_size.max(1),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn init_schema(&self) -> Result<()> {
        schema::init_schema(&self.pool).await
    }

    pub async fn create_indexes(&self) -> Result<()> {
        info!("Creating secondary indexes");
        schema::create_indexes(&self.pool).await
    }

    /// Largest genome and record ids stored so far (0 when empty)
    pub async fn max_ids(&self) -> Result<(i64, i64)> {
        let genome: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) FROM genome")
            .fetch_one(&self.pool)
            .await?;
        let record: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) FROM record")
            .fetch_one(&self.pool)
            .await?;
        Ok((genome, record))
    }

    /// Write all rows of one file atomically
    pub async fn write_genome(&self, mapped: &MappedGenome) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO genome (id, source_path) VALUES (?1, ?2)")
            .bind(mapped.genome.id)
            .bind(mapped.genome.source_path.as_str())
            .execute(&mut *tx)
            .await?;

        self.insert_records(&mut tx, &mapped.records).await?;
        self.insert_features(&mut tx, &mapped.features).await?;
        self.insert_qualifiers(&mut tx, &mapped.qualifiers).await?;

        tx.commit().await?;

        debug!(
            genome_id = mapped.genome.id,
            records = mapped.records.len(),
            features = mapped.features.len(),
            qualifiers = mapped.qualifiers.len(),
            "Committed genome"
        );

        Ok(())
    }

    /// Rows per INSERT for a table with `columns` columns
    fn chunk_size(&self, columns: usize) -> usize {
        self.batch_size.min(SQLITE_MAX_BIND_PARAMS / columns).max(1)
    }

    async fn insert_records(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        rows: &[RecordRow],
    ) -> Result<()> {
        for chunk in rows.chunks(self.chunk_size(RECORD_COLUMNS)) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO record (id, genome_id, name, definition, accession, version) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.id)
                    .push_bind(row.genome_id)
                    .push_bind(row.name.as_deref())
                    .push_bind(row.definition.as_deref())
                    .push_bind(row.accession.as_deref())
                    .push_bind(row.version.as_deref());
            });
            builder.build().execute(&mut **tx).await?;
        }
        Ok(())
    }

    async fn insert_features(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        rows: &[FeatureRow],
    ) -> Result<()> {
        for chunk in rows.chunks(self.chunk_size(FEATURE_COLUMNS)) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO feature (genome_id, record_id, feature_index, kind, \
                 location_start, location_end, location_strand) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.genome_id)
                    .push_bind(row.record_id)
                    .push_bind(row.feature_index)
                    .push_bind(row.kind.as_str())
                    .push_bind(row.location_start)
                    .push_bind(row.location_end)
                    .push_bind(row.location_strand.map(|s| s.as_str()));
            });
            builder.build().execute(&mut **tx).await?;
        }
        Ok(())
    }

    async fn insert_qualifiers(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        rows: &[QualifierRow],
    ) -> Result<()> {
        for chunk in rows.chunks(self.chunk_size(QUALIFIER_COLUMNS)) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO qualifier (genome_id, record_id, feature_index, \
                 qualifier_index, key, value) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.genome_id)
                    .push_bind(row.record_id)
                    .push_bind(row.feature_index)
                    .push_bind(row.qualifier_index)
                    .push_bind(row.key.as_str())
                    .push_bind(row.value.as_deref());
            });
            builder.build().execute(&mut **tx).await?;
        }
        Ok(())
    }

    pub async fn counts(&self) -> Result<TableCounts> {
        Ok(TableCounts {
            genomes: self.scalar("SELECT COUNT(*) FROM genome").await?,
            records: self.scalar("SELECT COUNT(*) FROM record").await?,
            features: self.scalar("SELECT COUNT(*) FROM feature").await?,
            qualifiers: self.scalar("SELECT COUNT(*) FROM qualifier").await?,
        })
    }

    /// Look for dangling references and malformed bounds
    ///
    /// Foreign keys already guard writes made through this store; this also
    /// catches databases written with enforcement switched off.
    pub async fn check_integrity(&self) -> Result<IntegrityReport> {
        let orphan_records = self
            .scalar(
                "SELECT COUNT(*) FROM record r \
                 LEFT JOIN genome g ON g.id = r.genome_id \
                 WHERE g.id IS NULL",
            )
            .await?;

        let orphan_features = self
            .scalar(
                "SELECT COUNT(*) FROM feature f \
                 LEFT JOIN record r ON r.id = f.record_id AND r.genome_id = f.genome_id \
                 WHERE r.id IS NULL",
            )
            .await?;

        let orphan_qualifiers = self
            .scalar(
                "SELECT COUNT(*) FROM qualifier q \
                 LEFT JOIN feature f ON f.genome_id = q.genome_id \
                   AND f.record_id = q.record_id \
                   AND f.feature_index = q.feature_index \
                 WHERE f.genome_id IS NULL",
            )
            .await?;

        let invalid_locations = self
            .scalar(
                "SELECT COUNT(*) FROM feature \
                 WHERE (location_start IS NULL) <> (location_end IS NULL) \
                    OR location_start > location_end \
                    OR location_start < 0",
            )
            .await?;

        Ok(IntegrityReport {
            orphan_records,
            orphan_features,
            orphan_qualifiers,
            invalid_locations,
        })
    }

    async fn scalar(&self, sql: &str) -> Result<i64> {
        Ok(sqlx::query_scalar(sql).fetch_one(&self.pool).await?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::assigner::EntityAssigner;
    use crate::mapper::map_genome;
    use crate::models::{Location, ParsedFeature, ParsedGenome, ParsedRecord, Qualifier};

    fn genome(path: &str, features: usize) -> ParsedGenome {
        ParsedGenome {
            source_path: path.to_string(),
            records: vec![ParsedRecord {
                name: Some("REC".to_string()),
                features: (0..features)
                    .map(|i| ParsedFeature {
                        kind: "gene".to_string(),
                        location: Location::range(i as i64, i as i64 + 10),
                        qualifiers: vec![
                            Qualifier::new("locus_tag", Some(&format!("T{}", i))),
                            Qualifier::new("pseudo", None),
                        ],
                    })
                    .collect(),
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn test_write_and_count() {
        let store = GenbankStore::in_memory(100).await.unwrap();
        let assigner = EntityAssigner::new();

        let parsed = genome("a.gbk", 3);
        let mapped = map_genome(&parsed, &assigner.allocate(1).unwrap()).unwrap();
        store.write_genome(&mapped).await.unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(
            counts,
            TableCounts {
                genomes: 1,
                records: 1,
                features: 3,
                qualifiers: 6,
            }
        );
        assert_eq!(store.max_ids().await.unwrap(), (1, 1));
        assert!(store.check_integrity().await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn test_chunking_with_tiny_batches() {
        let store = GenbankStore::in_memory(2).await.unwrap();
        let parsed = genome("chunked.gbk", 7);
        let mapped = map_genome(&parsed, &EntityAssigner::new().allocate(1).unwrap()).unwrap();

        store.write_genome(&mapped).await.unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.features, 7);
        assert_eq!(counts.qualifiers, 14);
    }

    #[tokio::test]
    async fn test_chunk_size_respects_bind_limit() {
        let pool = SqlitePoolOptions::new().connect_lazy("sqlite::memory:").unwrap();
        let store = GenbankStore::from_pool(pool, 1_000_000);

        assert_eq!(store.chunk_size(FEATURE_COLUMNS), 32766 / 7);
        assert!(store.chunk_size(QUALIFIER_COLUMNS) * QUALIFIER_COLUMNS <= SQLITE_MAX_BIND_PARAMS);

        let small = GenbankStore::from_pool(store.pool().clone(), 0);
        assert_eq!(small.chunk_size(RECORD_COLUMNS), 1);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let store = GenbankStore::in_memory(100).await.unwrap();
        let parsed = genome("dup.gbk", 2);
        let mut mapped =
            map_genome(&parsed, &EntityAssigner::new().allocate(1).unwrap()).unwrap();

        // Duplicate qualifier key fails on the last table written.
        let duplicate = mapped.qualifiers[0].clone();
        mapped.qualifiers.push(duplicate);

        assert!(store.write_genome(&mapped).await.is_err());
        assert_eq!(store.counts().await.unwrap(), TableCounts::default());
    }

    #[tokio::test]
    async fn test_integrity_detects_orphans() {
        let store = GenbankStore::in_memory(100).await.unwrap();

        sqlx::query("PRAGMA foreign_keys = OFF")
            .execute(store.pool())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO qualifier (genome_id, record_id, feature_index, qualifier_index, key) \
             VALUES (9, 9, 0, 0, 'gene')",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let report = store.check_integrity().await.unwrap();
        assert_eq!(report.orphan_qualifiers, 1);
        assert!(!report.is_consistent());
    }

    async fn journal_mode(pool: &SqlitePool) -> String {
        sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_read_only_open_rejects_foreign_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.db");

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        let pool = SqlitePool::connect_with(options).await.unwrap();
        sqlx::query("CREATE TABLE unrelated (x INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let err = GenbankStore::open_read_only(&path).await.unwrap_err();
        assert!(matches!(err, ConvertError::MissingTables { .. }));
        assert!(err.to_string().contains("genome, record, feature, qualifier"));

        let pool = SqlitePool::connect_with(SqliteConnectOptions::new().filename(&path))
            .await
            .unwrap();
        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(tables, vec!["unrelated"]);
        assert_eq!(journal_mode(&pool).await, "delete");
    }

    #[tokio::test]
    async fn test_read_only_store_reads_but_cannot_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genomes.db");

        let config = ConvertConfig::new();
        let store = GenbankStore::open(&path, &config).await.unwrap();
        let parsed = genome("a.gbk", 2);
        let mapped = map_genome(&parsed, &EntityAssigner::new().allocate(1).unwrap()).unwrap();
        store.write_genome(&mapped).await.unwrap();
        store.close().await;

        let reader = GenbankStore::open_read_only(&path).await.unwrap();
        assert_eq!(reader.counts().await.unwrap().features, 2);
        assert!(reader.check_integrity().await.unwrap().is_consistent());

        let next_ids = EntityAssigner::starting_after(1, 1).allocate(1).unwrap();
        let again = map_genome(&parsed, &next_ids).unwrap();
        assert!(reader.write_genome(&again).await.is_err());
        assert_eq!(reader.counts().await.unwrap().genomes, 1);
    }
}
