//! SQLite schema for converted GenBank data

use sqlx::SqlitePool;

use crate::error::Result;

/// Tables every converted database has
pub const TABLE_NAMES: [&str; 4] = ["genome", "record", "feature", "qualifier"];

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS genome (
        id INTEGER PRIMARY KEY,
        source_path TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS record (
        id INTEGER PRIMARY KEY,
        genome_id INTEGER NOT NULL REFERENCES genome(id),
        name TEXT,
        definition TEXT,
        accession TEXT,
        version TEXT,

        -- parent key for the feature foreign key below
        UNIQUE (genome_id, id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS feature (
        genome_id INTEGER NOT NULL,
        record_id INTEGER NOT NULL,
        feature_index INTEGER NOT NULL,
        kind TEXT NOT NULL,

        -- 0-based, end-exclusive; both NULL when the location has no
        -- coordinates on this record
        location_start INTEGER,
        location_end INTEGER,
        location_strand TEXT CHECK (location_strand IN ('+', '-')),

        PRIMARY KEY (genome_id, record_id, feature_index),
        FOREIGN KEY (genome_id, record_id) REFERENCES record(genome_id, id),
        CHECK (location_start IS NULL OR location_start <= location_end)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS qualifier (
        genome_id INTEGER NOT NULL,
        record_id INTEGER NOT NULL,
        feature_index INTEGER NOT NULL,
        qualifier_index INTEGER NOT NULL,
        key TEXT NOT NULL,
        value TEXT,

        PRIMARY KEY (genome_id, record_id, feature_index, qualifier_index),
        FOREIGN KEY (genome_id, record_id, feature_index)
            REFERENCES feature(genome_id, record_id, feature_index)
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_record_genome ON record(genome_id)",
    "CREATE INDEX IF NOT EXISTS idx_record_accession ON record(accession)",
    "CREATE INDEX IF NOT EXISTS idx_feature_kind ON feature(kind)",
    "CREATE INDEX IF NOT EXISTS idx_qualifier_key ON qualifier(key, value)",
];

/// Create the four tables if they do not exist yet
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for statement in TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Which of [`TABLE_NAMES`] the database does not have
pub async fn missing_tables(pool: &SqlitePool) -> Result<Vec<&'static str>> {
    let present: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await?;

    Ok(TABLE_NAMES
        .iter()
        .copied()
        .filter(|table| !present.iter().any(|name| name == table))
        .collect())
}

/// Create secondary lookup indexes
///
/// Cheaper to build once after a bulk import than to maintain per insert.
pub async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    for statement in INDEXES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
