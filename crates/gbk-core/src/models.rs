// Data models for GenBank conversion
//
// Three groups of types live here:
// - parsed input: plain carriers filled by the parser adapter
// - output rows: one struct per destination table
// - reports: per-file and per-batch outcomes

use serde::{Deserialize, Serialize};

// ============================================================================
// Parsed input
// ============================================================================

/// Strand of a genomic location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl Strand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
        }
    }

    pub fn invert(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw feature location as delivered by the parser
///
/// Coordinates are 0-based, end-exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    /// Single contiguous span
    Range {
        start: i64,
        end: i64,
        strand: Option<Strand>,
    },
    /// Reverse-strand wrapper
    Complement(Box<Location>),
    /// Discontinuous span made of several parts (join, order, ...)
    Join(Vec<Location>),
    /// Location with no coordinates on this record (gaps, references into
    /// other entries)
    Unresolvable,
}

impl Location {
    /// Forward-strand range, the shape most GenBank locations take
    pub fn range(start: i64, end: i64) -> Self {
        Location::Range {
            start,
            end,
            strand: Some(Strand::Forward),
        }
    }

    pub fn complement(inner: Location) -> Self {
        Location::Complement(Box::new(inner))
    }
}

/// One `/key=value` (or bare `/key`) annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifier {
    pub key: String,
    /// `None` for flag qualifiers such as `/pseudo`
    pub value: Option<String>,
}

impl Qualifier {
    pub fn new(key: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            key: key.into(),
            value: value.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFeature {
    /// Feature key: "gene", "CDS", "tRNA", ...
    pub kind: String,
    pub location: Location,
    pub qualifiers: Vec<Qualifier>,
}

/// One LOCUS entry of a GenBank file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub name: Option<String>,
    pub definition: Option<String>,
    pub accession: Option<String>,
    pub version: Option<String>,
    pub features: Vec<ParsedFeature>,
}

/// Everything parsed from one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedGenome {
    pub source_path: String,
    pub records: Vec<ParsedRecord>,
}

// ============================================================================
// Output rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeRow {
    pub id: i64,
    pub source_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRow {
    pub id: i64,
    pub genome_id: i64,
    pub name: Option<String>,
    pub definition: Option<String>,
    pub accession: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub genome_id: i64,
    pub record_id: i64,
    pub feature_index: i64,
    pub kind: String,
    pub location_start: Option<i64>,
    pub location_end: Option<i64>,
    pub location_strand: Option<Strand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifierRow {
    pub genome_id: i64,
    pub record_id: i64,
    pub feature_index: i64,
    pub qualifier_index: i64,
    pub key: String,
    pub value: Option<String>,
}

/// Counters describing lossy location handling within one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingStats {
    /// Features whose parts disagreed on strand (stored with null strand)
    pub ambiguous_strands: usize,
    /// Features with no resolvable coordinates (stored with null bounds)
    pub unresolved_locations: usize,
}

/// All rows produced from one input file, ready for a single transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedGenome {
    pub genome: GenomeRow,
    pub records: Vec<RecordRow>,
    pub features: Vec<FeatureRow>,
    pub qualifiers: Vec<QualifierRow>,
    pub stats: MappingStats,
}

// ============================================================================
// Reports
// ============================================================================

/// Outcome of a successfully converted file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub genome_id: i64,
    pub records: usize,
    pub features: usize,
    pub qualifiers: usize,
    pub stats: MappingStats,
    pub duration_seconds: f64,
}

/// A file whose conversion was rolled back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
    /// Whether the failure halted the remaining batch
    pub systemic: bool,
}

/// Summary of a batch conversion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub converted: Vec<FileReport>,
    pub failed: Vec<FileFailure>,
    /// Files never started because of cancellation or a halt
    pub skipped: Vec<String>,
    /// Reason the run stopped early after a systemic failure
    pub halted: Option<String>,
    pub cancelled: bool,
    pub duration_seconds: f64,
}

impl BatchReport {
    /// True when every file was attempted and committed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.halted.is_none() && self.skipped.is_empty()
    }

    pub fn total_files(&self) -> usize {
        self.converted.len() + self.failed.len() + self.skipped.len()
    }

    pub fn total_features(&self) -> usize {
        self.converted.iter().map(|r| r.features).sum()
    }

    pub fn total_qualifiers(&self) -> usize {
        self.converted.iter().map(|r| r.qualifiers).sum()
    }
}
