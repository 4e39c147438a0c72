// Entity assigner
//
// Genome and record ids are surrogate counters shared by every worker of a
// run. Feature keys are derived: a feature is identified by its record plus
// its 0-based position in that record's feature list, so the same file always
// yields the same feature indices.

use std::sync::Mutex;

use crate::error::{ConvertError, Result};

/// Composite key of a feature row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureKey {
    pub genome_id: i64,
    pub record_id: i64,
    pub feature_index: i64,
}

/// Ids reserved for one input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenomeIds {
    pub genome_id: i64,
    first_record_id: i64,
    record_count: usize,
}

impl GenomeIds {
    /// Id of the record at `ordinal` (0-based position within the file)
    pub fn record_id(&self, ordinal: usize) -> Option<i64> {
        (ordinal < self.record_count).then(|| self.first_record_id + ordinal as i64)
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn feature_key(&self, record_id: i64, feature_index: usize) -> FeatureKey {
        FeatureKey {
            genome_id: self.genome_id,
            record_id,
            feature_index: feature_index as i64,
        }
    }
}

#[derive(Debug)]
struct Counters {
    next_genome_id: i64,
    next_record_id: i64,
}

/// Allocator for genome and record ids
///
/// Allocation happens under a mutex, so concurrent workers never receive the
/// same id. Ids handed to a file whose transaction later rolls back are not
/// reused.
#[derive(Debug)]
pub struct EntityAssigner {
    counters: Mutex<Counters>,
}

impl EntityAssigner {
    /// Assigner for an empty database: ids start at 1
    pub fn new() -> Self {
        Self::starting_after(0, 0)
    }

    /// Assigner continuing after the largest ids already stored
    pub fn starting_after(max_genome_id: i64, max_record_id: i64) -> Self {
        Self {
            counters: Mutex::new(Counters {
                next_genome_id: max_genome_id.max(0) + 1,
                next_record_id: max_record_id.max(0) + 1,
            }),
        }
    }

    /// Reserve a genome id and a contiguous block of `record_count` record ids
    pub fn allocate(&self, record_count: usize) -> Result<GenomeIds> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|e| ConvertError::internal(format!("Id allocator lock poisoned: {}", e)))?;

        let block = i64::try_from(record_count)
            .map_err(|_| ConvertError::internal("Record count does not fit an id range"))?;

        let ids = GenomeIds {
            genome_id: counters.next_genome_id,
            first_record_id: counters.next_record_id,
            record_count,
        };

        counters.next_genome_id += 1;
        counters.next_record_id += block;

        Ok(ids)
    }
}

impl Default for EntityAssigner {
    fn default() -> Self {
        Self::new()
    }
}
