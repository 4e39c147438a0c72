// Genome mapper
//
// Walks genome -> record -> feature -> qualifier and emits the rows for every
// table. Pure: no I/O, so the result can be written in one transaction by the
// storage layer (or inspected directly in tests).

use tracing::debug;

use crate::assigner::GenomeIds;
use crate::error::{ConvertError, Result};
use crate::location;
use crate::models::{
    FeatureRow, GenomeRow, MappedGenome, MappingStats, ParsedGenome, ParsedRecord, RecordRow,
};
use crate::qualifiers;

/// Map one parsed file onto rows using the ids reserved for it
pub fn map_genome(genome: &ParsedGenome, ids: &GenomeIds) -> Result<MappedGenome> {
    if ids.record_count() != genome.records.len() {
        return Err(ConvertError::internal(format!(
            "Reserved {} record ids for {} records in '{}'",
            ids.record_count(),
            genome.records.len(),
            genome.source_path
        )));
    }

    let mut mapped = MappedGenome {
        genome: GenomeRow {
            id: ids.genome_id,
            source_path: genome.source_path.clone(),
        },
        records: Vec::with_capacity(genome.records.len()),
        features: Vec::new(),
        qualifiers: Vec::new(),
        stats: MappingStats::default(),
    };

    for (ordinal, record) in genome.records.iter().enumerate() {
        let record_id = ids.record_id(ordinal).ok_or_else(|| {
            ConvertError::internal(format!("No record id reserved for record {}", ordinal))
        })?;
        map_record(record, record_id, ids, &mut mapped);
    }

    Ok(mapped)
}

fn map_record(record: &ParsedRecord, record_id: i64, ids: &GenomeIds, mapped: &mut MappedGenome) {
    mapped.records.push(RecordRow {
        id: record_id,
        genome_id: ids.genome_id,
        name: record.name.clone(),
        definition: record.definition.clone(),
        accession: record.accession.clone(),
        version: record.version.clone(),
    });

    for (index, feature) in record.features.iter().enumerate() {
        let key = ids.feature_key(record_id, index);
        let resolved = location::resolve(&feature.location);

        if resolved.bounds.is_none() {
            mapped.stats.unresolved_locations += 1;
            debug!(
                record = record.name.as_deref().unwrap_or("?"),
                feature_index = index,
                kind = %feature.kind,
                "Location has no local coordinates; storing null bounds"
            );
        } else if resolved.strand_conflict {
            mapped.stats.ambiguous_strands += 1;
            debug!(
                record = record.name.as_deref().unwrap_or("?"),
                feature_index = index,
                kind = %feature.kind,
                "Location parts disagree on strand; storing null strand"
            );
        }

        mapped.features.push(FeatureRow {
            genome_id: key.genome_id,
            record_id: key.record_id,
            feature_index: key.feature_index,
            kind: feature.kind.clone(),
            location_start: resolved.start(),
            location_end: resolved.end(),
            location_strand: resolved.strand,
        });

        mapped
            .qualifiers
            .extend(qualifiers::flatten(key, &feature.qualifiers));
    }
}
