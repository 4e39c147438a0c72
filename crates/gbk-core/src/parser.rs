// GenBank file reader
//
// Adapts the `gb-io` streaming parser to the plain carriers in `models`, so
// nothing downstream depends on the parser's object model. Gzip-compressed
// input is detected by its magic bytes and decompressed on the fly.

use flate2::bufread::MultiGzDecoder;
use gb_io::reader::SeqReader;
use gb_io::seq::{Feature, Location as GbLocation, Seq};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::models::{Location, ParsedFeature, ParsedGenome, ParsedRecord, Qualifier};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read and parse every record of a GenBank file (plain or gzip)
pub fn read_genome(path: &Path) -> Result<ParsedGenome> {
    let source_path = path.display().to_string();
    let file = File::open(path).map_err(|e| ConvertError::io(&source_path, e))?;
    let mut reader = BufReader::new(file);

    let is_gzip = reader
        .fill_buf()
        .map_err(|e| ConvertError::io(&source_path, e))?
        .starts_with(&GZIP_MAGIC);

    if is_gzip {
        debug!(path = %source_path, "Reading gzip-compressed GenBank file");
        parse_genome(&source_path, MultiGzDecoder::new(reader))
    } else {
        parse_genome(&source_path, reader)
    }
}

/// Parse GenBank text from any reader
///
/// A syntax error in any record fails the whole input; an input without a
/// single record is rejected as not being GenBank at all.
pub fn parse_genome<R: Read>(source_path: &str, reader: R) -> Result<ParsedGenome> {
    let mut records = Vec::new();

    for (index, result) in SeqReader::new(reader).enumerate() {
        let seq = result.map_err(|e| {
            ConvertError::parse(source_path, format!("record {}: {}", index + 1, e))
        })?;
        records.push(convert_seq(seq));
    }

    if records.is_empty() {
        return Err(ConvertError::EmptyInput(source_path.to_string()));
    }

    debug!(path = %source_path, records = records.len(), "Parsed GenBank file");

    Ok(ParsedGenome {
        source_path: source_path.to_string(),
        records,
    })
}

fn convert_seq(seq: Seq) -> ParsedRecord {
    ParsedRecord {
        name: seq.name,
        definition: seq.definition,
        accession: seq.accession,
        version: seq.version,
        features: seq.features.iter().map(convert_feature).collect(),
    }
}

fn convert_feature(feature: &Feature) -> ParsedFeature {
    ParsedFeature {
        kind: feature.kind.to_string(),
        location: convert_location(&feature.location),
        qualifiers: feature
            .qualifiers
            .iter()
            .map(|(key, value)| Qualifier {
                key: key.to_string(),
                value: value.clone(),
            })
            .collect(),
    }
}

/// Map a `gb-io` location onto the resolver's location model
///
/// Coordinates are already 0-based and end-exclusive. Every operator that
/// groups several spans (join, order, bond, one-of) becomes a compound
/// location; references into other entries and gaps have no local
/// coordinates.
pub fn convert_location(location: &GbLocation) -> Location {
    match location {
        GbLocation::Range((start, _), (end, _)) => Location::range(*start, *end),
        GbLocation::Between(start, end) => Location::range(*start, *end),
        GbLocation::Complement(inner) => Location::complement(convert_location(inner)),
        GbLocation::Join(parts)
        | GbLocation::Order(parts)
        | GbLocation::Bond(parts)
        | GbLocation::OneOf(parts) => Location::Join(parts.iter().map(convert_location).collect()),
        GbLocation::External(_, _) | GbLocation::Gap(_) => Location::Unresolvable,
    }
}
