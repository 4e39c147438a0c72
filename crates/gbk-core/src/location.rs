// Location resolver
//
// Collapses any feature location into a single (start, end, strand) triple.
// Compound locations keep only their outer bounds; the individual spans and
// their order are dropped. Strand is reported only when every resolvable part
// agrees on it.

use crate::models::{Location, Strand};

/// Flattened form of a feature location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// `(start, end)` with `start <= end`; `None` when no part of the
    /// location has coordinates on the record
    pub bounds: Option<(i64, i64)>,
    pub strand: Option<Strand>,
    /// Set when parts carried different strands and the strand was dropped
    pub strand_conflict: bool,
}

impl ResolvedLocation {
    pub fn start(&self) -> Option<i64> {
        self.bounds.map(|(start, _)| start)
    }

    pub fn end(&self) -> Option<i64> {
        self.bounds.map(|(_, end)| end)
    }

    fn unresolved() -> Self {
        Self {
            bounds: None,
            strand: None,
            strand_conflict: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: i64,
    end: i64,
    strand: Option<Strand>,
}

/// Resolve a location to its outer bounds and consensus strand
///
/// Never fails: exotic or malformed input degrades to wider bounds and a
/// null strand.
pub fn resolve(location: &Location) -> ResolvedLocation {
    let mut spans = Vec::new();
    collect_spans(location, false, &mut spans);

    let Some(first) = spans.first().copied() else {
        return ResolvedLocation::unresolved();
    };

    let mut start = first.start;
    let mut end = first.end;
    let mut strand = first.strand;
    let mut strand_conflict = false;

    for span in &spans[1..] {
        start = start.min(span.start);
        end = end.max(span.end);
        if span.strand != strand {
            strand_conflict |= strand.is_some() || span.strand.is_some();
            strand = None;
        }
    }

    ResolvedLocation {
        bounds: Some((start, end)),
        strand,
        strand_conflict,
    }
}

fn collect_spans(location: &Location, reverse: bool, spans: &mut Vec<Span>) {
    match location {
        Location::Range { start, end, strand } => {
            let (start, end) = if end < start {
                (*end, *start)
            } else {
                (*start, *end)
            };
            let strand = if reverse {
                strand.map(Strand::invert)
            } else {
                *strand
            };
            spans.push(Span { start, end, strand });
        },
        Location::Complement(inner) => collect_spans(inner, !reverse, spans),
        Location::Join(parts) => {
            for part in parts {
                collect_spans(part, reverse, spans);
            }
        },
        Location::Unresolvable => {},
    }
}
