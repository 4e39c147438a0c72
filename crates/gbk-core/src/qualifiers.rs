// Qualifier flattener
//
// One output row per input qualifier, in input order. Repeated keys stay
// separate rows and flag qualifiers keep a null value.

use crate::assigner::FeatureKey;
use crate::models::{Qualifier, QualifierRow};

/// Expand a feature's qualifiers into rows keyed by the owning feature
pub fn flatten(feature: FeatureKey, qualifiers: &[Qualifier]) -> Vec<QualifierRow> {
    qualifiers
        .iter()
        .enumerate()
        .map(|(index, qualifier)| QualifierRow {
            genome_id: feature.genome_id,
            record_id: feature.record_id,
            feature_index: feature.feature_index,
            qualifier_index: index as i64,
            key: qualifier.key.clone(),
            value: qualifier.value.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> FeatureKey {
        FeatureKey {
            genome_id: 3,
            record_id: 7,
            feature_index: 2,
        }
    }

    #[test]
    fn test_repeated_and_flag_qualifiers() {
        let qualifiers = vec![
            Qualifier::new("gene", Some("abc")),
            Qualifier::new("db_xref", Some("x1")),
            Qualifier::new("db_xref", Some("x2")),
            Qualifier::new("pseudo", None),
        ];

        let rows = flatten(key(), &qualifiers);

        assert_eq!(rows.len(), 4);
        let pairs: Vec<(&str, Option<&str>)> = rows
            .iter()
            .map(|r| (r.key.as_str(), r.value.as_deref()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("gene", Some("abc")),
                ("db_xref", Some("x1")),
                ("db_xref", Some("x2")),
                ("pseudo", None),
            ]
        );
        assert_eq!(
            rows.iter().map(|r| r.qualifier_index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_rows_carry_feature_key() {
        let rows = flatten(key(), &[Qualifier::new("note", Some(""))]);
        assert_eq!(rows[0].genome_id, 3);
        assert_eq!(rows[0].record_id, 7);
        assert_eq!(rows[0].feature_index, 2);
        // An empty value is still a value, not a flag
        assert_eq!(rows[0].value.as_deref(), Some(""));
    }

    #[test]
    fn test_no_qualifiers() {
        assert!(flatten(key(), &[]).is_empty());
    }
}
