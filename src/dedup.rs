use std::collections::HashMap;

use crate::domain::Record;

/// Key-part separator. The parts are raw field values, so the joined key
/// is only unique as long as "||" never appears inside one.
const KEY_SEPARATOR: &str = "||";

/// Composite key identifying "the same record" within one track. Fields
/// compared verbatim, no trimming or case folding.
pub fn duplicate_key(record: &Record) -> String {
    record.key_fields().join(KEY_SEPARATOR)
}

/// True if `candidate` matches any existing record of the same track on
/// the track's three key fields. Records of a different track never
/// match; an empty corpus never matches.
pub fn is_duplicate(candidate: &Record, existing: &[Record]) -> bool {
    let ty = candidate.record_type();
    let key = candidate.key_fields();
    existing
        .iter()
        .filter(|record| record.record_type() == ty)
        .any(|record| record.key_fields() == key)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub key: String,
    /// The oldest record of the group, which survives the purge.
    pub keep: Record,
    /// Later arrivals, scheduled for deletion.
    pub delete: Vec<Record>,
}

/// Groups a corpus by composite key and returns every group with two or
/// more members. Within a group, records sort ascending by `created_at`
/// (missing timestamps first); the earliest is kept, the rest deleted.
pub fn find_duplicate_groups(corpus: &[Record]) -> Vec<DuplicateGroup> {
    let mut groups: HashMap<String, Vec<Record>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for record in corpus {
        let key = duplicate_key(record);
        let entry = groups.entry(key.clone()).or_default();
        if entry.is_empty() {
            order.push(key);
        }
        entry.push(record.clone());
    }

    let mut result = Vec::new();
    for key in order {
        let Some(mut members) = groups.remove(&key) else {
            continue;
        };
        if members.len() < 2 {
            continue;
        }
        members.sort_by(|a, b| {
            a.created_at()
                .partial_cmp(&b.created_at())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let keep = members.remove(0);
        result.push(DuplicateGroup {
            key,
            keep,
            delete: members,
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MedicalRecord, MsdsRecord, RadioRecord, Record};

    fn msds(importer: &str, spec_no: &str, substance: &str, created_at: Option<f64>) -> Record {
        let mut record = MsdsRecord {
            importer: importer.to_string(),
            spec_no: spec_no.to_string(),
            substance: substance.to_string(),
            ..MsdsRecord::default()
        };
        record.meta.created_at = created_at;
        record.meta.id = created_at.map(|t| format!("id-{t}"));
        Record::Msds(record)
    }

    #[test]
    fn exact_key_match_is_duplicate() {
        let existing = vec![msds("영인", "A-1", "64-17-5", Some(1.0))];
        let candidate = msds("영인", "A-1", "64-17-5", None);
        assert!(is_duplicate(&candidate, &existing));
    }

    #[test]
    fn differing_key_field_is_not_duplicate() {
        let existing = vec![msds("영인", "A-1", "64-17-5", Some(1.0))];
        let candidate = msds("영인", "A-1", "67-56-1", None);
        assert!(!is_duplicate(&candidate, &existing));
        assert!(!is_duplicate(&candidate, &[]));
    }

    #[test]
    fn whitespace_variants_are_distinct_keys() {
        let existing = vec![msds("영인", "A-1", "64-17-5", Some(1.0))];
        let candidate = msds("영인 ", "A-1", "64-17-5", None);
        assert!(!is_duplicate(&candidate, &existing));
    }

    #[test]
    fn other_track_records_never_match() {
        let existing = vec![Record::Medical(MedicalRecord {
            spec_no: "A-1".to_string(),
            law: "64-17-5".to_string(),
            importer: "영인".to_string(),
            ..MedicalRecord::default()
        })];
        // same three strings in key position, different track
        let candidate = msds("A-1", "64-17-5", "영인", None);
        assert!(!is_duplicate(&candidate, &existing));
    }

    #[test]
    fn groups_keep_oldest_and_delete_rest() {
        let corpus = vec![
            msds("영인", "A-1", "64-17-5", Some(300.0)),
            msds("영인", "A-1", "64-17-5", Some(100.0)),
            msds("영인", "B-2", "64-17-5", Some(50.0)),
            msds("영인", "A-1", "64-17-5", Some(200.0)),
        ];
        let groups = find_duplicate_groups(&corpus);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].keep.created_at(), 100.0);
        assert_eq!(groups[0].delete.len(), 2);
        assert_eq!(groups[0].delete[0].created_at(), 200.0);
        assert_eq!(groups[0].delete[1].created_at(), 300.0);
    }

    #[test]
    fn missing_created_at_sorts_first() {
        let corpus = vec![
            msds("영인", "A-1", "64-17-5", Some(100.0)),
            msds("영인", "A-1", "64-17-5", None),
        ];
        let groups = find_duplicate_groups(&corpus);
        assert_eq!(groups[0].keep.created_at(), 0.0);
    }

    #[test]
    fn radio_key_uses_certification_and_model() {
        let a = Record::Radio(RadioRecord {
            spec_no: "R-1".to_string(),
            certification_no: "C-1".to_string(),
            model_name: "M-1".to_string(),
            ..RadioRecord::default()
        });
        assert_eq!(duplicate_key(&a), "R-1||C-1||M-1");
    }
}
