use std::collections::HashMap;
use std::collections::HashSet;

use crate::domain::MsdsRecord;

/// CAS numbers that never count toward the distinct-substance tally.
/// 7732-18-5 is water.
const EXCLUDED_CAS: &[&str] = &["7732-18-5"];

pub const SINGLE: &str = "단일시약";
pub const MIXTURE: &str = "혼합시약";
pub const MIXTURE_LOC: &str = "혼합시약(LOC)";

/// Labels every record with its 단일/혼합 mixture type, derived from the
/// other line items sharing its `spec_no`.
///
/// Per group: count distinct non-excluded, non-empty substances and sum
/// the specific gravity over all members (unparseable values contribute
/// nothing). Zero distinct substances is a single reagent; exactly one is
/// a single reagent unless the gravity sum stays below 100, which marks a
/// low-concentration mixture; two or more is a mixture. Records without a
/// `spec_no` are left untouched.
pub fn classify(records: &mut [MsdsRecord]) {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        if record.spec_no.is_empty() {
            continue;
        }
        groups.entry(record.spec_no.clone()).or_default().push(index);
    }

    for indices in groups.values() {
        let mut substances: HashSet<&str> = HashSet::new();
        let mut gravity_sum = 0.0_f64;
        for &index in indices {
            let record = &records[index];
            let substance = record.substance.trim();
            if !substance.is_empty() && !EXCLUDED_CAS.contains(&substance) {
                substances.insert(substance);
            }
            if let Ok(gravity) = record.specific_gravity.trim().parse::<f64>() {
                gravity_sum += gravity;
            }
        }

        let label = match substances.len() {
            0 => SINGLE,
            1 => {
                if gravity_sum < 100.0 {
                    MIXTURE_LOC
                } else {
                    SINGLE
                }
            }
            _ => MIXTURE,
        };
        for &index in indices {
            records[index].mixture_type = label.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(spec_no: &str, substance: &str, gravity: &str) -> MsdsRecord {
        MsdsRecord {
            spec_no: spec_no.to_string(),
            substance: substance.to_string(),
            specific_gravity: gravity.to_string(),
            ..MsdsRecord::default()
        }
    }

    #[test]
    fn two_substances_make_a_mixture() {
        let mut records = vec![
            record("A-1", "64-17-5", "60"),
            record("A-1", "67-56-1", "40"),
        ];
        classify(&mut records);
        assert_eq!(records[0].mixture_type, MIXTURE);
        assert_eq!(records[1].mixture_type, MIXTURE);
    }

    #[test]
    fn water_does_not_count_as_a_substance() {
        let mut records = vec![
            record("A-1", "64-17-5", "95"),
            record("A-1", "7732-18-5", "5"),
        ];
        classify(&mut records);
        // one distinct substance, gravity sum 100 -> single reagent
        assert_eq!(records[0].mixture_type, SINGLE);
    }

    #[test]
    fn dilute_single_substance_is_loc_mixture() {
        let mut records = vec![record("A-1", "64-17-5", "30")];
        classify(&mut records);
        assert_eq!(records[0].mixture_type, MIXTURE_LOC);
    }

    #[test]
    fn water_only_group_is_single() {
        let mut records = vec![record("A-1", "7732-18-5", "100")];
        classify(&mut records);
        assert_eq!(records[0].mixture_type, SINGLE);
    }

    #[test]
    fn unparseable_gravity_counts_as_zero() {
        let mut records = vec![
            record("A-1", "64-17-5", "abc"),
            record("A-1", "64-17-5", "50"),
        ];
        classify(&mut records);
        assert_eq!(records[0].mixture_type, MIXTURE_LOC);
    }

    #[test]
    fn empty_spec_no_is_left_alone() {
        let mut records = vec![record("", "64-17-5", "100")];
        classify(&mut records);
        assert_eq!(records[0].mixture_type, "");
    }

    #[test]
    fn groups_are_independent() {
        let mut records = vec![
            record("A-1", "64-17-5", "100"),
            record("B-2", "64-17-5", "50"),
            record("B-2", "67-56-1", "50"),
        ];
        classify(&mut records);
        assert_eq!(records[0].mixture_type, SINGLE);
        assert_eq!(records[1].mixture_type, MIXTURE);
        assert_eq!(records[2].mixture_type, MIXTURE);
    }
}
