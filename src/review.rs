use clap::ValueEnum;

use crate::domain::ReviewNeededRecord;

/// Derived worklists over the review-needed track: each filter selects
/// items still awaiting action under one law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReviewFilter {
    /// 화관법: chemical target, no confirmation record, not a device item.
    ChemicalConfirm,
    /// 화평법: chemical target, no confirmation record, MSDS missing or 신규.
    Msds,
    /// 전파법: radio-flagged, neither certified nor marked non-target.
    Radio,
    /// 전안법: electrical-flagged, neither certified nor marked non-target.
    Electrical,
}

impl ReviewFilter {
    pub fn matches(&self, record: &ReviewNeededRecord) -> bool {
        match self {
            ReviewFilter::ChemicalConfirm => {
                record.chemical_target == "Y"
                    && record.chemical_confirm.is_empty()
                    && record.medical_nuclear.is_empty()
            }
            ReviewFilter::Msds => {
                record.chemical_target == "Y"
                    && record.chemical_confirm.is_empty()
                    && (record.msds_register.is_empty() || record.msds_register == "신규")
            }
            ReviewFilter::Radio => {
                !record.radio_target.is_empty()
                    && record.radio_cert.is_empty()
                    && record.radio_non_target.is_empty()
            }
            ReviewFilter::Electrical => {
                !record.electrical_target.is_empty()
                    && record.electrical_cert.is_empty()
                    && record.electrical_non_target.is_empty()
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReviewFilter::ChemicalConfirm => "화관법 검토 필요",
            ReviewFilter::Msds => "화평법 검토 필요",
            ReviewFilter::Radio => "전파법 검토 필요",
            ReviewFilter::Electrical => "전안법 검토 필요",
        }
    }
}

pub fn apply<'a>(
    filter: ReviewFilter,
    records: &'a [ReviewNeededRecord],
) -> Vec<&'a ReviewNeededRecord> {
    records.iter().filter(|record| filter.matches(record)).collect()
}
