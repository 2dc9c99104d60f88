use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::RegError;

/// The seven regulatory tracks handled by the console. Each maps to one
/// named table on the storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Chemical,
    Msds,
    Radio,
    Electrical,
    Medical,
    NonTarget,
    ReviewNeeded,
}

impl RecordType {
    pub const ALL: [RecordType; 7] = [
        RecordType::Chemical,
        RecordType::Msds,
        RecordType::Radio,
        RecordType::Electrical,
        RecordType::Medical,
        RecordType::NonTarget,
        RecordType::ReviewNeeded,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            RecordType::Chemical => "chemical_confirmation",
            RecordType::Msds => "msds",
            RecordType::Radio => "radio_law",
            RecordType::Electrical => "electrical_law",
            RecordType::Medical => "medical_device",
            RecordType::NonTarget => "non_target",
            RecordType::ReviewNeeded => "review_needed",
        }
    }

    /// Section label shown to users (the console is Korean-facing).
    pub fn label(&self) -> &'static str {
        match self {
            RecordType::Chemical => "화학물질확인",
            RecordType::Msds => "MSDS",
            RecordType::Radio => "전파법",
            RecordType::Electrical => "전안법",
            RecordType::Medical => "의료기기/원안법 등",
            RecordType::NonTarget => "비대상",
            RecordType::ReviewNeeded => "확인 필요 List",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordType::Chemical => "chemical",
            RecordType::Msds => "msds",
            RecordType::Radio => "radio",
            RecordType::Electrical => "electrical",
            RecordType::Medical => "medical",
            RecordType::NonTarget => "non_target",
            RecordType::ReviewNeeded => "review_needed",
        };
        write!(f, "{name}")
    }
}

impl FromStr for RecordType {
    type Err = RegError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "chemical" => Ok(RecordType::Chemical),
            "msds" => Ok(RecordType::Msds),
            "radio" => Ok(RecordType::Radio),
            "electrical" => Ok(RecordType::Electrical),
            "medical" => Ok(RecordType::Medical),
            "non_target" => Ok(RecordType::NonTarget),
            "review_needed" => Ok(RecordType::ReviewNeeded),
            other => Err(RegError::InvalidRecordType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Standard,
}

impl Default for Role {
    fn default() -> Self {
        Role::Standard
    }
}

/// Caller identity, passed explicitly everywhere it is needed. There is no
/// ambient session state in this crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserContext {
    pub username: String,
    pub company_name: String,
    pub role: Role,
    /// Additional company names this user may see records for.
    pub affiliates: Vec<String>,
}

impl UserContext {
    pub fn is_master(&self) -> bool {
        self.role == Role::Master
    }
}

/// System-assigned fields shared by every stored record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Epoch milliseconds assigned by the backend on insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
    pub created_by: String,
}

// All business fields are strings on purpose: values like spec_no
// "20001.210" must survive round-trips without numeric coercion.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemicalRecord {
    #[serde(flatten)]
    pub meta: Meta,
    pub spec_no: String,
    pub no: String,
    pub receipt_date: String,
    pub receipt_number: String,
    pub status: String,
    pub company: String,
    pub manager: String,
    pub user: String,
    pub product_name: String,
    pub model_spec: String,
    pub import_country: String,
    pub annual_import_qty: String,
    pub hsk_no: String,
    pub division: String,
    pub usage: String,
    pub agent: String,
    pub save_date: String,
    pub department: String,
    pub existing_registered: String,
    pub existing_exempted: String,
    pub new_registered: String,
    pub new_exempted: String,
    pub toxic_substance: String,
    pub permitted_substance: String,
    pub restricted_substance: String,
    pub prohibited_substance: String,
    pub accident_prep_substance: String,
    pub importer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsdsRecord {
    #[serde(flatten)]
    pub meta: Meta,
    pub importer: String,
    pub spec_no: String,
    pub internal_mgmt_no: String,
    /// CAS number of the substance on this line item.
    pub substance: String,
    /// Concentration proxy, summed per spec_no group by the classifier.
    pub specific_gravity: String,
    pub existing_new: String,
    pub hazardous: String,
    pub note: String,
    /// Derived by [`crate::classify`]; never authoritative in storage.
    pub mixture_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioRecord {
    #[serde(flatten)]
    pub meta: Meta,
    pub spec_no: String,
    pub consignee: String,
    pub model_name: String,
    pub note: String,
    pub manufacturer: String,
    pub manufacturing_country: String,
    pub certification_no: String,
    pub certification_date: String,
    pub item_name: String,
    pub derived_model_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectricalRecord {
    #[serde(flatten)]
    pub meta: Meta,
    pub spec_no: String,
    pub certification_agency: String,
    pub consignee: String,
    pub model_name: String,
    pub note: String,
    pub manufacturer: String,
    pub manufacturing_country: String,
    pub certification_no: String,
    pub certification_date: String,
    pub item_name: String,
    pub derived_model_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicalRecord {
    #[serde(flatten)]
    pub meta: Meta,
    pub spec_no: String,
    pub law: String,
    pub law_code: String,
    pub importer: String,
    pub exporter: String,
    pub confirmation_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonTargetRecord {
    #[serde(flatten)]
    pub meta: Meta,
    pub spec_no: String,
    pub law: String,
    pub law_code: String,
    pub importer: String,
    pub exporter: String,
    pub non_target_reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewNeededRecord {
    #[serde(flatten)]
    pub meta: Meta,
    pub spec_no: String,
    pub description: String,
    pub unit_price: String,
    pub hs_code: String,
    pub importer: String,
    pub exporter: String,
    pub chemical_target: String,
    pub chemical_confirm: String,
    pub msds_register: String,
    pub medical_nuclear: String,
    pub radio_target: String,
    pub radio_cert: String,
    pub radio_non_target: String,
    pub electrical_target: String,
    pub electrical_cert: String,
    pub electrical_non_target: String,
    pub note: String,
    pub action_note: String,
}

/// One record of any of the seven tracks. The discriminator is carried in
/// the variant; on the wire each variant is a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Chemical(ChemicalRecord),
    Msds(MsdsRecord),
    Radio(RadioRecord),
    Electrical(ElectricalRecord),
    Medical(MedicalRecord),
    NonTarget(NonTargetRecord),
    ReviewNeeded(ReviewNeededRecord),
}

impl Record {
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::Chemical(_) => RecordType::Chemical,
            Record::Msds(_) => RecordType::Msds,
            Record::Radio(_) => RecordType::Radio,
            Record::Electrical(_) => RecordType::Electrical,
            Record::Medical(_) => RecordType::Medical,
            Record::NonTarget(_) => RecordType::NonTarget,
            Record::ReviewNeeded(_) => RecordType::ReviewNeeded,
        }
    }

    /// Deserialize a flat table row into the variant for `record_type`.
    pub fn from_value(
        record_type: RecordType,
        value: serde_json::Value,
    ) -> Result<Record, serde_json::Error> {
        Ok(match record_type {
            RecordType::Chemical => Record::Chemical(serde_json::from_value(value)?),
            RecordType::Msds => Record::Msds(serde_json::from_value(value)?),
            RecordType::Radio => Record::Radio(serde_json::from_value(value)?),
            RecordType::Electrical => Record::Electrical(serde_json::from_value(value)?),
            RecordType::Medical => Record::Medical(serde_json::from_value(value)?),
            RecordType::NonTarget => Record::NonTarget(serde_json::from_value(value)?),
            RecordType::ReviewNeeded => Record::ReviewNeeded(serde_json::from_value(value)?),
        })
    }

    pub fn meta(&self) -> &Meta {
        match self {
            Record::Chemical(r) => &r.meta,
            Record::Msds(r) => &r.meta,
            Record::Radio(r) => &r.meta,
            Record::Electrical(r) => &r.meta,
            Record::Medical(r) => &r.meta,
            Record::NonTarget(r) => &r.meta,
            Record::ReviewNeeded(r) => &r.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut Meta {
        match self {
            Record::Chemical(r) => &mut r.meta,
            Record::Msds(r) => &mut r.meta,
            Record::Radio(r) => &mut r.meta,
            Record::Electrical(r) => &mut r.meta,
            Record::Medical(r) => &mut r.meta,
            Record::NonTarget(r) => &mut r.meta,
            Record::ReviewNeeded(r) => &mut r.meta,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.meta().id.as_deref()
    }

    /// Missing timestamps sort as 0 so undated records are kept first
    /// during duplicate reconciliation.
    pub fn created_at(&self) -> f64 {
        self.meta().created_at.unwrap_or(0.0)
    }

    pub fn spec_no(&self) -> &str {
        match self {
            Record::Chemical(r) => &r.spec_no,
            Record::Msds(r) => &r.spec_no,
            Record::Radio(r) => &r.spec_no,
            Record::Electrical(r) => &r.spec_no,
            Record::Medical(r) => &r.spec_no,
            Record::NonTarget(r) => &r.spec_no,
            Record::ReviewNeeded(r) => &r.spec_no,
        }
    }

    /// The field whose value identifies the record's owning company for
    /// access checks (importer or consignee depending on the track).
    pub fn owner(&self) -> &str {
        match self {
            Record::Chemical(r) => &r.company,
            Record::Msds(r) => &r.importer,
            Record::Radio(r) => &r.consignee,
            Record::Electrical(r) => &r.consignee,
            Record::Medical(r) => &r.importer,
            Record::NonTarget(r) => &r.importer,
            Record::ReviewNeeded(r) => &r.importer,
        }
    }

    /// The three fields whose joint equality defines "same record" for the
    /// variant's track. Compared verbatim: no trimming, no case folding.
    pub fn key_fields(&self) -> [&str; 3] {
        match self {
            Record::Chemical(r) => [&r.spec_no, &r.receipt_number, &r.product_name],
            Record::Msds(r) => [&r.importer, &r.spec_no, &r.substance],
            Record::Radio(r) => [&r.spec_no, &r.certification_no, &r.model_name],
            Record::Electrical(r) => [&r.spec_no, &r.certification_no, &r.model_name],
            Record::Medical(r) => [&r.spec_no, &r.law, &r.importer],
            Record::NonTarget(r) => [&r.spec_no, &r.law, &r.importer],
            Record::ReviewNeeded(r) => [&r.spec_no, &r.importer, &r.description],
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn record_type_round_trip() {
        for ty in RecordType::ALL {
            let parsed: RecordType = ty.to_string().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn record_type_rejects_unknown() {
        let err = "spreadsheet".parse::<RecordType>().unwrap_err();
        assert_matches!(err, RegError::InvalidRecordType(_));
    }

    #[test]
    fn table_names_match_backend() {
        assert_eq!(RecordType::Chemical.table_name(), "chemical_confirmation");
        assert_eq!(RecordType::Electrical.table_name(), "electrical_law");
        assert_eq!(RecordType::ReviewNeeded.table_name(), "review_needed");
    }

    #[test]
    fn spec_no_survives_as_string() {
        let row = serde_json::json!({
            "spec_no": "20001.210",
            "importer": "영인과학(주)",
            "substance": "64-17-5"
        });
        let record = Record::from_value(RecordType::Msds, row).unwrap();
        assert_eq!(record.spec_no(), "20001.210");
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let row = serde_json::json!({
            "spec_no": "A-1",
            "gs_project_id": "internal",
            "law": "전파법"
        });
        let record = Record::from_value(RecordType::NonTarget, row).unwrap();
        assert_matches!(record, Record::NonTarget(_));
    }

    #[test]
    fn missing_created_at_sorts_as_zero() {
        let record = Record::Msds(MsdsRecord::default());
        assert_eq!(record.created_at(), 0.0);
    }

    #[test]
    fn serializes_flat_without_meta_nesting() {
        let mut inner = MsdsRecord::default();
        inner.spec_no = "X-1".to_string();
        inner.meta.created_by = "jkim".to_string();
        let value = Record::Msds(inner).to_value().unwrap();
        assert_eq!(value["spec_no"], "X-1");
        assert_eq!(value["created_by"], "jkim");
        assert!(value.get("meta").is_none());
        assert!(value.get("id").is_none());
    }
}
