use serde_json::Value;

use crate::domain::{Record, RecordType};
use crate::error::RegError;

/// Prefix so Excel opens the file as UTF-8.
pub const UTF8_BOM: &str = "\u{feff}";

/// Localized header labels and the record fields behind them, in download
/// column order. Chemical repeats the 기존(등록)/기존(면제) pair under two
/// label sets, matching the legacy download layout.
fn columns(record_type: RecordType) -> (&'static [&'static str], &'static [&'static str]) {
    match record_type {
        RecordType::Chemical => (
            &[
                "규격정제", "No", "접수일자", "접수번호", "상태", "상호", "담당자", "사용자",
                "제품명", "모델ㆍ규격", "수입국", "연간수입예정량", "HSK No", "구분", "사용여부",
                "대리인", "저장일자", "소속", "등록(등록)", "등록(면제)", "기존(등록)",
                "기존(면제)", "신규(등록)", "신규(면제)", "유독물질", "허가물질", "제한물질",
                "금지물질", "사고대비물질",
            ],
            &[
                "spec_no", "no", "receipt_date", "receipt_number", "status", "company", "manager",
                "user", "product_name", "model_spec", "import_country", "annual_import_qty",
                "hsk_no", "division", "usage", "agent", "save_date", "department",
                "existing_registered", "existing_exempted", "existing_registered",
                "existing_exempted", "new_registered", "new_exempted", "toxic_substance",
                "permitted_substance", "restricted_substance", "prohibited_substance",
                "accident_prep_substance",
            ],
        ),
        RecordType::Msds => (
            &[
                "수입자", "규격정제", "내부관리 No", "물질", "비중", "기존/신규(Cas)", "유해",
                "비고", "혼합/단일",
            ],
            &[
                "importer", "spec_no", "internal_mgmt_no", "substance", "specific_gravity",
                "existing_new", "hazardous", "note", "mixture_type",
            ],
        ),
        RecordType::Radio => (
            &[
                "규격정제", "화주", "모델명", "비고", "제조사", "제조국", "인증번호", "인증일자",
                "품목명",
            ],
            &[
                "spec_no", "consignee", "model_name", "note", "manufacturer",
                "manufacturing_country", "certification_no", "certification_date", "item_name",
            ],
        ),
        RecordType::Electrical => (
            &[
                "규격정제", "인증기관", "화주", "모델명", "비고", "제조사", "제조국", "인증번호",
                "인증일자", "품목명",
            ],
            &[
                "spec_no", "certification_agency", "consignee", "model_name", "note",
                "manufacturer", "manufacturing_country", "certification_no", "certification_date",
                "item_name",
            ],
        ),
        RecordType::Medical => (
            &["규격정제", "법령", "법령부호", "수입자", "수출자", "확인 여부"],
            &[
                "spec_no", "law", "law_code", "importer", "exporter", "confirmation_status",
            ],
        ),
        RecordType::NonTarget => (
            &["규격정제", "법령", "법령부호", "수입자", "수출자", "비대상 사유"],
            &[
                "spec_no", "law", "law_code", "importer", "exporter", "non_target_reason",
            ],
        ),
        RecordType::ReviewNeeded => (
            &[
                "규격정제", "Description", "단가", "HS code", "수입자상호", "해외공급처",
                "화학물질대상", "화관법(확인명세)", "화평법(MSDS)", "의료기기/원안법", "전파대상",
                "전파법인증", "전파비대상", "전안법대상", "전안법인증", "전안비대상", "비고",
                "조치사항",
            ],
            &[
                "spec_no", "description", "unit_price", "hs_code", "importer", "exporter",
                "chemical_target", "chemical_confirm", "msds_register", "medical_nuclear",
                "radio_target", "radio_cert", "radio_non_target", "electrical_target",
                "electrical_cert", "electrical_non_target", "note", "action_note",
            ],
        ),
    }
}

/// Doubles quotes, then wraps the cell when it contains a comma, newline
/// or quote.
fn escape_cell(value: &str) -> String {
    let escaped = value.replace('"', "\"\"");
    if escaped.contains(',') || escaped.contains('\n') || escaped.contains('"') {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

/// Renders records as CSV with the track's localized header row. Empty
/// input yields an empty string, matching the legacy download behavior.
pub fn to_csv(records: &[Record], record_type: RecordType) -> Result<String, RegError> {
    if records.is_empty() {
        return Ok(String::new());
    }
    let (headers, fields) = columns(record_type);
    let mut csv = headers.join(",");
    csv.push('\n');
    for record in records {
        let value = record
            .to_value()
            .map_err(|err| RegError::UnexpectedResponse(err.to_string()))?;
        let row: Vec<String> = fields
            .iter()
            .map(|field| match value.get(field) {
                Some(Value::String(s)) => escape_cell(s),
                Some(Value::Null) | None => String::new(),
                Some(other) => escape_cell(&other.to_string()),
            })
            .collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    Ok(csv)
}

/// CSV with the UTF-8 byte-order mark prefixed, ready to write to disk.
pub fn to_csv_with_bom(records: &[Record], record_type: RecordType) -> Result<String, RegError> {
    let csv = to_csv(records, record_type)?;
    if csv.is_empty() {
        return Ok(csv);
    }
    Ok(format!("{UTF8_BOM}{csv}"))
}
