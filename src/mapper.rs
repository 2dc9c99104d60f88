use crate::domain::{
    ChemicalRecord, ElectricalRecord, MedicalRecord, MsdsRecord, NonTargetRecord, RadioRecord,
    Record, RecordType, ReviewNeededRecord, UserContext,
};
use crate::lawcode;
use crate::parser::ParsedTable;

/// Label-indexed view of one parsed row. Missing columns read as "".
struct Row<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> Row<'a> {
    fn get(&self, label: &str) -> String {
        self.headers
            .iter()
            .position(|header| header == label)
            .and_then(|index| self.cells.get(index))
            .cloned()
            .unwrap_or_default()
    }

    /// First non-empty value among alternative labels for the same column.
    fn get_any(&self, labels: &[&str]) -> String {
        for label in labels {
            let value = self.get(label);
            if !value.is_empty() {
                return value;
            }
        }
        String::new()
    }
}

fn company_default(user: Option<&UserContext>) -> String {
    user.map(|u| u.company_name.clone()).unwrap_or_default()
}

fn or_default(value: String, user: Option<&UserContext>) -> String {
    if value.is_empty() { company_default(user) } else { value }
}

/// Maps one row of localized column labels into the canonical record for
/// `record_type`. Owner columns (상호/수입자/화주/수입자상호) fall back to the
/// caller's company name; `created_by` is always the caller's username.
pub fn map_fields(
    headers: &[String],
    cells: &[String],
    record_type: RecordType,
    user: Option<&UserContext>,
) -> Record {
    let row = Row { headers, cells };
    let mut record = match record_type {
        RecordType::Chemical => {
            // both the ㆍ and · middle dots occur in the wild
            let model_spec = row.get_any(&["모델ㆍ규격", "모델·규격"]);
            let spec_no = {
                let explicit = row.get("규격정제");
                if explicit.is_empty() && !model_spec.is_empty() {
                    crate::parser::extract_spec_no(&model_spec)
                } else {
                    explicit
                }
            };
            Record::Chemical(ChemicalRecord {
                spec_no,
                no: row.get("No"),
                receipt_date: row.get("접수일자"),
                receipt_number: row.get("접수번호"),
                status: row.get("상태"),
                company: row.get("상호"),
                manager: row.get("담당자"),
                user: row.get("사용자"),
                product_name: row.get("제품명"),
                model_spec,
                import_country: row.get("수입국"),
                annual_import_qty: row.get("연간수입예정량"),
                hsk_no: row.get("HSK No"),
                division: row.get("구분"),
                usage: row.get("사용여부"),
                agent: row.get("대리인"),
                save_date: row.get("저장일자"),
                department: row.get("소속"),
                existing_registered: row.get("기존(등록)"),
                existing_exempted: row.get("기존(면제)"),
                new_registered: row.get("신규(등록)"),
                new_exempted: row.get("신규(면제)"),
                toxic_substance: row.get("유독물질"),
                permitted_substance: row.get("허가물질"),
                restricted_substance: row.get("제한물질"),
                prohibited_substance: row.get("금지물질"),
                accident_prep_substance: row.get("사고대비물질"),
                importer: or_default(row.get("상호"), user),
                ..ChemicalRecord::default()
            })
        }
        RecordType::Msds => Record::Msds(MsdsRecord {
            importer: or_default(row.get("수입자"), user),
            spec_no: row.get("규격정제"),
            internal_mgmt_no: row.get("내부관리 No"),
            substance: row.get("물질"),
            specific_gravity: row.get("비중"),
            existing_new: row.get_any(&["기존/신규(Cas)", "기존/신규"]),
            hazardous: row.get("유해"),
            note: row.get("비고"),
            mixture_type: row.get("혼합/단일"),
            ..MsdsRecord::default()
        }),
        RecordType::Radio => Record::Radio(RadioRecord {
            spec_no: row.get("규격정제"),
            consignee: or_default(row.get("화주"), user),
            model_name: row.get("모델명"),
            note: row.get("비고"),
            manufacturer: row.get("제조사"),
            manufacturing_country: row.get("제조국"),
            certification_no: row.get("인증번호"),
            certification_date: row.get("인증일자"),
            item_name: row.get("품목명"),
            derived_model_name: row.get("파생모델명"),
            ..RadioRecord::default()
        }),
        RecordType::Electrical => Record::Electrical(ElectricalRecord {
            spec_no: row.get("규격정제"),
            certification_agency: row.get("인증기관"),
            consignee: or_default(row.get("화주"), user),
            model_name: row.get("모델명"),
            note: row.get("비고"),
            manufacturer: row.get("제조사"),
            manufacturing_country: row.get("제조국"),
            certification_no: row.get("인증번호"),
            certification_date: row.get("인증일자"),
            item_name: row.get("품목명"),
            derived_model_name: row.get("파생모델명"),
            ..ElectricalRecord::default()
        }),
        RecordType::Medical => {
            let law = row.get("법령");
            let explicit_code = row.get("법령부호");
            Record::Medical(MedicalRecord {
                spec_no: row.get("규격정제"),
                law_code: if explicit_code.is_empty() {
                    lawcode::resolve(&law).to_string()
                } else {
                    explicit_code
                },
                law,
                importer: or_default(row.get("수입자"), user),
                exporter: row.get("수출자"),
                confirmation_status: row.get("확인 여부"),
                ..MedicalRecord::default()
            })
        }
        RecordType::NonTarget => {
            let law = row.get("법령");
            let explicit_code = row.get("법령부호");
            Record::NonTarget(NonTargetRecord {
                spec_no: row.get("규격정제"),
                law_code: if explicit_code.is_empty() {
                    lawcode::resolve(&law).to_string()
                } else {
                    explicit_code
                },
                law,
                importer: or_default(row.get("수입자"), user),
                exporter: row.get("수출자"),
                non_target_reason: row.get("비대상 사유"),
                ..NonTargetRecord::default()
            })
        }
        RecordType::ReviewNeeded => Record::ReviewNeeded(ReviewNeededRecord {
            spec_no: row.get("규격정제"),
            description: row.get("Description"),
            unit_price: row.get("단가"),
            hs_code: row.get("HS code"),
            importer: or_default(row.get("수입자상호"), user),
            exporter: row.get("해외공급처"),
            chemical_target: row.get("화학물질대상"),
            chemical_confirm: row.get("화관법(확인명세)"),
            msds_register: row.get("화평법(MSDS)"),
            medical_nuclear: row.get("의료기기/원안법"),
            radio_target: row.get("전파대상"),
            radio_cert: row.get("전파법인증"),
            radio_non_target: row.get("전파비대상"),
            electrical_target: row.get("전안법대상"),
            electrical_cert: row.get("전안법인증"),
            electrical_non_target: row.get("전안비대상"),
            note: row.get("비고"),
            action_note: row.get("조치사항"),
            ..ReviewNeededRecord::default()
        }),
    };
    record.meta_mut().created_by = user.map(|u| u.username.clone()).unwrap_or_default();
    record
}

/// Maps every row of a parsed table.
pub fn map_table(
    table: &ParsedTable,
    record_type: RecordType,
    user: Option<&UserContext>,
) -> Vec<Record> {
    table
        .rows
        .iter()
        .map(|cells| map_fields(&table.headers, cells, record_type, user))
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::parser;

    fn user() -> UserContext {
        UserContext {
            username: "jkim".to_string(),
            company_name: "영인과학(주)".to_string(),
            ..UserContext::default()
        }
    }

    fn strings(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn chemical_row_maps_with_importer_from_company() {
        let headers = strings(&["규격정제", "접수일자", "접수번호", "상태", "상호"]);
        let cells = strings(&["ABC-001", "2024-01-01", "R001", "접수", "테스트(주)"]);
        let record = map_fields(&headers, &cells, RecordType::Chemical, Some(&user()));
        assert_matches!(record, Record::Chemical(ref r) => {
            assert_eq!(r.spec_no, "ABC-001");
            assert_eq!(r.company, "테스트(주)");
            assert_eq!(r.importer, "테스트(주)");
            assert_eq!(r.meta.created_by, "jkim");
        });
    }

    #[test]
    fn missing_owner_column_defaults_to_user_company() {
        let headers = strings(&["규격정제"]);
        let cells = strings(&["ABC-001"]);
        let record = map_fields(&headers, &cells, RecordType::Chemical, Some(&user()));
        assert_matches!(record, Record::Chemical(ref r) => {
            assert_eq!(r.importer, "영인과학(주)");
        });
        let record = map_fields(&headers, &cells, RecordType::Chemical, None);
        assert_matches!(record, Record::Chemical(ref r) => {
            assert_eq!(r.importer, "");
            assert_eq!(r.meta.created_by, "");
        });
    }

    #[test]
    fn both_middle_dot_spellings_map_model_spec() {
        for label in ["모델ㆍ규격", "모델·규격"] {
            let headers = strings(&["규격정제", label]);
            let cells = strings(&["A-1", "M-100"]);
            let record = map_fields(&headers, &cells, RecordType::Chemical, None);
            assert_matches!(record, Record::Chemical(ref r) => {
                assert_eq!(r.model_spec, "M-100");
            });
        }
    }

    #[test]
    fn chemical_spec_no_derives_from_model_spec() {
        let headers = strings(&["제품명", "모델·규격"]);
        let cells = strings(&["에탄올", "ABC-001 500ml"]);
        let record = map_fields(&headers, &cells, RecordType::Chemical, None);
        assert_matches!(record, Record::Chemical(ref r) => {
            assert_eq!(r.spec_no, "ABC-001");
            assert_eq!(r.model_spec, "ABC-001 500ml");
        });
    }

    #[test]
    fn medical_law_code_backfills_from_law_name() {
        let headers = strings(&["규격정제", "법령", "수입자", "수출자"]);
        let cells = strings(&["A-1", "의료기기법", "", "ACME"]);
        let record = map_fields(&headers, &cells, RecordType::Medical, Some(&user()));
        assert_matches!(record, Record::Medical(ref r) => {
            assert_eq!(r.law_code, "72");
            assert_eq!(r.importer, "영인과학(주)");
        });
    }

    #[test]
    fn explicit_law_code_wins_over_resolver() {
        let headers = strings(&["규격정제", "법령부호", "법령"]);
        let cells = strings(&["A-1", "99", "의료기기법"]);
        let record = map_fields(&headers, &cells, RecordType::NonTarget, None);
        assert_matches!(record, Record::NonTarget(ref r) => {
            assert_eq!(r.law_code, "99");
        });
    }

    #[test]
    fn msds_existing_new_accepts_both_labels() {
        let headers = strings(&["규격정제", "기존/신규"]);
        let cells = strings(&["A-1", "신규"]);
        let record = map_fields(&headers, &cells, RecordType::Msds, None);
        assert_matches!(record, Record::Msds(ref r) => {
            assert_eq!(r.existing_new, "신규");
        });
    }

    #[test]
    fn maps_whole_parsed_table() {
        let text = "규격정제\t접수일자\t접수번호\t상태\t상호\nABC-001\t2024-01-01\tR001\t접수\t테스트(주)\n";
        let table = parser::parse(text, Some(RecordType::Chemical));
        let records = map_table(&table, RecordType::Chemical, Some(&user()));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].spec_no(), "ABC-001");
    }
}
