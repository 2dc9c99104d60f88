use std::sync::OnceLock;

use regex::Regex;

use crate::domain::RecordType;

/// Column labels that mark a line as a header row. Pasted tables sometimes
/// arrive without their header, so detection is by membership, not position.
const KNOWN_HEADERS: &[&str] = &[
    "규격정제",
    "접수일자",
    "접수번호",
    "상태",
    "상호",
    "수입자",
    "물질",
    "화주",
    "모델명",
    "인증번호",
    "법령",
    "수출자",
    "Description",
];

/// Header lists assumed when the pasted text carries none.
pub fn default_headers(record_type: Option<RecordType>) -> &'static [&'static str] {
    match record_type {
        Some(RecordType::Chemical) => &["규격정제", "접수일자", "접수번호", "상태", "상호"],
        Some(RecordType::Msds) => &[
            "수입자",
            "규격정제",
            "물질",
            "비중",
            "기존/신규",
            "유해",
            "비고",
        ],
        Some(RecordType::Radio) => &[
            "규격정제",
            "화주",
            "모델명",
            "비고",
            "제조사",
            "제조국",
            "인증번호",
            "인증일자",
            "품목명",
            "파생모델명",
        ],
        Some(RecordType::Electrical) => &[
            "규격정제",
            "인증기관",
            "화주",
            "모델명",
            "비고",
            "제조사",
            "제조국",
            "인증번호",
            "인증일자",
            "품목명",
            "파생모델명",
        ],
        Some(RecordType::Medical) => &["규격정제", "법령", "수입자", "수출자", "확인여부"],
        Some(RecordType::NonTarget) => &["규격정제", "법령", "수입자", "수출자", "비대상사유"],
        Some(RecordType::ReviewNeeded) => {
            &["규격정제", "Description", "수입자상호", "해외공급처", "비고"]
        }
        None => &["규격정제"],
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Splits tab-separated text into headers and data rows.
///
/// Cells split on tabs only (values may contain commas and spaces), each
/// cell trimmed, empty cells preserved so columns stay aligned. Blank
/// lines and trailing `\r` are dropped. If the first line contains any
/// known column label it is the header row; otherwise every line is data
/// and the per-type default headers apply. Short rows are right-padded
/// with empty strings. Empty input yields an empty table.
pub fn parse(text: &str, record_type: Option<RecordType>) -> ParsedTable {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return ParsedTable::default();
    }

    let split_cells = |line: &str| -> Vec<String> {
        line.split('\t').map(|cell| cell.trim().to_string()).collect()
    };

    let first = split_cells(lines[0]);
    let has_header = first.iter().any(|cell| KNOWN_HEADERS.contains(&cell.as_str()));

    let (headers, data_lines) = if has_header {
        (first, &lines[1..])
    } else {
        let defaults = default_headers(record_type)
            .iter()
            .map(|h| h.to_string())
            .collect();
        (defaults, &lines[..])
    };

    let rows = data_lines
        .iter()
        .map(|line| {
            let mut cells = split_cells(line);
            while cells.len() < headers.len() {
                cells.push(String::new());
            }
            cells
        })
        .collect();

    ParsedTable { headers, rows }
}

fn part_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^([A-Z0-9\-_]+)").unwrap())
}

fn catalog_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]{3}-[0-9]{3}-[0-9]{4})").unwrap())
}

/// Pulls a spec number out of a free-form model/spec cell: a leading
/// part-number run, else an embedded xxx-xxx-xxxx catalog number, else
/// the prefix before the first comma or space, else the whole value.
pub fn extract_spec_no(model_spec: &str) -> String {
    let trimmed = model_spec.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if let Some(captures) = part_number_re().captures(trimmed) {
        return captures[1].to_string();
    }
    if let Some(captures) = catalog_number_re().captures(trimmed) {
        return captures[1].to_string();
    }
    if let Some((prefix, _)) = trimmed.split_once(',') {
        return prefix.trim().to_string();
    }
    if let Some((prefix, _)) = trimmed.split_once(' ') {
        return prefix.to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_header_row() {
        let text = "규격정제\t접수일자\t접수번호\t상태\t상호\nABC-001\t2024-01-01\tR001\t접수\t테스트(주)";
        let table = parse(text, Some(RecordType::Chemical));
        assert_eq!(table.headers[0], "규격정제");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], "ABC-001");
    }

    #[test]
    fn headerless_paste_uses_defaults() {
        let text = "ABC-001\t2024-01-01\tR001\t접수\t테스트(주)";
        let table = parse(text, Some(RecordType::Chemical));
        assert_eq!(
            table.headers,
            vec!["규격정제", "접수일자", "접수번호", "상태", "상호"]
        );
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn values_with_commas_stay_in_one_cell() {
        let text = "ABC-001, 500g\t2024-01-01\tR001\t접수\t상호없음";
        let table = parse(text, Some(RecordType::Chemical));
        assert_eq!(table.rows[0][0], "ABC-001, 500g");
    }

    #[test]
    fn short_rows_are_right_padded() {
        let text = "규격정제\t접수일자\t접수번호\t상태\t상호\nABC-001\t2024-01-01";
        let table = parse(text, Some(RecordType::Chemical));
        assert_eq!(table.rows[0].len(), 5);
        assert_eq!(table.rows[0][4], "");
    }

    #[test]
    fn blank_lines_and_crlf_are_dropped() {
        let text = "규격정제\t상호\r\n\r\nA-1\tX\r\n   \nB-2\tY\n";
        let table = parse(text, None);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][0], "B-2");
    }

    #[test]
    fn empty_input_is_an_empty_table() {
        assert!(parse("", None).is_empty());
        assert!(parse("\n\n", None).is_empty());
    }

    #[test]
    fn empty_cells_preserve_alignment() {
        let text = "A-1\t\tR001\t\tX";
        let table = parse(text, Some(RecordType::Chemical));
        assert_eq!(table.rows[0][1], "");
        assert_eq!(table.rows[0][4], "X");
    }

    #[test]
    fn spec_no_from_leading_part_number() {
        assert_eq!(extract_spec_no("ABC-001 500g bottle"), "ABC-001");
        assert_eq!(extract_spec_no("abc_12-x, something"), "abc_12-x");
    }

    #[test]
    fn spec_no_from_catalog_pattern() {
        assert_eq!(extract_spec_no("품번 123-456-7890 시약"), "123-456-7890");
    }

    #[test]
    fn spec_no_falls_back_to_prefix() {
        assert_eq!(extract_spec_no("시약A, 500g"), "시약A");
        assert_eq!(extract_spec_no("시약A 500g"), "시약A");
        assert_eq!(extract_spec_no("  시약A  "), "시약A");
        assert_eq!(extract_spec_no(""), "");
    }
}
