/// Ordered keyword table mapping a law name fragment to its 2-digit import
/// requirement code. Order matters: the longer 수입식품 spelling with the
/// space must be tried before the spaceless one, and the first hit wins.
const LAW_CODES: &[(&str, &str)] = &[
    ("가축전염병예방법", "13"),
    ("의료기기법", "72"),
    ("전파법", "39"),
    ("인체조직법", "74"),
    ("어린이제품특별법", "88"),
    ("수입식품안전관리 특별법", "89"),
    ("수입식품안전관리특별법", "89"),
    ("전안법", "23"),
    ("원안법", "53"),
    ("약사법", "01"),
    ("사료관리법", "10"),
    ("식물방역법", "12"),
    ("화생무기금지법", "27"),
    ("방위사업법", "34"),
    ("유해화학물질관리법", "41"),
    ("먹는물관리법", "44"),
    ("산업안전보건법", "48"),
    ("총포도검법", "55"),
    ("에너지이용합리화법", "64"),
    ("마약류관리법", "69"),
    ("화장품법", "70"),
    ("야생동식물보호법", "71"),
    ("통신비밀보호법", "75"),
    ("석면안전관리법", "81"),
    ("생활주변방사선법", "86"),
    ("생활살생물제법", "87"),
    ("위생용품관리법", "94"),
];

/// Code returned when no table entry matches.
pub const UNRESOLVED: &str = "-";

/// Substring-matches `law_name` against the keyword table. Total: any
/// input, including empty, resolves to a code or the `"-"` sentinel.
pub fn resolve(law_name: &str) -> &'static str {
    if law_name.is_empty() {
        return UNRESOLVED;
    }
    LAW_CODES
        .iter()
        .find(|(keyword, _)| law_name.contains(keyword))
        .map(|(_, code)| *code)
        .unwrap_or(UNRESOLVED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_names() {
        assert_eq!(resolve("전파법"), "39");
        assert_eq!(resolve("약사법"), "01");
        assert_eq!(resolve("위생용품관리법"), "94");
    }

    #[test]
    fn resolves_embedded_names() {
        assert_eq!(resolve("「의료기기법」 제12조"), "72");
        assert_eq!(resolve("수입식품안전관리 특별법 대상"), "89");
        assert_eq!(resolve("수입식품안전관리특별법"), "89");
    }

    #[test]
    fn first_table_entry_wins() {
        // 전파법 is a substring of nothing earlier, but an input naming two
        // laws resolves to whichever appears first in the table.
        assert_eq!(resolve("의료기기법 및 전파법"), "72");
    }

    #[test]
    fn unknown_and_empty_return_sentinel() {
        assert_eq!(resolve("없는법"), UNRESOLVED);
        assert_eq!(resolve(""), UNRESOLVED);
        assert_eq!(resolve("   "), UNRESOLVED);
    }
}
