use crate::domain::{Record, UserContext};

/// Canonical form for company-name comparison: corporate suffixes
/// (주식회사, (주)) and all whitespace removed. "주식회사 영인과학",
/// "영인과학(주)" and "영인과학" all normalize to "영인과학".
pub fn normalize_company_name(name: &str) -> String {
    name.replace("주식회사", "")
        .replace("(주)", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Whether `user` may see a record owned by `owner`.
///
/// Masters see everything. Others see records whose normalized owner
/// matches their own company, one of their affiliates, or whose owner
/// field literally equals their username.
pub fn can_access(user: &UserContext, owner: &str) -> bool {
    if user.is_master() {
        return true;
    }
    let normalized_owner = normalize_company_name(owner);
    if user
        .affiliates
        .iter()
        .any(|affiliate| normalize_company_name(affiliate) == normalized_owner)
    {
        return true;
    }
    normalized_owner == normalize_company_name(&user.company_name) || owner == user.username
}

pub fn can_access_record(user: &UserContext, record: &Record) -> bool {
    can_access(user, record.owner())
}

/// Keeps only the records `user` may see.
pub fn visible<'a>(user: &UserContext, records: &'a [Record]) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| can_access_record(user, record))
        .collect()
}
