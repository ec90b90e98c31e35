//! Key vocabularies that identify parameter shapes.

/// Filing statuses, in display order.
pub const FILING_STATUSES: [&str; 7] = [
    "SINGLE",
    "JOINT",
    "SEPARATE",
    "HEAD_OF_HOUSEHOLD",
    "SURVIVING_SPOUSE",
    "WIDOW",
    "WIDOWER",
];

pub const HOUSING_TYPES: [&str; 2] = ["MULTI_FAMILY", "SINGLE_FAMILY"];

/// 50 states, DC and the inhabited territories.
pub const STATE_CODES: [&str; 56] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY", "DC", "GU", "PR", "VI", "AS", "MP",
];

/// Preferred entry when a breakdown has to be reduced to one number.
pub const CONTIGUOUS_US: &str = "CONTIGUOUS_US";

#[must_use]
pub fn is_filing_status(key: &str) -> bool {
    FILING_STATUSES.contains(&key)
}

#[must_use]
pub fn is_housing_type(key: &str) -> bool {
    HOUSING_TYPES.contains(&key)
}

#[must_use]
pub fn is_state_code(key: &str) -> bool {
    STATE_CODES.contains(&key)
}

/// State code encoded as the prefix of a variable identity (`ca_eitc` -> `CA`).
#[must_use]
pub fn state_prefix(identity: &str) -> Option<String> {
    let (prefix, rest) = identity.split_once('_')?;
    if prefix.len() != 2 || rest.is_empty() {
        return None;
    }
    let code = prefix.to_ascii_uppercase();
    is_state_code(&code).then_some(code)
}

/// `HEAD_OF_HOUSEHOLD` -> `Head Of Household`, `first_person` -> `First Person`.
#[must_use]
pub fn label_case(key: &str) -> String {
    key.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
