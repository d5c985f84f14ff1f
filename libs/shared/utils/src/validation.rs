use std::sync::OnceLock;

use regex::Regex;

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("phone pattern is valid"))
}

/// Phone number with spaces and dashes removed, or `None` unless 10 to 15
/// digits remain (an optional leading `+` is kept).
pub fn normalize_phone(raw: &str) -> Option<String> {
    let phone: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    phone_pattern().is_match(&phone).then_some(phone)
}
