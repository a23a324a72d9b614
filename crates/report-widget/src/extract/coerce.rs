/// Parses a count cell. Thousands separators, quotes and surrounding
/// whitespace are stripped; anything that is not a non-negative integer
/// becomes 0.
pub fn coerce_count(raw: &str) -> u64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ',' | '"'))
        .collect();
    cleaned.trim().parse::<u64>().unwrap_or(0)
}

pub fn coerce_text(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}
