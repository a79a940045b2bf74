/// Parses an amount the way banking apps display it, e.g. "Rp50.137", "Rp. 50.000" or "50000".
/// The currency prefix and digit-grouping separators are stripped; anything else makes the value unusable
/// and returns `None`.
pub fn normalize_amount(displayed: &str) -> Option<i64> {
    let amount = regex::Regex::new(r"^(?:Rp\.?\s*)?([0-9][0-9.,]*)$").unwrap();
    let digits = amount
        .captures(displayed.trim())
        .and_then(|c| c.get(1).map(|m| m.as_str().chars().filter(char::is_ascii_digit).collect::<String>()))?;
    digits.parse::<i64>().ok()
}
