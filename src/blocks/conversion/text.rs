//! Conversions with text on either side.

/// Label of the first `(key, text)` entry whose key equals `raw`.
pub fn value_to_text<'a>(table: &'a [(f64, String)], raw: f64) -> Option<&'a str> {
    table
        .iter()
        .find(|(key, _)| *key == raw)
        .map(|(_, text)| text.as_str())
}

/// Label of the first `(lower, upper, text)` range containing `raw`.
pub fn range_to_text<'a>(ranges: &'a [(f64, f64, String)], raw: f64) -> Option<&'a str> {
    ranges
        .iter()
        .find(|(lo, hi, _)| *lo <= raw && raw <= *hi)
        .map(|(_, _, text)| text.as_str())
}

/// Value of the first entry whose key equals `raw`, else `default`.
pub fn text_to_value(table: &[(String, f64)], default: f64, raw: &str) -> f64 {
    table
        .iter()
        .find(|(key, _)| key == raw)
        .map_or(default, |(_, value)| *value)
}

/// Output text of the first pair whose input equals `raw`, else `default`,
/// else the input unchanged.
pub fn text_to_text(pairs: &[(String, String)], default: Option<&str>, raw: &str) -> String {
    pairs
        .iter()
        .find(|(input, _)| input == raw)
        .map(|(_, output)| output.as_str())
        .or(default)
        .unwrap_or(raw)
        .to_string()
}
