//! Free-text field handling
//!
//! Request bodies arrive as loosely typed JSON: fields may be missing,
//! null, numbers, or padded strings. Everything is coerced to a trimmed
//! string, empty when unusable.

use serde_json::Value;

/// Trimmed string value of `field`, or "" when missing or not a string
pub fn string_field(body: &Value, field: &str) -> String {
    body.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Lower-cased search text built from several fields joined by spaces
pub fn search_text(parts: &[&str]) -> String {
    parts.join(" ").to_lowercase()
}

/// Count of keywords literally contained in the lower-cased text
pub fn count_keyword_hits(lowered: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|k| {
            let k = k.trim().to_lowercase();
            !k.is_empty() && lowered.contains(k.as_str())
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_field_coercion() {
        let body = json!({"crop": "  Rice ", "stage": 3, "soil": null});
        assert_eq!(string_field(&body, "crop"), "Rice");
        assert_eq!(string_field(&body, "stage"), "");
        assert_eq!(string_field(&body, "soil"), "");
        assert_eq!(string_field(&body, "weather"), "");
        assert_eq!(string_field(&json!([1, 2]), "crop"), "");
    }

    #[test]
    fn test_keyword_hits_case_insensitive() {
        let text = search_text(&["Dead Heart seen", "HUMID", ""]);
        let keywords = vec!["dead heart".to_string(), "FAW".to_string(), "humid".to_string(), "".to_string()];
        assert_eq!(count_keyword_hits(&text, &keywords), 2);
    }
}
