//! Best-effort recovery of a JSON payload from free-form LLM text. Models
//! inconsistently wrap JSON in fences; the brace heuristic recovers bare JSON
//! surrounded by prose. Malformed JSON inside either branch falls through.

use regex::Regex;

/// Extract a JSON object from raw LLM output. Tries a fenced ```json block
/// first, then the outermost `{ ... }` substring. Returns None when neither
/// parses; never errors.
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    let fence = Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap();
    if let Some(caps) = fence.captures(text)
        && let Some(body) = caps.get(1)
        && let Ok(value) = serde_json::from_str::<serde_json::Value>(body.as_str())
    {
        return Some(value);
    }

    let first = text.find('{')?;
    let last = text.rfind('}')?;
    if last > first {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text[first..=last]) {
            return Some(value);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_object_from_fenced_block_with_surrounding_prose() {
        let text = "Here you go:\n```json\n{\"summary\":\"ok\",\"jobs\":[]}\n```\nThanks";
        let value = extract_json(text).unwrap();
        assert_eq!(value["summary"], "ok");
        assert_eq!(value["jobs"], serde_json::json!([]));
    }

    #[test]
    fn fenced_round_trip_preserves_nested_structure() {
        let original = serde_json::json!({
            "summary": "two matches",
            "matches": [
                {"jobTitle": "Staff Engineer", "overallScore": 91, "skillGaps": []},
                {"jobTitle": "Platform Lead", "overallScore": 84, "skillGaps": [{"skill": "Go"}]}
            ]
        });
        let text = format!(
            "Sure, results below.\n```json\n{}\n```\nLet me know if you need more.",
            serde_json::to_string_pretty(&original).unwrap()
        );
        assert_eq!(extract_json(&text), Some(original));
    }

    #[test]
    fn recovers_bare_json_via_brace_substring() {
        let text = "The analysis found: {\"summary\": \"strong fit\", \"score\": 92} overall.";
        let value = extract_json(text).unwrap();
        assert_eq!(value["score"], 92);
    }

    #[test]
    fn malformed_fence_falls_through_to_brace_heuristic() {
        let text = "```json\nnot json at all\n``` but later {\"ok\": true} appears";
        let value = extract_json(text).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn returns_none_without_throwing_on_garbage() {
        assert_eq!(extract_json("no structured data here"), None);
        assert_eq!(extract_json("unbalanced } { braces"), None);
        assert_eq!(extract_json("{ definitely not json }"), None);
        assert_eq!(extract_json(""), None);
    }
}
