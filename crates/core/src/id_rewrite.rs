//! Finding and rewriting dependent-template ID literals during a copy.
//!
//! A dependent template's ID is its owner's ID followed by three digits, so
//! every `<source_id>ddd` run inside a serialized JSON schema is a candidate
//! reference. Candidates preceded by a `...TemplateId` comparison or key are
//! treated as structural and rewritten silently. All others are reported for
//! review so a human can exclude the ones that are plain text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::types::{DbId, DEPENDENT_ID_SUFFIX_DIGITS};

/// Characters of context captured on each side of a candidate match.
pub const CONTEXT_WINDOW_CHARS: usize = 50;

/// Characters before a match inspected by the safe-reference check.
const LOOK_BEHIND_CHARS: usize = 32;

/// Text preceding a structural ID reference.
///
/// Either a code comparison (`taskTemplateId == `) or a serialized JSON key
/// (`"taskTemplateId": `). Free text that happens to contain one of these
/// shapes is misclassified as structural; this is a known limitation.
static SAFE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"TemplateId(?:\s{0,3}={2,3}\s{0,3}|":\s{0,3})$"#).expect("valid regex")
});

/// One `<source_id>ddd` occurrence in a serialized schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMatch {
    /// Byte offset of the match in the serialized text.
    pub index: usize,
    /// The matched digits.
    pub literal: String,
    /// Surrounding context as it is now.
    pub before_replacing: String,
    /// Surrounding context with the match rewritten.
    pub after_replacing: String,
    /// Whether the match looks like a structural template reference.
    pub is_safe: bool,
}

/// Byte ranges of every `<source_id>ddd` run, leftmost first, non-overlapping.
fn candidate_ranges(text: &str, source_id: DbId) -> Vec<(usize, usize)> {
    let prefix = source_id.to_string();
    let suffix_len = DEPENDENT_ID_SUFFIX_DIGITS as usize;
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(&prefix) {
        let start = cursor + found;
        let digits_start = start + prefix.len();
        let end = digits_start + suffix_len;
        if end <= bytes.len() && bytes[digits_start..end].iter().all(u8::is_ascii_digit) {
            ranges.push((start, end));
            cursor = end;
        } else {
            cursor = start + 1;
        }
    }
    ranges
}

/// Byte offset `chars` characters before `idx`, clamped to the start.
fn window_start(text: &str, idx: usize, chars: usize) -> usize {
    if chars == 0 {
        return idx;
    }
    text[..idx]
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset `chars` characters after `idx`, clamped to the end.
fn window_end(text: &str, idx: usize, chars: usize) -> usize {
    text[idx..]
        .char_indices()
        .nth(chars)
        .map(|(i, _)| idx + i)
        .unwrap_or(text.len())
}

fn is_safe_reference(text: &str, start: usize) -> bool {
    let from = window_start(text, start, LOOK_BEHIND_CHARS);
    SAFE_PREFIX_RE.is_match(&text[from..start])
}

/// Find every candidate ID literal belonging to `source_id` in `text`.
///
/// `destination_id` is only used to render `after_replacing`.
pub fn find_id_matches(text: &str, source_id: DbId, destination_id: DbId) -> Vec<IdMatch> {
    let source = source_id.to_string();
    let destination = destination_id.to_string();

    candidate_ranges(text, source_id)
        .into_iter()
        .map(|(start, end)| {
            let ctx_start = window_start(text, start, CONTEXT_WINDOW_CHARS);
            let ctx_end = window_end(text, end, CONTEXT_WINDOW_CHARS);
            let literal = &text[start..end];
            let rewritten = format!("{destination}{}", &literal[source.len()..]);

            IdMatch {
                index: start,
                literal: literal.to_string(),
                before_replacing: text[ctx_start..ctx_end].to_string(),
                after_replacing: format!(
                    "{}{}{}",
                    &text[ctx_start..start],
                    rewritten,
                    &text[end..ctx_end]
                ),
                is_safe: is_safe_reference(text, start),
            }
        })
        .collect()
}

/// Rewrite every candidate literal except those starting at an excluded offset.
///
/// Only the owner prefix of each match changes; the three trailing digits are
/// kept.
pub fn rewrite_schema_ids(
    text: &str,
    source_id: DbId,
    destination_id: DbId,
    excluded_offsets: &HashSet<usize>,
) -> String {
    let source_len = source_id.to_string().len();
    let destination = destination_id.to_string();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for (start, end) in candidate_ranges(text, source_id) {
        if excluded_offsets.contains(&start) {
            continue;
        }
        out.push_str(&text[last..start]);
        out.push_str(&destination);
        out.push_str(&text[start + source_len..end]);
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

/// Serialize `value`, rewrite its ID literals and parse it back.
///
/// Offsets in `excluded_offsets` refer to the compact serialization produced
/// by [`serde_json::to_string`], the same text [`find_id_matches`] is run on.
pub fn rewrite_json_ids(
    value: &serde_json::Value,
    source_id: DbId,
    destination_id: DbId,
    excluded_offsets: &HashSet<usize>,
) -> Result<serde_json::Value, CoreError> {
    let text = serde_json::to_string(value)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize schema: {e}")))?;
    let rewritten = rewrite_schema_ids(&text, source_id, destination_id, excluded_offsets);
    serde_json::from_str(&rewritten)
        .map_err(|e| CoreError::Internal(format!("Rewritten schema is not valid JSON: {e}")))
}

/// Replace the leading `source_id` prefix of a dependent template ID.
pub fn remap_prefixed_id(id: DbId, source_id: DbId, destination_id: DbId) -> Result<DbId, CoreError> {
    let id_text = id.to_string();
    let suffix = id_text
        .strip_prefix(&source_id.to_string())
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Template {id} does not belong to workflow template {source_id}"
            ))
        })?;

    format!("{destination_id}{suffix}")
        .parse()
        .map_err(|_| CoreError::Validation(format!("Template id {destination_id}{suffix} is out of range")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn json_key_reference_is_safe_and_label_is_not() {
        let text = r#"{"taskTemplateId": 123045, "label": "Ref to 123045 in description"}"#;
        let matches = find_id_matches(text, 123, 456);

        assert_eq!(matches.len(), 2);
        assert!(matches[0].is_safe);
        assert!(!matches[1].is_safe);
        assert_eq!(matches[1].literal, "123045");
        assert!(matches[1].before_replacing.contains("Ref to 123045 in"));
        assert!(matches[1].after_replacing.contains("Ref to 456045 in"));
    }

    #[test]
    fn compact_json_key_is_safe() {
        let text = r#"{"documentTemplateId":123001}"#;
        let matches = find_id_matches(text, 123, 456);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].is_safe);
    }

    #[test]
    fn code_comparison_is_safe() {
        for text in [
            "if (taskTemplateId == 123001) return;",
            "if (taskTemplateId===123001) return;",
            "if (eventTemplateId   ===   123001) return;",
        ] {
            let matches = find_id_matches(text, 123, 456);
            assert_eq!(matches.len(), 1, "{text}");
            assert!(matches[0].is_safe, "{text}");
        }
    }

    #[test]
    fn too_much_whitespace_is_not_safe() {
        let matches = find_id_matches("taskTemplateId     == 123001", 123, 456);
        assert_eq!(matches.len(), 1);
        assert!(!matches[0].is_safe);
    }

    #[test]
    fn single_equals_is_not_safe() {
        let matches = find_id_matches("taskTemplateId = 123001", 123, 456);
        assert!(!matches[0].is_safe);
    }

    #[test]
    fn requires_three_trailing_digits() {
        assert!(find_id_matches("value 12304 end", 123, 456).is_empty());
        assert_eq!(find_id_matches("value 1230456 end", 123, 456).len(), 1);
    }

    #[test]
    fn context_window_is_bounded() {
        let text = format!("{}123001{}", "a".repeat(80), "b".repeat(80));
        let m = &find_id_matches(&text, 123, 456)[0];
        assert_eq!(m.index, 80);
        assert_eq!(
            m.before_replacing,
            format!("{}123001{}", "a".repeat(50), "b".repeat(50))
        );
        assert_eq!(
            m.after_replacing,
            format!("{}456001{}", "a".repeat(50), "b".repeat(50))
        );
    }

    #[test]
    fn context_window_respects_multibyte_chars() {
        let text = format!("{}123001{}", "é".repeat(60), "ü".repeat(60));
        let m = &find_id_matches(&text, 123, 456)[0];
        assert_eq!(m.before_replacing.chars().count(), 106);
    }

    #[test]
    fn rewrite_skips_excluded_offsets_only() {
        let text = r#"{"taskTemplateId":123002,"label":"call 123002"}"#;
        let matches = find_id_matches(text, 123, 456);
        let excluded: HashSet<usize> = [matches[1].index].into_iter().collect();

        let out = rewrite_schema_ids(text, 123, 456, &excluded);
        assert_eq!(out, r#"{"taskTemplateId":456002,"label":"call 123002"}"#);
    }

    #[test]
    fn rewrite_without_exclusions_replaces_every_match() {
        let out = rewrite_schema_ids("123001 and 123002", 123, 7, &HashSet::new());
        assert_eq!(out, "7001 and 7002");
    }

    #[test]
    fn rewrite_json_round_trips_structure() {
        let schema = json!({"properties": {"ref": {"taskTemplateId": 123004}}, "title": "keep"});
        let out = rewrite_json_ids(&schema, 123, 456, &HashSet::new()).unwrap();
        assert_eq!(out, json!({"properties": {"ref": {"taskTemplateId": 456004}}, "title": "keep"}));
    }

    #[test]
    fn remap_replaces_only_the_leading_prefix() {
        assert_eq!(remap_prefixed_id(123123, 123, 456).unwrap(), 456123);
        assert_eq!(remap_prefixed_id(12001, 12, 9).unwrap(), 9001);
    }

    #[test]
    fn remap_rejects_foreign_ids() {
        assert_matches!(remap_prefixed_id(99001, 123, 456), Err(CoreError::Validation(_)));
        assert_matches!(remap_prefixed_id(123, 123, 456), Err(CoreError::Validation(_)));
    }
}
