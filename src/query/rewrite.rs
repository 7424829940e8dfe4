//! Whole-query rewrites applied around the editing engine.

use regex::{Captures, Regex};

use super::token::{FilterText, TokenKind};

/// Trim leading whitespace and collapse every whitespace run into a single
/// space. `caret` is moved left by the number of chars removed before it.
pub fn normalize_whitespace(input: &str, caret: usize) -> (String, usize) {
    let mut out = String::with_capacity(input.len());
    let mut new_caret = 0;
    let mut previous_space = true;

    for (index, ch) in input.chars().enumerate() {
        let keep = if ch.is_whitespace() {
            !previous_space
        } else {
            true
        };
        if keep {
            out.push(if ch.is_whitespace() { ' ' } else { ch });
            if index < caret {
                new_caret += 1;
            }
        }
        previous_space = ch.is_whitespace();
    }

    (out, new_caret)
}

/// Rewrite `field : ""` and `field : ''` into `NOT field : *` for each of
/// `fields`, which is how the backend expresses "field is empty". The field
/// must be a whole word: `tags.assignee : ""` is left alone.
pub fn rewrite_empty_values(query: &str, fields: &[&str]) -> String {
    let mut out = query.to_string();
    for field in fields.iter().filter(|f| !f.is_empty()) {
        let pattern = format!(r#"(?i)(^|\s){}\s*:\s*(""|'')"#, regex::escape(field));
        let Ok(re) = Regex::new(&pattern) else {
            tracing::warn!(field, "skipping empty-value rewrite for unparsable field");
            continue;
        };
        out = re
            .replace_all(&out, |caps: &Captures<'_>| format!("{}NOT {} : *", &caps[1], field))
            .into_owned();
    }
    out
}

/// The field of the last clause when that clause still lacks a value.
pub fn pending_value_hint(tokens: &[FilterText]) -> Option<&str> {
    let clause_start = tokens
        .iter()
        .rposition(|t| t.kind == TokenKind::Condition)
        .map_or(0, |i| i + 1);
    let clause = &tokens[clause_start..];

    let field = clause.iter().find(|t| t.kind == TokenKind::Field)?;
    if clause.iter().any(|t| t.kind == TokenKind::Value) {
        return None;
    }
    Some(field.text.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tokenize;

    #[test]
    fn test_normalize_collapses_runs() {
        let (text, caret) = normalize_whitespace("status  :   x", 13);
        assert_eq!(text, "status : x");
        assert_eq!(caret, 10);
    }

    #[test]
    fn test_normalize_trims_leading_only() {
        let (text, caret) = normalize_whitespace("   status ", 10);
        assert_eq!(text, "status ");
        assert_eq!(caret, 7);
    }

    #[test]
    fn test_normalize_keeps_caret_before_removed_chars() {
        let (text, caret) = normalize_whitespace("a  b", 1);
        assert_eq!(text, "a b");
        assert_eq!(caret, 1);
    }

    #[test]
    fn test_normalize_converts_tabs() {
        let (text, _) = normalize_whitespace("a\tb", 0);
        assert_eq!(text, "a b");
    }

    #[test]
    fn test_rewrite_empty_values() {
        let fields = ["assignee"];
        assert_eq!(
            rewrite_empty_values(r#"assignee : "" AND status : x"#, &fields),
            "NOT assignee : * AND status : x"
        );
        assert_eq!(
            rewrite_empty_values("ASSIGNEE:''", &fields),
            "NOT assignee : *"
        );
        assert_eq!(
            rewrite_empty_values("assignee : admin", &fields),
            "assignee : admin"
        );
    }

    #[test]
    fn test_rewrite_matches_whole_field_names_only() {
        let fields = ["assignee"];
        assert_eq!(
            rewrite_empty_values(r#"tags.assignee : """#, &fields),
            r#"tags.assignee : """#
        );
        assert_eq!(
            rewrite_empty_values(r#"co_assignee : '' OR assignee : """#, &fields),
            "co_assignee : '' OR NOT assignee : *"
        );
        assert_eq!(
            rewrite_empty_values("status : x AND\tassignee:''", &fields),
            "status : x AND\tNOT assignee : *"
        );
    }

    #[test]
    fn test_rewrite_escapes_field_names() {
        let fields = ["a.b (x)"];
        assert_eq!(
            rewrite_empty_values(r#"a.b (x) : """#, &fields),
            "NOT a.b (x) : *"
        );
        assert_eq!(rewrite_empty_values(r#"aXb (x) : """#, &fields), r#"aXb (x) : """#);
    }

    #[test]
    fn test_pending_value_hint() {
        assert_eq!(pending_value_hint(&tokenize("status")), Some("status"));
        assert_eq!(pending_value_hint(&tokenize("status : ")), Some("status"));
        assert_eq!(pending_value_hint(&tokenize("status : x")), None);
        assert_eq!(
            pending_value_hint(&tokenize("status : x AND severity :")),
            Some("severity")
        );
        assert_eq!(pending_value_hint(&tokenize("status : x AND")), None);
        assert_eq!(pending_value_hint(&tokenize("")), None);
    }
}
