use serde::Serialize;

use super::context::{FocusContext, Panel};

/// Result of splicing a suggestion into the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Splice {
    pub text: String,
    /// Char offset of the caret in `text`; always within `0..=len`.
    pub caret: usize,
}

/// Rewrite `input` with `chosen` at the position described by `context`.
///
/// A non-empty `next_text` is replaced in place; otherwise `chosen` and
/// `separator` are inserted at `replace_start`. Without a panel the
/// suggestion is appended. Out-of-range offsets are clamped.
pub fn splice(input: &str, context: &FocusContext, chosen: &str, separator: &str) -> Splice {
    let mut chars: Vec<char> = input.chars().collect();
    let chosen_len = chosen.chars().count();

    let caret = if context.show == Panel::None {
        chars.extend(chosen.chars().chain(separator.chars()));
        chars.len()
    } else if !context.next_text.is_empty() {
        let start = context.replace_start.min(chars.len());
        let end = (start + context.next_text.chars().count()).min(chars.len());
        chars.splice(start..end, chosen.chars());
        start + chosen_len + 1
    } else {
        let start = context.replace_start.min(chars.len());
        let inserted: Vec<char> = chosen.chars().chain(separator.chars()).collect();
        let caret = start + inserted.len();
        chars.splice(start..start, inserted);
        caret
    };

    let mut text = normalize_separators(&chars.into_iter().collect::<String>());
    let mut len = text.chars().count();
    if caret > len {
        text.push_str(separator);
        len += separator.chars().count();
    }

    Splice {
        text,
        caret: caret.min(len),
    }
}

/// [`splice`] for an editor whose text lacks the separator the context
/// expects, as with the caret at the very end of `status`: the missing
/// space is added before splicing.
pub fn splice_padded(input: &str, context: &FocusContext, chosen: &str, separator: &str) -> Splice {
    let needs_space = context.show != Panel::None
        && context.next_text.is_empty()
        && context.replace_start > input.chars().count();
    if needs_space {
        return splice(&format!("{} ", input), context, chosen, separator);
    }
    splice(input, context, chosen, separator)
}

/// Drop separator characters that follow an existing `" : "`, so quick
/// successive picks cannot produce `status :  : x`.
pub fn normalize_separators(input: &str) -> String {
    let mut out: Vec<char> = Vec::with_capacity(input.len());
    for ch in input.chars() {
        if (ch == ':' || ch.is_whitespace()) && out.ends_with(&[' ', ':', ' ']) {
            continue;
        }
        out.push(ch);
    }
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_double_separator(text: &str) -> bool {
        text.match_indices(" : ").any(|(i, m)| {
            text[i + m.len()..]
                .trim_start()
                .starts_with(": ")
        })
    }

    #[test]
    fn test_insert_condition_after_value() {
        let ctx = FocusContext::new(Panel::Condition, 18, "");
        let result = splice("status : ABNORMAL ", &ctx, "AND", " ");
        assert_eq!(result.text, "status : ABNORMAL AND ");
        assert_eq!(result.caret, 22);
    }

    #[test]
    fn test_insert_method_after_field() {
        let ctx = FocusContext::new(Panel::Method, 7, "");
        let result = splice("status ", &ctx, ":", " ");
        assert_eq!(result.text, "status : ");
        assert_eq!(result.caret, 9);
    }

    #[test]
    fn test_replace_in_place() {
        let ctx = FocusContext::new(Panel::Method, 7, "=");
        let result = splice("status = ABNORMAL", &ctx, ":", " ");
        assert_eq!(result.text, "status : ABNORMAL");
        assert_eq!(result.caret, 9);
    }

    #[test]
    fn test_replace_value_in_the_middle() {
        let ctx = FocusContext::value(9, "ABNORMAL", "status");
        let result = splice("status : ABNORMAL AND severity : 1", &ctx, "CLOSED", " ");
        assert_eq!(result.text, "status : CLOSED AND severity : 1");
        assert_eq!(result.caret, 16);
    }

    #[test]
    fn test_field_insertion_collapses_extra_space() {
        let ctx = FocusContext::new(Panel::Field, 22, "");
        let result = splice("status : ABNORMAL AND ", &ctx, "severity : ", " ");
        assert_eq!(result.text, "status : ABNORMAL AND severity :  ");
        assert_eq!(result.caret, 34);
        assert!(!has_double_separator(&result.text));
    }

    #[test]
    fn test_replacing_field_does_not_double_the_method() {
        // Picking a field over "status" in "status : x" inserts "severity : ".
        let ctx = FocusContext::new(Panel::Field, 0, "status");
        let result = splice("status : x", &ctx, "severity : ", " ");
        assert_eq!(result.text, "severity : x");
        assert!(!has_double_separator(&result.text));
        assert!(result.caret <= result.text.chars().count());
    }

    #[test]
    fn test_special_field_with_empty_separator() {
        let ctx = FocusContext::new(Panel::Field, 0, "");
        let result = splice("", &ctx, "tags.", "");
        assert_eq!(result.text, "tags.");
        assert_eq!(result.caret, 5);
    }

    #[test]
    fn test_no_panel_appends() {
        let result = splice("free text ", &FocusContext::none(), "AND", " ");
        assert_eq!(result.text, "free text AND ");
        assert_eq!(result.caret, 14);
    }

    #[test]
    fn test_out_of_range_start_is_clamped() {
        let ctx = FocusContext::new(Panel::Method, 7, "");
        let result = splice("status", &ctx, ":", " ");
        assert_eq!(result.text, "status: ");
        assert_eq!(result.caret, 8);

        let ctx = FocusContext::new(Panel::Value, 99, "xyz");
        let result = splice("a : b", &ctx, "c", " ");
        assert!(result.caret <= result.text.chars().count());
    }

    #[test]
    fn test_padded_splice_adds_missing_space() {
        let ctx = FocusContext::new(Panel::Method, 7, "");
        let result = splice_padded("status", &ctx, ":", " ");
        assert_eq!(result.text, "status : ");
        assert_eq!(result.caret, 9);

        let ctx = FocusContext::new(Panel::Condition, 18, "");
        let result = splice_padded("status : ABNORMAL", &ctx, "AND", " ");
        assert_eq!(result.text, "status : ABNORMAL AND ");
        assert_eq!(result.caret, 22);
    }

    #[test]
    fn test_padded_splice_leaves_in_range_contexts_alone() {
        let ctx = FocusContext::new(Panel::Method, 7, "");
        assert_eq!(
            splice_padded("status ", &ctx, ":", " "),
            splice("status ", &ctx, ":", " ")
        );
        assert_eq!(
            splice_padded("free", &FocusContext::none(), "x", " "),
            splice("free", &FocusContext::none(), "x", " ")
        );
    }

    #[test]
    fn test_replace_caret_past_end_appends_separator() {
        let ctx = FocusContext::value(9, "ABNORMAL", "status");
        let result = splice("status : ABNORMAL", &ctx, "CLOSED", " ");
        assert_eq!(result.text, "status : CLOSED ");
        assert_eq!(result.caret, 16);
    }

    #[test]
    fn test_multibyte_offsets() {
        let ctx = FocusContext::value(5, "磁盘", "名称");
        let result = splice("名称 : 磁盘", &ctx, "内存", " ");
        assert_eq!(result.text, "名称 : 内存 ");
        assert_eq!(result.caret, 8);
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize_separators("status :  : x"), "status : x");
        assert_eq!(normalize_separators("status : : : x"), "status : x");
        assert_eq!(normalize_separators("a : b : c"), "a : b : c");
        assert_eq!(normalize_separators("a:b"), "a:b");
        assert_eq!(normalize_separators(""), "");
    }

    #[test]
    fn test_successive_picks_never_double_separators() {
        let picks: &[(FocusContext, &str, &str)] = &[
            (FocusContext::new(Panel::Field, 0, ""), "status : ", " "),
            (FocusContext::new(Panel::Method, 7, ":"), ":", " "),
            (FocusContext::new(Panel::Method, 7, ""), ": ", " "),
            (FocusContext::value(9, "", "status"), "ABNORMAL", " "),
            (FocusContext::new(Panel::Condition, 18, ""), "AND", " "),
            (FocusContext::new(Panel::Field, 22, ""), "severity : ", " "),
            (FocusContext::new(Panel::Field, 22, ""), "severity : ", " "),
        ];

        let mut text = String::new();
        for (ctx, chosen, separator) in picks {
            let result = splice(&text, ctx, chosen, separator);
            assert!(!has_double_separator(&result.text), "{:?}", result.text);
            assert!(result.caret <= result.text.chars().count());
            text = result.text;
        }
    }
}
