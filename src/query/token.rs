use serde::Serialize;

/// Role of a segment within a `field : method value AND ...` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenKind {
    Condition,
    Field,
    Method,
    Value,
    /// Prefix of a dotted field (`tags` in `tags.env`).
    FieldKey,
    /// Suffix of a dotted field (`env` in `tags.env`).
    FieldValue,
}

impl TokenKind {
    /// The kind expected to follow this one: field, method, value, condition,
    /// then back to field.
    pub fn next(self) -> TokenKind {
        match self {
            TokenKind::Field | TokenKind::FieldKey => TokenKind::Method,
            TokenKind::Method => TokenKind::Value,
            TokenKind::Value | TokenKind::FieldValue => TokenKind::Condition,
            TokenKind::Condition => TokenKind::Field,
        }
    }
}

/// A typed, offset-bounded segment of the query input.
///
/// Offsets count chars, not bytes, and describe the half-open range
/// `start_offset..end_offset` of `text` within the source string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterText {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    #[serde(rename = "dataType")]
    pub kind: TokenKind,
    pub separator: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_key: Option<Box<FilterText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_value: Option<Box<FilterText>>,
}

impl FilterText {
    pub fn new(text: &str, start_offset: usize, kind: TokenKind) -> Self {
        Self::with_separator(text, start_offset, kind, " ")
    }

    fn with_separator(
        text: &str,
        start_offset: usize,
        kind: TokenKind,
        separator: &'static str,
    ) -> Self {
        let mut token = FilterText {
            text: text.to_string(),
            start_offset,
            end_offset: start_offset + text.chars().count(),
            kind,
            separator,
            sub_key: None,
            sub_value: None,
        };

        // `tags.env` addresses sub-key `env` of field `tags`.
        if kind == TokenKind::Field && text.matches('.').count() == 1 {
            if let Some((key, value)) = text.split_once('.') {
                let value_start = start_offset + key.chars().count() + 1;
                token.sub_key = Some(Box::new(FilterText::with_separator(
                    key,
                    start_offset,
                    TokenKind::FieldKey,
                    ".",
                )));
                token.sub_value = Some(Box::new(FilterText::new(
                    value,
                    value_start,
                    TokenKind::FieldValue,
                )));
            }
        }

        token
    }

    /// The literal followed by its separator.
    pub fn join_text(&self) -> String {
        format!("{}{}", self.text, self.separator)
    }

    /// Whether `offset` falls within the value half of a dotted field.
    pub fn sub_value_contains(&self, offset: usize) -> bool {
        self.sub_value
            .as_ref()
            .is_some_and(|v| offset >= v.start_offset && offset <= v.end_offset)
    }

    /// Grow a value token so that it ends with `word`, keeping the source
    /// slice (including the whitespace between words) as its text.
    fn extend_to(&mut self, source_slice: &str, end_offset: usize) {
        self.text = source_slice.to_string();
        self.end_offset = end_offset;
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Keywords that separate clauses. Matched case-insensitively.
const CONDITION_KEYWORDS: &[&str] = &["and", "or"];

fn is_condition_keyword(word: &str) -> bool {
    CONDITION_KEYWORDS
        .iter()
        .any(|keyword| word.eq_ignore_ascii_case(keyword))
}

/// A maximal run of non-whitespace characters.
struct Word<'a> {
    text: &'a str,
    byte_start: usize,
    byte_end: usize,
    start: usize,
    end: usize,
}

fn words(input: &str) -> Vec<Word<'_>> {
    let mut out = Vec::new();
    let mut open: Option<(usize, usize)> = None;
    let mut chars = 0;

    for (byte, ch) in input.char_indices() {
        if ch.is_whitespace() {
            if let Some((byte_start, start)) = open.take() {
                out.push(Word {
                    text: &input[byte_start..byte],
                    byte_start,
                    byte_end: byte,
                    start,
                    end: chars,
                });
            }
        } else if open.is_none() {
            open = Some((byte, chars));
        }
        chars += 1;
    }

    if let Some((byte_start, start)) = open {
        out.push(Word {
            text: &input[byte_start..],
            byte_start,
            byte_end: input.len(),
            start,
            end: chars,
        });
    }

    out
}

/// Split a raw query into ordered, typed segments.
///
/// `and`/`or` words (not in first position) become condition tokens and
/// start a new clause. Inside a clause the first word is the field, the
/// second the method, and everything after it is one merged value.
pub fn tokenize(input: &str) -> Vec<FilterText> {
    let mut tokens: Vec<FilterText> = Vec::new();
    let mut clause_position = 0usize;
    let mut value_byte_start = 0usize;

    for (index, word) in words(input).into_iter().enumerate() {
        if index > 0 && is_condition_keyword(word.text) {
            tokens.push(FilterText::new(word.text, word.start, TokenKind::Condition));
            clause_position = 0;
            continue;
        }

        let kind = match clause_position {
            0 => TokenKind::Field,
            1 => TokenKind::Method,
            _ => TokenKind::Value,
        };
        clause_position += 1;

        if kind == TokenKind::Value {
            if let Some(last) = tokens
                .last_mut()
                .filter(|t| t.kind == TokenKind::Value)
            {
                last.extend_to(&input[value_byte_start..word.byte_end], word.end);
                continue;
            }
            value_byte_start = word.byte_start;
        }

        tokens.push(FilterText::new(word.text, word.start, kind));
    }

    tokens
}

/// Re-join tokens with their recorded separators.
pub fn join(tokens: &[FilterText]) -> String {
    let mut out: String = tokens.iter().map(FilterText::join_text).collect();
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[FilterText]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn texts(tokens: &[FilterText]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_single_field() {
        let tokens = tokenize("status");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "status");
        assert_eq!(tokens[0].kind, TokenKind::Field);
        assert_eq!(tokens[0].start_offset, 0);
        assert_eq!(tokens[0].end_offset, 6);
    }

    #[test]
    fn test_full_clause_offsets() {
        let tokens = tokenize("status : ABNORMAL");
        assert_eq!(texts(&tokens), vec!["status", ":", "ABNORMAL"]);
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Field, TokenKind::Method, TokenKind::Value]
        );
        assert_eq!((tokens[1].start_offset, tokens[1].end_offset), (7, 8));
        assert_eq!((tokens[2].start_offset, tokens[2].end_offset), (9, 17));
    }

    #[test]
    fn test_two_clauses() {
        let tokens = tokenize("status : ABNORMAL AND severity : 1");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Field,
                TokenKind::Method,
                TokenKind::Value,
                TokenKind::Condition,
                TokenKind::Field,
                TokenKind::Method,
                TokenKind::Value,
            ]
        );
        assert_eq!(tokens[3].text, "AND");
        assert_eq!(tokens[3].start_offset, 18);
        assert_eq!(tokens[4].start_offset, 22);
    }

    #[test]
    fn test_condition_is_case_insensitive() {
        let tokens = tokenize("a : 1 or b : 2 And c : 3");
        assert_eq!(tokens[3].kind, TokenKind::Condition);
        assert_eq!(tokens[3].text, "or");
        assert_eq!(tokens[7].kind, TokenKind::Condition);
        assert_eq!(tokens[7].text, "And");
    }

    #[test]
    fn test_condition_must_be_a_whole_word() {
        let tokens = tokenize("alert_name : android");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].text, "android");
        assert_eq!(tokens[2].kind, TokenKind::Value);
    }

    #[test]
    fn test_leading_keyword_is_a_field() {
        let tokens = tokenize("and : x");
        assert_eq!(tokens[0].kind, TokenKind::Field);
    }

    #[test]
    fn test_trailing_condition_still_yields_token() {
        let tokens = tokenize("status : ABNORMAL AND");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[3].kind, TokenKind::Condition);
        assert_eq!(tokens[3].end_offset, 21);
    }

    #[test]
    fn test_multi_word_value_is_merged() {
        let tokens = tokenize("description : disk usage high AND x : y");
        assert_eq!(tokens[2].kind, TokenKind::Value);
        assert_eq!(tokens[2].text, "disk usage high");
        assert_eq!(tokens[2].start_offset, 14);
        assert_eq!(tokens[2].end_offset, 29);
        assert_eq!(tokens[3].kind, TokenKind::Condition);
    }

    #[test]
    fn test_merged_value_keeps_inner_whitespace() {
        let tokens = tokenize("a : b   c");
        assert_eq!(tokens[2].text, "b   c");
        assert_eq!(
            tokens[2].end_offset,
            tokens[2].start_offset + tokens[2].text.len()
        );
    }

    #[test]
    fn test_dotted_field_split() {
        let tokens = tokenize("tags.env : prod");
        let field = &tokens[0];
        assert_eq!(field.kind, TokenKind::Field);
        let key = field.sub_key.as_ref().unwrap();
        let value = field.sub_value.as_ref().unwrap();
        assert_eq!(key.text, "tags");
        assert_eq!((key.start_offset, key.end_offset), (0, 4));
        assert_eq!(key.kind, TokenKind::FieldKey);
        assert_eq!(key.separator, ".");
        assert_eq!(value.text, "env");
        assert_eq!((value.start_offset, value.end_offset), (5, 8));
        assert_eq!(value.kind, TokenKind::FieldValue);
    }

    #[test]
    fn test_dotted_field_with_empty_suffix() {
        let tokens = tokenize("tags.");
        let value = tokens[0].sub_value.as_ref().unwrap();
        assert_eq!(value.text, "");
        assert_eq!((value.start_offset, value.end_offset), (5, 5));
        assert!(tokens[0].sub_value_contains(5));
    }

    #[test]
    fn test_two_dots_are_not_split() {
        let tokens = tokenize("a.b.c : x");
        assert!(tokens[0].sub_key.is_none());
        assert!(tokens[0].sub_value.is_none());
    }

    #[test]
    fn test_dots_only_split_fields() {
        let tokens = tokenize("ip : 10.0");
        assert!(tokens[2].sub_key.is_none());
    }

    #[test]
    fn test_offsets_count_chars() {
        let tokens = tokenize("名称 : 磁盘");
        assert_eq!((tokens[0].start_offset, tokens[0].end_offset), (0, 2));
        assert_eq!((tokens[1].start_offset, tokens[1].end_offset), (3, 4));
        assert_eq!((tokens[2].start_offset, tokens[2].end_offset), (5, 7));
    }

    #[test]
    fn test_leading_and_trailing_whitespace_ignored() {
        let tokens = tokenize("  status : x  ");
        assert_eq!(tokens[0].start_offset, 2);
        assert_eq!(tokens.last().unwrap().end_offset, 12);
    }

    #[test]
    fn test_tokens_are_ordered_and_disjoint() {
        let tokens = tokenize("a : b c AND d : e OR f");
        for pair in tokens.windows(2) {
            assert!(pair[0].end_offset < pair[1].start_offset);
        }
    }

    #[test]
    fn test_join_round_trips_normalized_input() {
        for input in [
            "status : ABNORMAL",
            "status : ABNORMAL AND severity : 1",
            "description : disk usage high OR tags.env : prod",
            "status : ABNORMAL AND",
            "tags.",
        ] {
            assert_eq!(join(&tokenize(input)), input);
        }
    }

    #[test]
    fn test_next_kind_cycles() {
        assert_eq!(TokenKind::Field.next(), TokenKind::Method);
        assert_eq!(TokenKind::Method.next(), TokenKind::Value);
        assert_eq!(TokenKind::Value.next(), TokenKind::Condition);
        assert_eq!(TokenKind::Condition.next(), TokenKind::Field);
    }
}
