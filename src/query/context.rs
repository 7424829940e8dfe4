use serde::{Deserialize, Serialize};

use super::token::{FilterText, TokenKind};
use crate::catalog::Vocabulary;

/// Which suggestion panel applies at the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Field,
    Method,
    Value,
    Condition,
    /// Free text; nothing to suggest.
    None,
}

impl From<TokenKind> for Panel {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Field | TokenKind::FieldKey => Panel::Field,
            TokenKind::Method => Panel::Method,
            TokenKind::Value | TokenKind::FieldValue => Panel::Value,
            TokenKind::Condition => Panel::Condition,
        }
    }
}

/// The resolved suggestion state for one caret position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusContext {
    pub show: Panel,
    /// Char offset at which a chosen suggestion is spliced in.
    pub replace_start: usize,
    /// Literal under the caret; replaced in place when non-empty.
    #[serde(default)]
    pub next_text: String,
    /// Field whose values are suggested. Set for value panels only; empty
    /// when no field could be found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
}

impl FocusContext {
    pub fn new(show: Panel, replace_start: usize, next_text: impl Into<String>) -> Self {
        Self {
            show,
            replace_start,
            next_text: next_text.into(),
            field_id: None,
        }
    }

    pub fn value(
        replace_start: usize,
        next_text: impl Into<String>,
        field_id: impl Into<String>,
    ) -> Self {
        Self {
            show: Panel::Value,
            replace_start,
            next_text: next_text.into(),
            field_id: Some(field_id.into()),
        }
    }

    pub fn none() -> Self {
        Self::new(Panel::None, 0, "")
    }

    /// Whether a suggestion with this id or name is the one under the caret.
    pub fn highlights(&self, id: &str, name: &str) -> bool {
        !self.next_text.is_empty() && (self.next_text == id || self.next_text == name)
    }
}

/// Decide which suggestion panel applies at `caret` (a char offset into
/// `input`) and what a chosen suggestion would replace.
///
/// Never fails: carets past the end behave like carets at the end, and
/// positions before the first token attach to it.
pub fn resolve(
    tokens: &[FilterText],
    input: &str,
    caret: usize,
    vocabulary: &Vocabulary<'_>,
) -> FocusContext {
    let caret = caret.min(input.chars().count());

    let Some(last) = tokens.last() else {
        return FocusContext::new(Panel::Field, 0, "");
    };

    // Past the last token: suggest whatever comes next. A value, or the value
    // half of a dotted field, that ends right at the caret is still being
    // typed and keeps its own suggestions.
    let still_typing = caret == last.end_offset && last.kind == TokenKind::Value;
    if caret >= last.end_offset && !still_typing && !last.sub_value_contains(caret) {
        return resolve_next(tokens, vocabulary);
    }

    let index = tokens
        .iter()
        .rposition(|t| t.start_offset < caret)
        .unwrap_or(0);
    resolve_within(tokens, index, caret, vocabulary)
}

/// Context for the token following the last one.
fn resolve_next(tokens: &[FilterText], vocabulary: &Vocabulary<'_>) -> FocusContext {
    let Some(last) = tokens.last() else {
        return FocusContext::new(Panel::Field, 0, "");
    };
    let replace_start = last.end_offset + 1;

    match Panel::from(last.kind.next()) {
        Panel::Value => {
            let field_id = field_id_before(tokens, tokens.len() - 1, vocabulary);
            FocusContext::value(replace_start, "", field_id)
        }
        show => FocusContext::new(show, replace_start, ""),
    }
}

/// Context for the caret sitting on `tokens[index]`.
fn resolve_within(
    tokens: &[FilterText],
    index: usize,
    caret: usize,
    vocabulary: &Vocabulary<'_>,
) -> FocusContext {
    let Some(token) = tokens.get(index) else {
        return FocusContext::none();
    };

    match token.kind {
        TokenKind::Condition | TokenKind::Method => {
            FocusContext::new(token.kind.into(), token.start_offset, token.text.as_str())
        }
        TokenKind::Value => {
            let field_id = field_id_before(tokens, index, vocabulary);
            FocusContext::value(token.start_offset, token.text.as_str(), field_id)
        }
        TokenKind::Field => {
            if vocabulary.field_id(&token.text).is_some() {
                return FocusContext::new(Panel::Field, token.start_offset, token.text.as_str());
            }
            match (&token.sub_key, &token.sub_value) {
                (Some(key), Some(value)) if caret >= value.start_offset => {
                    FocusContext::value(value.start_offset, value.text.as_str(), key.text.as_str())
                }
                (Some(_), Some(_)) => {
                    FocusContext::new(Panel::Field, token.start_offset, token.text.as_str())
                }
                _ => FocusContext::none(),
            }
        }
        TokenKind::FieldKey | TokenKind::FieldValue => FocusContext::none(),
    }
}

/// Id of the nearest field at or before `index`: the vocabulary id when the
/// literal is a known field, the literal itself for dotted fields, otherwise
/// empty.
fn field_id_before(tokens: &[FilterText], index: usize, vocabulary: &Vocabulary<'_>) -> String {
    tokens
        .iter()
        .take(index + 1)
        .rev()
        .find(|t| t.kind == TokenKind::Field)
        .map(|field| match vocabulary.field_id(&field.text) {
            Some(id) => id.to_string(),
            None if field.sub_key.is_some() => field.text.clone(),
            None => String::new(),
        })
        .unwrap_or_default()
}
