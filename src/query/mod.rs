//! The filter-query editing engine: tokenizer, caret context resolver,
//! splice engine and the small text rewrites around them.

pub mod context;
pub mod rewrite;
pub mod splice;
pub mod token;

pub use context::{resolve, FocusContext, Panel};
pub use splice::{normalize_separators, splice, splice_padded, Splice};
pub use token::{tokenize, FilterText, TokenKind};
