//! Textual rewrites applied before parsing
//!
//! A file-scoped namespace changes the shape of everything after it, so it
//! is turned into a block namespace on the raw text instead of in the tree:
//! the terminating `;` becomes a line break and `{`, and a closing `}` is
//! appended at the end of the file.

use std::borrow::Cow;

use tracing::debug;

use crate::cst::{CsSyntaxKind, lex_with_trivia};

/// `namespace N;` to `namespace N { ... }`; other text is returned as is
pub fn block_namespace(text: &str) -> Cow<'_, str> {
    let Some(semicolon) = file_scoped_terminator(text) else {
        return Cow::Borrowed(text);
    };
    let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };
    debug!(offset = semicolon, "Converting file-scoped namespace");

    let mut converted = String::with_capacity(text.len() + 2 * eol.len() + 2);
    converted.push_str(&text[..semicolon]);
    converted.push_str(eol);
    converted.push('{');
    converted.push_str(&text[semicolon + 1..]);
    if converted.ends_with('\n') {
        converted.push('}');
        converted.push_str(eol);
    } else {
        converted.push_str(eol);
        converted.push('}');
    }
    Cow::Owned(converted)
}

/// Byte offset of the `;` ending a file-scoped namespace declaration
fn file_scoped_terminator(text: &str) -> Option<usize> {
    let (tokens, _) = lex_with_trivia(text);
    let mut significant = tokens.iter().filter(|token| !token.kind.is_trivia());
    let mut depth = 0usize;

    while let Some(token) = significant.next() {
        match token.kind {
            CsSyntaxKind::LBrace => depth += 1,
            CsSyntaxKind::RBrace => depth = depth.saturating_sub(1),
            CsSyntaxKind::NamespaceKw if depth == 0 => {
                let end = significant.find(|token| {
                    !matches!(
                        token.kind,
                        CsSyntaxKind::Ident | CsSyntaxKind::Dot | CsSyntaxKind::ColonColon
                    )
                })?;
                return match end.kind {
                    CsSyntaxKind::Semicolon => Some(end.span.start),
                    // Block namespace; a file has one form or the other
                    _ => None,
                };
            }
            _ => {}
        }
    }
    None
}
