//! Comments that record what a lowering removed
//!
//! Every elided construct leaves a block comment holding its original text
//! without outer trivia. The comment is always well-formed: a `*/` inside
//! the rendered text is escaped, and [`recover`] reverses the escaping so
//! the original text can be re-parsed.

use rowan::GreenToken;

use crate::cst::tree::text_without_trivia;
use crate::cst::trivia::{block_comment, unescape_comment_text};
use crate::cst::{SyntaxNode, SyntaxToken};

/// Prepended to expressions too risky to rewrite mechanically
pub const NULLABLE_WARNING: &str = "DOWNLEVEL WARNING: complex nullable expression";

/// Prepended to pattern tests whose operand is too risky to duplicate
pub const PATTERN_WARNING: &str = "DOWNLEVEL WARNING: complex pattern operand";

/// Marker left in place of a removed `global` modifier
pub const GLOBAL_MARKER: &str = "global";

/// `/* <prefix><node text> */`
pub fn elided(prefix: &str, node: &SyntaxNode) -> GreenToken {
    block_comment(&format!("{prefix}{}", text_without_trivia(node)))
}

/// `/* <marker> */`
pub fn marker(text: &str) -> GreenToken {
    block_comment(text)
}

/// The text a synthesized comment wraps, or `None` for other comments
pub fn recover(comment: &str) -> Option<String> {
    let inner = comment.strip_prefix("/* ")?.strip_suffix(" */")?;
    Some(unescape_comment_text(inner))
}

/// `node` already carries the `/* text */` marker in its trivia or in the
/// trivia right before it
///
/// A marker prepended to a node re-parses as trailing trivia of the
/// previous token, so both places count.
pub fn has_marker(node: &SyntaxNode, text: &str) -> bool {
    let inside = node
        .descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .any(|token| is_marker(&token, text));
    if inside {
        return true;
    }
    let mut cursor = node.first_token().and_then(|token| token.prev_token());
    while let Some(token) = cursor {
        if !token.kind().is_trivia() {
            break;
        }
        if is_marker(&token, text) {
            return true;
        }
        cursor = token.prev_token();
    }
    false
}

fn is_marker(token: &SyntaxToken, text: &str) -> bool {
    token.kind().is_comment() && recover(token.text()).is_some_and(|inner| inner == text)
}
